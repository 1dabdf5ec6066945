//! In-memory page used by the integration tests.
//!
//! Page scripts are modelled as changes scheduled on the tokio clock: a click
//! or a scroll schedules items to appear (and loaders to disappear) after a
//! delay. Tests run with a paused clock, so those delays are exact.

#![allow(dead_code)]

use async_trait::async_trait;
use pagewalk_core::driver::{displayed_by_attributes, PAGE_HEIGHT_SCRIPT, SCROLL_TO_BOTTOM_SCRIPT};
use pagewalk_core::{
    DriverError, ElementHandle, ExtractionError, ExtractionSink, Locator, PageDriver,
};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

pub const ITEMS: &str = "li.item";
pub const LOADER: &str = "#loading";

/// One record-bearing element on the fake page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub text: String,
    pub attributes: BTreeMap<String, String>,
}

impl Item {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }
}

/// `count` items labelled `{prefix}-{n}`.
pub fn batch(prefix: &str, count: usize) -> Vec<Item> {
    (0..count).map(|n| Item::text(format!("{prefix}-{n}"))).collect()
}

enum Control {
    LoadMore {
        batches: VecDeque<Vec<Item>>,
        delay: Duration,
    },
    PageLink {
        rows: Vec<Item>,
        loading: Duration,
    },
    Broken,
    /// Present but hidden by a `d-none` class.
    ClassHidden,
}

enum Change {
    Append(Vec<Item>),
    Replace(Vec<Item>),
    HideLoader,
}

struct Dom {
    items: Vec<Item>,
    controls: HashMap<String, Control>,
    loader_visible: bool,
    loader_hidden_by_class: bool,
    scheduled: Vec<(Instant, Change)>,
    scroll_batches: VecDeque<Vec<Item>>,
    scroll_delay: Duration,
    base_height: f64,
    row_height: f64,
    lazy_height_per_scroll: f64,
    lazy_height: f64,
    clicks: u32,
    scrolls: u32,
}

impl Dom {
    fn apply_due(&mut self) {
        let now = Instant::now();
        let (due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.scheduled)
            .into_iter()
            .partition(|(at, _)| *at <= now);
        self.scheduled = pending;
        for (_, change) in due {
            match change {
                Change::Append(items) => self.items.extend(items),
                Change::Replace(items) => self.items = items,
                Change::HideLoader => self.loader_visible = false,
            }
        }
    }

    fn height(&self) -> f64 {
        self.base_height + self.row_height * self.items.len() as f64 + self.lazy_height
    }
}

/// A scripted page.
#[derive(Clone)]
pub struct FakePage {
    dom: Arc<Mutex<Dom>>,
}

impl Default for FakePage {
    fn default() -> Self {
        Self::new()
    }
}

impl FakePage {
    pub fn new() -> Self {
        Self {
            dom: Arc::new(Mutex::new(Dom {
                items: Vec::new(),
                controls: HashMap::new(),
                loader_visible: false,
                loader_hidden_by_class: false,
                scheduled: Vec::new(),
                scroll_batches: VecDeque::new(),
                scroll_delay: Duration::ZERO,
                base_height: 800.0,
                row_height: 40.0,
                lazy_height_per_scroll: 0.0,
                lazy_height: 0.0,
                clicks: 0,
                scrolls: 0,
            })),
        }
    }

    fn dom(&self) -> MutexGuard<'_, Dom> {
        self.dom.lock().expect("fake page lock poisoned")
    }

    pub fn with_items(self, items: Vec<Item>) -> Self {
        self.dom().items = items;
        self
    }

    /// A "load more" control that appends one batch per click after `delay`
    /// and disappears once the last batch was requested.
    pub fn with_load_more(self, selector: &str, batches: Vec<Vec<Item>>, delay: Duration) -> Self {
        self.dom().controls.insert(
            selector.to_string(),
            Control::LoadMore {
                batches: batches.into(),
                delay,
            },
        );
        self
    }

    /// A pagination link: clicking it clears the table, shows the loader for
    /// `loading`, then shows `rows` and hides the loader.
    pub fn with_page_link(self, selector: &str, rows: Vec<Item>, loading: Duration) -> Self {
        self.dom()
            .controls
            .insert(selector.to_string(), Control::PageLink { rows, loading });
        self
    }

    /// A control whose click fails at the transport level.
    pub fn with_broken_control(self, selector: &str) -> Self {
        self.dom()
            .controls
            .insert(selector.to_string(), Control::Broken);
        self
    }

    /// A control hidden through a stylesheet class instead of inline style.
    pub fn with_class_hidden_control(self, selector: &str) -> Self {
        self.dom()
            .controls
            .insert(selector.to_string(), Control::ClassHidden);
        self
    }

    /// The loader is toggled with a `d-none` class rather than an inline
    /// style, so only computed visibility tells it apart.
    pub fn with_class_styled_loader(self) -> Self {
        self.dom().loader_hidden_by_class = true;
        self
    }

    /// Batches delivered by successive scrolls after `delay`. Once they run
    /// out, scrolling loads nothing.
    pub fn with_scroll_batches(self, batches: Vec<Vec<Item>>, delay: Duration) -> Self {
        {
            let mut dom = self.dom();
            dom.scroll_batches = batches.into();
            dom.scroll_delay = delay;
        }
        self
    }

    /// Every scroll grows the page by `pixels` without adding items, like
    /// images loading lazily.
    pub fn with_lazy_height(self, pixels: f64) -> Self {
        self.dom().lazy_height_per_scroll = pixels;
        self
    }

    pub fn show_loader(&self) {
        self.dom().loader_visible = true;
    }

    /// Schedules `items` to be appended at `at`.
    pub fn schedule_append(&self, at: Instant, items: Vec<Item>) {
        self.dom().scheduled.push((at, Change::Append(items)));
    }

    pub fn schedule_hide_loader(&self, at: Instant) {
        self.dom().scheduled.push((at, Change::HideLoader));
    }

    pub fn clicks(&self) -> u32 {
        self.dom().clicks
    }

    pub fn scrolls(&self) -> u32 {
        self.dom().scrolls
    }

    pub fn item_count(&self) -> usize {
        let mut dom = self.dom();
        dom.apply_due();
        dom.items.len()
    }

    fn element(&self, kind: ElementKind) -> FakeElement {
        FakeElement {
            dom: Arc::clone(&self.dom),
            kind,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ElementKind {
    Item(Item),
    Control(String),
    Loader,
}

pub struct FakeElement {
    dom: Arc<Mutex<Dom>>,
    pub kind: ElementKind,
}

#[async_trait]
impl ElementHandle for FakeElement {
    async fn click(&self) -> Result<(), DriverError> {
        let ElementKind::Control(key) = &self.kind else {
            return Ok(());
        };
        let mut guard = self.dom.lock().expect("fake page lock poisoned");
        let dom = &mut *guard;
        dom.apply_due();
        dom.clicks += 1;
        let now = Instant::now();

        let mut remove = false;
        let change = match dom.controls.get_mut(key) {
            Some(Control::LoadMore { batches, delay }) => {
                let batch = batches.pop_front().unwrap_or_default();
                remove = batches.is_empty();
                Some((now + *delay, Change::Append(batch)))
            }
            Some(Control::PageLink { rows, loading }) => {
                let rows = rows.clone();
                let at = now + *loading;
                dom.items.clear();
                dom.loader_visible = true;
                dom.scheduled.push((at, Change::HideLoader));
                Some((at, Change::Replace(rows)))
            }
            Some(Control::Broken) => {
                return Err(DriverError::new(format!("click on {key} intercepted")));
            }
            Some(Control::ClassHidden) => {
                return Err(DriverError::new(format!("{key} is not clickable")));
            }
            None => return Err(DriverError::new(format!("stale element {key}"))),
        };
        if let Some(change) = change {
            dom.scheduled.push(change);
        }
        if remove {
            dom.controls.remove(key);
        }
        Ok(())
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>, DriverError> {
        let value = match &self.kind {
            ElementKind::Item(item) => item.attributes.get(name).cloned(),
            ElementKind::Control(key) => {
                let dom = self.dom.lock().expect("fake page lock poisoned");
                let hidden = matches!(dom.controls.get(key), Some(Control::ClassHidden));
                (name == "class" && hidden).then(|| "btn d-none".to_string())
            }
            ElementKind::Loader => {
                let mut dom = self.dom.lock().expect("fake page lock poisoned");
                dom.apply_due();
                match name {
                    "class" if dom.loader_hidden_by_class => Some(if dom.loader_visible {
                        "spinner".to_string()
                    } else {
                        "spinner d-none".to_string()
                    }),
                    "style" if !dom.loader_hidden_by_class && !dom.loader_visible => {
                        Some("display: none;".to_string())
                    }
                    _ => None,
                }
            }
        };
        Ok(value)
    }

    /// Stands in for computed style: the `d-none` class hides an element.
    async fn is_displayed(&self) -> Result<bool, DriverError> {
        let class = self.attribute("class").await?.unwrap_or_default();
        if class.split_whitespace().any(|c| c == "d-none") {
            return Ok(false);
        }
        displayed_by_attributes(self).await
    }

    async fn text(&self) -> Result<Option<String>, DriverError> {
        Ok(match &self.kind {
            ElementKind::Item(item) => Some(item.text.clone()),
            _ => None,
        })
    }
}

#[async_trait]
impl PageDriver for FakePage {
    type Element = FakeElement;

    async fn find_element(&self, locator: &Locator) -> Result<Option<FakeElement>, DriverError> {
        Ok(self.find_elements(locator).await?.into_iter().next())
    }

    async fn find_elements(&self, locator: &Locator) -> Result<Vec<FakeElement>, DriverError> {
        let kinds: Vec<ElementKind> = {
            let mut dom = self.dom();
            dom.apply_due();
            match locator.as_str() {
                ITEMS => dom.items.iter().cloned().map(ElementKind::Item).collect(),
                LOADER => vec![ElementKind::Loader],
                key if dom.controls.contains_key(key) => vec![ElementKind::Control(key.to_string())],
                _ => Vec::new(),
            }
        };
        Ok(kinds.into_iter().map(|kind| self.element(kind)).collect())
    }

    async fn evaluate(&self, script: &str) -> Result<Value, DriverError> {
        let mut guard = self.dom();
        let dom = &mut *guard;
        dom.apply_due();
        match script {
            SCROLL_TO_BOTTOM_SCRIPT => {
                dom.scrolls += 1;
                dom.lazy_height += dom.lazy_height_per_scroll;
                if let Some(batch) = dom.scroll_batches.pop_front() {
                    let at = Instant::now() + dom.scroll_delay;
                    dom.scheduled.push((at, Change::Append(batch)));
                }
                Ok(Value::Null)
            }
            PAGE_HEIGHT_SCRIPT => Ok(json!(dom.height())),
            other => Err(DriverError::new(format!("unsupported script: {other}"))),
        }
    }
}

/// A driver whose transport is gone.
pub struct DeadPage;

#[async_trait]
impl PageDriver for DeadPage {
    type Element = FakeElement;

    async fn find_element(&self, _: &Locator) -> Result<Option<FakeElement>, DriverError> {
        Err(DriverError::new("websocket closed"))
    }

    async fn find_elements(&self, _: &Locator) -> Result<Vec<FakeElement>, DriverError> {
        Err(DriverError::new("websocket closed"))
    }

    async fn evaluate(&self, _: &str) -> Result<Value, DriverError> {
        Err(DriverError::new("websocket closed"))
    }
}

/// Reads the named attributes of each element into a record.
pub struct AttributeSink {
    pub fields: Vec<&'static str>,
}

#[async_trait]
impl ExtractionSink<FakeElement> for AttributeSink {
    type Record = BTreeMap<String, String>;

    async fn extract(
        &mut self,
        elements: &[FakeElement],
    ) -> Result<Vec<Self::Record>, ExtractionError> {
        let mut records = Vec::with_capacity(elements.len());
        for element in elements {
            let mut record = BTreeMap::new();
            for field in &self.fields {
                let value = element
                    .attribute(field)
                    .await
                    .map_err(|e| ExtractionError::with_source("attribute read failed", e))?
                    .ok_or_else(|| ExtractionError::new(format!("missing field {field}")))?;
                record.insert((*field).to_string(), value);
            }
            records.push(record);
        }
        Ok(records)
    }
}

/// A sink that fails on its first call.
pub struct FailingSink;

#[async_trait]
impl ExtractionSink<FakeElement> for FailingSink {
    type Record = String;

    async fn extract(&mut self, _: &[FakeElement]) -> Result<Vec<String>, ExtractionError> {
        Err(ExtractionError::new("schema mismatch"))
    }
}
