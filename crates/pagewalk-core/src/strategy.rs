//! Navigation idioms.
//!
//! Dynamic pagination, "load more" buttons and infinite scroll differ only in
//! the action that requests more content and in the signal that says the
//! content has arrived. They share one controller loop, so each idiom is a
//! variant of [`NavigationStrategy`] rather than a separate driver script.

use crate::driver::{ElementHandle, PageDriver, SCROLL_TO_BOTTOM_SCRIPT};
use crate::error::{NavigationError, Result};
use crate::locator::Locator;
use crate::signal::{Baseline, StabilizationSignal};
use serde::Serialize;
use tracing::debug;

/// The action a strategy dispatched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationAction {
    /// Clicked the control matched by the locator.
    Click(Locator),
    /// Scrolled the viewport to the bottom of the document.
    Scroll,
    /// Nothing dispatched.
    None,
}

/// Result of [`NavigationStrategy::trigger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The action was dispatched; the controller must now wait.
    Dispatched(NavigationAction),
    /// The source has no more content. Terminal, not an error.
    Exhausted,
}

/// How newly arrived content relates to what was already on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentMode {
    /// New items are appended; only items past the last extracted one are new.
    Append,
    /// Each action replaces the item list; every matched item is new.
    Replace,
}

/// Which controls a click-driven pagination strategy uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickControls {
    /// A single "next page" control clicked on every iteration.
    Next(Locator),
    /// One control per page (e.g. one link per year); iteration `i` clicks
    /// the `i`-th control.
    Each(Vec<Locator>),
}

/// Dynamic pagination: click a page or year control, wait for the loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickTriggeredWait {
    pub controls: ClickControls,
    pub items: Locator,
    /// Loader shown while a page is being fetched. Without one the strategy
    /// falls back to waiting for the item count to grow.
    pub loader: Option<Locator>,
}

/// Incremental loading behind a single "load more" control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncrementalLoadWait {
    pub control: Locator,
    pub items: Locator,
}

/// Infinite scroll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollDrivenWait {
    pub items: Locator,
}

/// A navigation idiom: the triggering action plus the signal to watch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationStrategy {
    ClickTriggeredWait(ClickTriggeredWait),
    IncrementalLoadWait(IncrementalLoadWait),
    ScrollDrivenWait(ScrollDrivenWait),
}

impl NavigationStrategy {
    /// Short name used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::ClickTriggeredWait(_) => "click",
            Self::IncrementalLoadWait(_) => "load_more",
            Self::ScrollDrivenWait(_) => "scroll",
        }
    }

    /// Locator of the records extracted after each action.
    #[must_use]
    pub fn items(&self) -> &Locator {
        match self {
            Self::ClickTriggeredWait(s) => &s.items,
            Self::IncrementalLoadWait(s) => &s.items,
            Self::ScrollDrivenWait(s) => &s.items,
        }
    }

    #[must_use]
    pub fn content_mode(&self) -> ContentMode {
        match self {
            Self::ClickTriggeredWait(_) => ContentMode::Replace,
            Self::IncrementalLoadWait(_) | Self::ScrollDrivenWait(_) => ContentMode::Append,
        }
    }

    /// Whether the controller samples the page height after each wait.
    #[must_use]
    pub fn tracks_page_height(&self) -> bool {
        matches!(self, Self::ScrollDrivenWait(_))
    }

    /// Whether a wait timeout means "this action produced nothing" rather
    /// than a failed session.
    ///
    /// Scrolling past the last item simply loads nothing, so for the scroll
    /// idiom an expired count threshold is a no-growth iteration.
    #[must_use]
    pub fn timeout_means_no_growth(&self) -> bool {
        matches!(self, Self::ScrollDrivenWait(_))
    }

    /// The signal to wait on after triggering, built from `baseline`.
    ///
    /// In replace mode the click clears the previous page, so any matched
    /// item belongs to the new one and the count is measured from zero.
    #[must_use]
    pub fn signal(&self, baseline: &Baseline) -> StabilizationSignal {
        match self {
            Self::ClickTriggeredWait(ClickTriggeredWait {
                loader: Some(loader),
                ..
            }) => StabilizationSignal::ElementVisibility {
                loader: loader.clone(),
            },
            _ => StabilizationSignal::ElementCountThreshold {
                items: self.items().clone(),
                baseline: match self.content_mode() {
                    ContentMode::Append => baseline.item_count,
                    ContentMode::Replace => 0,
                },
            },
        }
    }

    /// Performs the idiom's action for `iteration`.
    ///
    /// Must be called at most once per iteration.
    ///
    /// # Errors
    ///
    /// - `ElementNotFound` if a pagination control is missing;
    /// - `DriverCommunication` if the driver fails.
    pub async fn trigger<D: PageDriver + ?Sized>(
        &self,
        driver: &D,
        iteration: u32,
    ) -> Result<ActionOutcome> {
        match self {
            Self::ClickTriggeredWait(strategy) => {
                let control = match &strategy.controls {
                    ClickControls::Next(control) => control,
                    ClickControls::Each(controls) => {
                        let Some(control) = usize::try_from(iteration)
                            .ok()
                            .and_then(|i| controls.get(i))
                        else {
                            debug!(iteration, "every pagination control visited");
                            return Ok(ActionOutcome::Exhausted);
                        };
                        control
                    }
                };

                let element = driver.find_element(control).await?.ok_or_else(|| {
                    NavigationError::ElementNotFound {
                        locator: control.clone(),
                    }
                })?;
                element.click().await?;
                Ok(ActionOutcome::Dispatched(NavigationAction::Click(
                    control.clone(),
                )))
            }
            Self::IncrementalLoadWait(strategy) => {
                let Some(element) = driver.find_element(&strategy.control).await? else {
                    debug!(control = %strategy.control, "load-more control gone");
                    return Ok(ActionOutcome::Exhausted);
                };
                let disabled = element.attribute("disabled").await?.is_some();
                if disabled || !element.is_displayed().await? {
                    debug!(control = %strategy.control, "load-more control hidden or disabled");
                    return Ok(ActionOutcome::Exhausted);
                }
                element.click().await?;
                Ok(ActionOutcome::Dispatched(NavigationAction::Click(
                    strategy.control.clone(),
                )))
            }
            Self::ScrollDrivenWait(_) => {
                driver.evaluate(SCROLL_TO_BOTTOM_SCRIPT).await?;
                Ok(ActionOutcome::Dispatched(NavigationAction::Scroll))
            }
        }
    }
}

impl From<ClickTriggeredWait> for NavigationStrategy {
    fn from(strategy: ClickTriggeredWait) -> Self {
        Self::ClickTriggeredWait(strategy)
    }
}

impl From<IncrementalLoadWait> for NavigationStrategy {
    fn from(strategy: IncrementalLoadWait) -> Self {
        Self::IncrementalLoadWait(strategy)
    }
}

impl From<ScrollDrivenWait> for NavigationStrategy {
    fn from(strategy: ScrollDrivenWait) -> Self {
        Self::ScrollDrivenWait(strategy)
    }
}
