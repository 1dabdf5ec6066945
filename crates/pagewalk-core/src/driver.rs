//! The automation boundary consumed by the core.
//!
//! Any engine that can find elements, click them, read attributes and
//! evaluate a script can drive a session. The core never touches a browser
//! directly; it is handed a `&D: PageDriver` for every operation, so
//! independent sessions can run against independent pages and tests can run
//! against an in-memory page.

use crate::error::DriverError;
use crate::locator::Locator;
use async_trait::async_trait;
use serde_json::Value;

/// Script returning the document height in CSS pixels.
pub const PAGE_HEIGHT_SCRIPT: &str =
    "Math.max(document.body.scrollHeight, document.documentElement.scrollHeight)";

/// Script scrolling the viewport to the bottom of the document.
pub const SCROLL_TO_BOTTOM_SCRIPT: &str = "window.scrollTo(0, document.body.scrollHeight)";

/// A handle to one element of the page.
#[async_trait]
pub trait ElementHandle: Send + Sync {
    /// Dispatches a click on the element.
    async fn click(&self) -> Result<(), DriverError>;

    /// Reads an attribute; `None` when the attribute is absent.
    async fn attribute(&self, name: &str) -> Result<Option<String>, DriverError>;

    /// Rendered text content of the element.
    async fn text(&self) -> Result<Option<String>, DriverError>;

    /// Whether the element is rendered.
    ///
    /// The default only sees the `hidden` attribute and inline styles.
    /// Drivers that can read computed style should override it, otherwise an
    /// element hidden by a class or stylesheet rule reads as visible.
    async fn is_displayed(&self) -> Result<bool, DriverError> {
        displayed_by_attributes(self).await
    }
}

/// A page (tab) that a navigation session drives.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Element handle type produced by this driver.
    type Element: ElementHandle;

    /// First element matching `locator`, or `None`.
    async fn find_element(&self, locator: &Locator) -> Result<Option<Self::Element>, DriverError>;

    /// All elements matching `locator` in document order (possibly empty).
    async fn find_elements(&self, locator: &Locator) -> Result<Vec<Self::Element>, DriverError>;

    /// Evaluates a script in the page and returns its JSON value
    /// (`Value::Null` for `undefined`).
    async fn evaluate(&self, script: &str) -> Result<Value, DriverError>;
}

/// Returns true unless the element is hidden by the `hidden` attribute or an
/// inline `display: none` / `visibility: hidden` style.
pub async fn displayed_by_attributes<E: ElementHandle + ?Sized>(
    element: &E,
) -> Result<bool, DriverError> {
    if element.attribute("hidden").await?.is_some() {
        return Ok(false);
    }

    let Some(style) = element.attribute("style").await? else {
        return Ok(true);
    };
    let style: String = style
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();

    Ok(!(style.contains("display:none") || style.contains("visibility:hidden")))
}

/// Returns true if a matching element exists and is displayed.
pub async fn is_visible<D: PageDriver + ?Sized>(
    driver: &D,
    locator: &Locator,
) -> Result<bool, DriverError> {
    match driver.find_element(locator).await? {
        Some(element) => element.is_displayed().await,
        None => Ok(false),
    }
}

/// Number of elements currently matching `locator`.
pub async fn count_elements<D: PageDriver + ?Sized>(
    driver: &D,
    locator: &Locator,
) -> Result<usize, DriverError> {
    Ok(driver.find_elements(locator).await?.len())
}

/// Samples the document height.
pub async fn page_height<D: PageDriver + ?Sized>(driver: &D) -> Result<f64, DriverError> {
    let value = driver.evaluate(PAGE_HEIGHT_SCRIPT).await?;
    value
        .as_f64()
        .ok_or_else(|| DriverError::new(format!("page height is not a number: {value}")))
}
