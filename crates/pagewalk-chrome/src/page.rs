//! Page-level browser operations.
//!
//! [`ChromePage`] is the [`PageDriver`] a navigation session runs against.
//! Lookups use `querySelectorAll` (or an XPath search), so a locator that
//! matches nothing yields an empty list rather than an error.

use crate::error::{ChromeError, Result};
use async_trait::async_trait;
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use pagewalk_core::{
    poll_until, CancellationToken, DriverError, ElementHandle, Locator, PageDriver, PollStatus,
    WaitConfig,
};
use serde_json::Value;
use tracing::{debug, trace};

/// A browser tab.
#[derive(Debug, Clone)]
pub struct ChromePage {
    inner: Page,
}

impl ChromePage {
    pub(crate) fn new(page: Page) -> Self {
        Self { inner: page }
    }

    /// Navigates to an absolute URL and waits for the document to load.
    ///
    /// # Errors
    ///
    /// Returns `NavigationFailed` if the page fails to load, `LoadTimeout` if
    /// `document.readyState` never reaches `complete`.
    pub async fn navigate(&self, url: &str) -> Result<()> {
        self.navigate_with(url, WaitConfig::default()).await
    }

    /// Like [`navigate`](Self::navigate) with a custom load wait.
    ///
    /// # Errors
    ///
    /// See [`navigate`](Self::navigate).
    pub async fn navigate_with(&self, url: &str, config: WaitConfig) -> Result<()> {
        debug!(url, "navigating");
        self.inner
            .goto(url)
            .await
            .map_err(|e| ChromeError::NavigationFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        self.wait_for_load(url, config).await
    }

    /// Waits until `document.readyState` is `complete`.
    ///
    /// Client-side scripts usually keep injecting content after this point;
    /// that part is the navigation session's job.
    ///
    /// # Errors
    ///
    /// Returns `LoadTimeout` if the deadline passes first, or the script error.
    pub async fn wait_for_load(&self, url: &str, config: WaitConfig) -> Result<()> {
        let polled = poll_until(
            || async {
                let result = self
                    .inner
                    .evaluate("document.readyState")
                    .await
                    .map_err(|e| ChromeError::ScriptExecutionFailed(e.to_string()))?;

                Ok::<_, ChromeError>(
                    result
                        .value()
                        .and_then(Value::as_str)
                        .is_some_and(|s| s == "complete"),
                )
            },
            |ready| *ready,
            config,
            &CancellationToken::new(),
        )
        .await?;

        match polled.status {
            PollStatus::Ready => {
                trace!(url, samples = polled.samples, "document ready");
                Ok(())
            }
            PollStatus::TimedOut | PollStatus::Cancelled => Err(ChromeError::LoadTimeout {
                url: url.to_string(),
                timeout: config.timeout,
            }),
        }
    }

    /// Returns the current page URL.
    ///
    /// # Errors
    ///
    /// Returns an error if script execution fails.
    pub async fn url(&self) -> Result<String> {
        let url = self.inner.url().await?;
        Ok(url.unwrap_or_default())
    }

    /// Closes the tab.
    ///
    /// # Errors
    ///
    /// Returns an error if closing the page fails.
    pub async fn close(self) -> Result<()> {
        self.inner.close().await?;
        Ok(())
    }
}

#[async_trait]
impl PageDriver for ChromePage {
    type Element = ChromeElement;

    async fn find_element(
        &self,
        locator: &Locator,
    ) -> std::result::Result<Option<ChromeElement>, DriverError> {
        Ok(self.find_elements(locator).await?.into_iter().next())
    }

    async fn find_elements(
        &self,
        locator: &Locator,
    ) -> std::result::Result<Vec<ChromeElement>, DriverError> {
        let found = match locator {
            Locator::Css(selector) => self.inner.find_elements(selector.as_str()).await,
            Locator::Xpath(expression) => self.inner.find_xpaths(expression.as_str()).await,
        }
        .map_err(|e| DriverError::with_source(format!("failed to query {locator}"), e))?;

        Ok(found.into_iter().map(ChromeElement::new).collect())
    }

    async fn evaluate(&self, script: &str) -> std::result::Result<Value, DriverError> {
        let result = self
            .inner
            .evaluate(script)
            .await
            .map_err(|e| ChromeError::ScriptExecutionFailed(e.to_string()))?;

        Ok(result.value().cloned().unwrap_or(Value::Null))
    }
}

/// Computed visibility, so elements hidden by classes or stylesheet rules
/// count as hidden.
const IS_DISPLAYED_FN: &str = r"function() {
    if (!this.isConnected) return false;
    if (typeof this.checkVisibility === 'function') {
        return this.checkVisibility({ checkVisibilityCSS: true });
    }
    const style = window.getComputedStyle(this);
    return style.display !== 'none' && style.visibility !== 'hidden';
}";

/// An element handle inside a [`ChromePage`].
#[derive(Debug)]
pub struct ChromeElement {
    inner: Element,
}

impl ChromeElement {
    fn new(element: Element) -> Self {
        Self { inner: element }
    }

    /// Descendants matching a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns a `DriverError` if the query fails.
    pub async fn find_children(
        &self,
        selector: &str,
    ) -> std::result::Result<Vec<ChromeElement>, DriverError> {
        let found = self
            .inner
            .find_elements(selector)
            .await
            .map_err(|e| DriverError::with_source(format!("failed to query `{selector}`"), e))?;
        Ok(found.into_iter().map(Self::new).collect())
    }

    /// The underlying chromiumoxide element.
    #[must_use]
    pub fn as_element(&self) -> &Element {
        &self.inner
    }
}

#[async_trait]
impl ElementHandle for ChromeElement {
    async fn click(&self) -> std::result::Result<(), DriverError> {
        self.inner
            .click()
            .await
            .map(|_| ())
            .map_err(|e| DriverError::with_source("click failed", e))
    }

    async fn attribute(&self, name: &str) -> std::result::Result<Option<String>, DriverError> {
        self.inner
            .attribute(name)
            .await
            .map_err(|e| DriverError::with_source(format!("failed to read attribute '{name}'"), e))
    }

    async fn text(&self) -> std::result::Result<Option<String>, DriverError> {
        self.inner
            .inner_text()
            .await
            .map_err(|e| DriverError::with_source("failed to read inner text", e))
    }

    async fn is_displayed(&self) -> std::result::Result<bool, DriverError> {
        let returns = self
            .inner
            .call_js_fn(IS_DISPLAYED_FN, false)
            .await
            .map_err(|e| DriverError::with_source("failed to read computed visibility", e))?;

        // A detached element yields no value; it is not on screen either.
        Ok(returns
            .result
            .value
            .as_ref()
            .and_then(Value::as_bool)
            .unwrap_or(false))
    }
}
