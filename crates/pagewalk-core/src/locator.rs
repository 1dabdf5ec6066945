//! Element locators.
//!
//! Configuration accepts either a bare string (treated as a CSS selector) or
//! an explicit `{ css = "..." }` / `{ xpath = "..." }` table.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a page element is located.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "LocatorRepr")]
pub enum Locator {
    /// CSS selector, e.g. `tr.film`
    Css(String),
    /// XPath expression, e.g. `//button[text()='Load more']`
    Xpath(String),
}

impl Locator {
    /// CSS selector locator.
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// XPath locator.
    pub fn xpath(expression: impl Into<String>) -> Self {
        Self::Xpath(expression.into())
    }

    /// Locates an element by its `id` attribute.
    pub fn id(id: impl AsRef<str>) -> Self {
        Self::Css(format!("#{}", id.as_ref()))
    }

    /// The raw selector or expression.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Css(s) | Self::Xpath(s) => s,
        }
    }

    /// Returns true if the selector is empty or whitespace.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.as_str().trim().is_empty()
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(s) => write!(f, "css `{s}`"),
            Self::Xpath(s) => write!(f, "xpath `{s}`"),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LocatorRepr {
    Bare(String),
    Tagged(TaggedLocator),
}

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum TaggedLocator {
    Css(String),
    Xpath(String),
}

impl TryFrom<LocatorRepr> for Locator {
    type Error = String;

    fn try_from(repr: LocatorRepr) -> Result<Self, Self::Error> {
        let locator = match repr {
            LocatorRepr::Bare(s) | LocatorRepr::Tagged(TaggedLocator::Css(s)) => Locator::Css(s),
            LocatorRepr::Tagged(TaggedLocator::Xpath(s)) => Locator::Xpath(s),
        };
        if locator.is_blank() {
            return Err("locator must not be empty".to_string());
        }
        Ok(locator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, Serialize)]
    struct Holder {
        target: Locator,
    }

    #[test]
    fn bare_string_is_css() {
        let holder: Holder = toml::from_str(r#"target = "button.more""#).unwrap();
        assert_eq!(holder.target, Locator::css("button.more"));
    }

    #[test]
    fn tagged_forms() {
        let holder: Holder = toml::from_str(r#"target = { xpath = "//a[@id='2015']" }"#).unwrap();
        assert_eq!(holder.target, Locator::xpath("//a[@id='2015']"));

        let holder: Holder = toml::from_str(r##"target = { css = "#loading" }"##).unwrap();
        assert_eq!(holder.target, Locator::id("loading"));
    }

    #[test]
    fn serialized_form_reads_back() {
        let holder = Holder {
            target: Locator::xpath("//li"),
        };
        let text = toml::to_string(&holder).unwrap();
        let back: Holder = toml::from_str(&text).unwrap();
        assert_eq!(back.target, holder.target);
    }

    #[test]
    fn blank_locator_is_rejected() {
        let result: Result<Holder, _> = toml::from_str(r#"target = "  ""#);
        assert!(result.is_err());
    }
}
