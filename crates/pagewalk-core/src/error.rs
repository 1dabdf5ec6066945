//! Error types for navigation sessions.
//!
//! The taxonomy separates failures of the automation transport
//! ([`DriverError`]), failures of the record sink ([`ExtractionError`]) and
//! the navigation-level outcomes built on top of them ([`NavigationError`]).
//! "No more content" is never an error: strategies report it as
//! [`ActionOutcome::Exhausted`](crate::strategy::ActionOutcome::Exhausted).

use crate::locator::Locator;
use std::time::Duration;
use thiserror::Error;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Transport or automation failure reported by a [`PageDriver`](crate::PageDriver).
///
/// Fatal to the session that observed it.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct DriverError {
    message: String,
    #[source]
    source: Option<BoxedSource>,
}

impl DriverError {
    /// Creates a driver error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a driver error wrapping the underlying cause.
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Human-readable description of the failure.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Opaque failure raised by an [`ExtractionSink`](crate::ExtractionSink).
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ExtractionError {
    message: String,
    #[source]
    source: Option<BoxedSource>,
}

impl ExtractionError {
    /// Creates an extraction error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an extraction error wrapping the underlying cause.
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Human-readable description of the failure.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors that end a navigation session.
#[derive(Debug, Error)]
pub enum NavigationError {
    /// A control the strategy requires is missing from the page.
    ///
    /// Only raised by strategies for which a missing control is unexpected;
    /// "load more" style strategies treat absence as exhaustion instead.
    #[error("element not found: {locator}")]
    ElementNotFound {
        /// The locator that matched nothing
        locator: Locator,
    },

    /// The stabilization signal did not hold before the deadline.
    #[error("signal did not stabilize within {waited:?}")]
    Timeout {
        /// How long the detector waited
        waited: Duration,
    },

    /// The automation driver failed.
    #[error("driver communication failed: {0}")]
    DriverCommunication(#[from] DriverError),

    /// The extraction sink failed.
    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractionError),
}

/// A specialized Result type for navigation operations.
pub type Result<T> = std::result::Result<T, NavigationError>;

/// Errors raised while validating a [`NavigationConfig`](crate::NavigationConfig).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A numeric option is outside its accepted range.
    #[error("invalid value for '{field}': {reason}")]
    InvalidValue {
        /// Name of the offending option
        field: &'static str,
        /// Why the value was rejected
        reason: String,
    },

    /// A locator was configured with an empty selector.
    #[error("locator for '{0}' is empty")]
    EmptyLocator(&'static str),

    /// Click pagination needs either `controls` or `next`, not both.
    #[error("click pagination requires exactly one of 'controls' or 'next'")]
    AmbiguousControls,
}
