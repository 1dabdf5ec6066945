//! Error types for the Chrome driver.
//!
//! Browser lifecycle failures (launch, connection, page load) are
//! reported as [`ChromeError`] to whoever owns the browser. Failures that
//! happen while a navigation session is sampling or clicking are converted to
//! the core's opaque [`DriverError`] so the session can end with
//! `DriverCommunication`.

use pagewalk_core::DriverError;
use std::time::Duration;
use thiserror::Error;

/// The main error type for browser operations.
#[derive(Debug, Error)]
pub enum ChromeError {
    /// Failed to launch the browser process.
    ///
    /// This typically occurs when Chrome/Chromium is not installed,
    /// or when there are permission issues with the executable.
    #[error("failed to launch browser: {reason}")]
    LaunchFailed {
        /// Human-readable reason for the launch failure
        reason: String,
        /// Optional underlying error that caused the failure
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Failed to establish Chrome DevTools Protocol connection.
    #[error("CDP connection failed: {0}")]
    ConnectionFailed(String),

    /// Navigation to a URL failed.
    #[error("navigation to '{url}' failed: {reason}")]
    NavigationFailed {
        /// The URL that failed to load
        url: String,
        /// Reason for the navigation failure
        reason: String,
    },

    /// The document did not finish loading in time.
    #[error("'{url}' did not finish loading within {timeout:?}")]
    LoadTimeout {
        /// The URL being loaded
        url: String,
        /// How long we waited before giving up
        timeout: Duration,
    },

    /// JavaScript execution in the page context failed.
    #[error("JavaScript execution failed: {0}")]
    ScriptExecutionFailed(String),

    /// Wraps errors from the chromiumoxide library.
    #[error("chromiumoxide error: {0}")]
    ChromiumOxide(#[from] chromiumoxide::error::CdpError),
}

/// A specialized Result type for browser operations.
pub type Result<T> = std::result::Result<T, ChromeError>;

impl From<ChromeError> for DriverError {
    fn from(err: ChromeError) -> Self {
        DriverError::with_source(err.to_string(), err)
    }
}
