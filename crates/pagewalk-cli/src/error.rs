//! Error handling for the CLI.
//!
//! `CliError` is what commands return; `main` turns it into a miette report.
//! Configuration problems carry a hint pointing at the fix.

use miette::Report;
use pagewalk_chrome::ChromeError;
use pagewalk_core::{NavigationError, SessionStatus, StopReason};
use std::path::PathBuf;
use thiserror::Error;

/// Top-level CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration-related errors (file not found, invalid values, etc.)
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The browser could not be launched or a page could not be opened
    #[error("Browser error: {0}")]
    Browser(#[from] ChromeError),

    /// A navigation session ended without completing
    #[error("Session for '{url}' ended with {status:?} ({reason})")]
    Session {
        /// The URL the session ran against
        url: String,
        /// Terminal status of the session
        status: SessionStatus,
        /// Why the session stopped
        reason: StopReason,
        /// The error that ended the session, if any
        #[source]
        source: Option<NavigationError>,
    },

    /// I/O errors while writing records
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file doesn't exist at the given location
    #[error("Config file not found: {}\n\nHint: Create a pagewalk.toml file or pass --config <path>", .0.display())]
    NotFound(PathBuf),

    /// Missing required configuration field
    #[error("Missing required field: {field}\n\nHint: {hint}")]
    MissingField {
        /// Name of the missing field
        field: String,
        /// Helpful hint for providing the field
        hint: String,
    },

    /// The layered configuration could not be deserialized
    #[error("Invalid configuration: {message}\n\nHint: {hint}")]
    Invalid {
        /// What figment reported
        message: String,
        /// Helpful hint for correct values
        hint: String,
    },

    /// The navigation options were rejected
    #[error("{0}\n\nHint: See the [navigation] section of pagewalk.toml")]
    Navigation(#[from] pagewalk_core::ConfigError),
}

/// A specialized Result type for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// Convert a CLI error into a miette report.
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Config(e) => miette::miette!("Configuration error: {}", e),
        CliError::Browser(ChromeError::LaunchFailed { reason, .. }) => miette::miette!(
            "Failed to launch Chrome: {}\n\nHint: Install Chrome or Chromium, or set chrome_path in pagewalk.toml",
            reason
        ),
        CliError::Session {
            url,
            status,
            reason,
            source: Some(source),
        } => miette::miette!(
            "Session for {} ended with {:?} ({}): {}",
            url,
            status,
            reason,
            source
        ),
        _ => miette::miette!("{}", err),
    }
}
