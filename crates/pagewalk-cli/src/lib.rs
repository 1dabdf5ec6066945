//! Pagewalk CLI.
//!
//! Loads a session description (URLs, navigation idiom, locators and
//! fields), drives headless Chrome through it and prints the extracted
//! records as JSON Lines.
//!
//! # Architecture
//!
//! - [`cli`] - clap argument definitions
//! - [`config`] - layered configuration (file, environment, flags)
//! - [`commands`] - `run` and `check`
//! - [`error`] - error types with actionable hints
//! - [`logger`] - tracing subscriber setup
//! - [`ui`] - status messages on stderr

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logger;
pub mod ui;

// Re-export commonly used types
pub use config::PagewalkConfig;
pub use error::{CliError, ConfigError, Result};
