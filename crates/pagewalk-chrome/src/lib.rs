//! # pagewalk-chrome
//!
//! Headless Chrome driver for pagewalk navigation sessions, built on
//! chromiumoxide.
//!
//! ## Architecture
//!
//! - **ChromeBrowser**: manages the browser process lifecycle
//! - **ChromePage**: a tab implementing [`pagewalk_core::PageDriver`]
//! - **ChromeElement**: an element handle implementing
//!   [`pagewalk_core::ElementHandle`]
//! - **FieldSink**: extracts named CSS fields from each item into JSON
//!
//! ## Example Usage
//!
//! ```ignore
//! use pagewalk_chrome::{ChromeBrowser, ChromeBrowserConfig, FieldSink};
//! use pagewalk_core::{Locator, LocatorSpec, NavigationConfig, NavigationController};
//!
//! let browser = ChromeBrowser::launch(ChromeBrowserConfig::default()).await?;
//! let page = browser.new_page().await?;
//! page.navigate("https://example.com/hockey").await?;
//!
//! let config = NavigationConfig::new(LocatorSpec::Click {
//!     items: Locator::css("tr.team"),
//!     controls: vec![],
//!     next: Some(Locator::css("a[aria-label='Next']")),
//!     loader: None,
//! });
//! let mut sink = FieldSink::new([("name", "td.name"), ("year", "td.year")]);
//! let report = NavigationController::from_config(&page, &config)?
//!     .run(&mut sink)
//!     .await;
//!
//! browser.close().await?;
//! ```
//!
//! ## Testing Strategy
//!
//! Unit tests cover logic that needs no browser. Tests that drive a real
//! Chrome are `#[ignore]`d; run them with `cargo test -- --ignored`.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod browser;
pub mod error;
pub mod page;
pub mod sink;

// Re-export main types for convenience
pub use browser::{ChromeBrowser, ChromeBrowserConfig};
pub use error::{ChromeError, Result};
pub use page::{ChromeElement, ChromePage};
pub use sink::{FieldSelector, FieldSink};
