//! # pagewalk-core
//!
//! Orchestration core for scraping pages whose content is injected by client
//! side scripts: dynamic pagination, "load more" buttons and infinite scroll.
//!
//! The crate answers two questions for every navigation step: *when* has the
//! new content finished arriving, and *whether* to keep navigating. It does
//! not launch browsers or decide which fields to extract; both are supplied
//! by the caller through the [`PageDriver`] and [`ExtractionSink`] traits.
//!
//! ## Architecture
//!
//! - **StabilizationDetector**: polls a signal against a monotonic deadline
//! - **NavigationStrategy**: the idiom-specific action and the signal it
//!   declares
//! - **TerminationPolicy**: pure stop/continue decision over session state
//! - **NavigationController**: runs action, wait, extraction and decision in
//!   a loop and owns the [`NavigationState`]
//!
//! ## Example Usage
//!
//! ```ignore
//! use pagewalk_core::{Locator, LocatorSpec, NavigationConfig, NavigationController, TextSink};
//!
//! let config = NavigationConfig::new(LocatorSpec::LoadMore {
//!     items: Locator::css("div.card"),
//!     control: Locator::css("button#load-more"),
//! });
//! let report = NavigationController::from_config(&page, &config)?
//!     .run(&mut TextSink)
//!     .await;
//! println!("{} records, stopped: {}", report.records.len(), report.reason);
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod controller;
pub mod detector;
pub mod driver;
pub mod error;
pub mod locator;
pub mod policy;
pub mod signal;
pub mod sink;
pub mod state;
pub mod strategy;

// Re-export main types for convenience
pub use config::{LocatorSpec, NavigationConfig};
pub use controller::{NavigationController, SessionReport};
pub use detector::{
    poll_until, PollStatus, Polled, StabilizationDetector, WaitConfig, WaitOutcome,
    DEFAULT_POLL_INTERVAL, DEFAULT_TIMEOUT,
};
pub use driver::{ElementHandle, PageDriver};
pub use error::{ConfigError, DriverError, ExtractionError, NavigationError, Result};
pub use locator::Locator;
pub use policy::{Decision, StopReason, TerminationCondition, TerminationPolicy};
pub use signal::{Baseline, SignalSnapshot, SignalValue, StabilizationSignal};
pub use sink::{ExtractionSink, TextSink};
pub use state::{Exhaustion, NavigationState, SessionStatus};
pub use strategy::{
    ActionOutcome, ClickControls, ClickTriggeredWait, ContentMode, IncrementalLoadWait,
    NavigationAction, NavigationStrategy, ScrollDrivenWait,
};
pub use tokio_util::sync::CancellationToken;
