//! Stabilization signals and the values sampled from them.

use crate::locator::Locator;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// A measurable page property the detector polls after an action.
///
/// Every variant carries what it needs to be re-sampled on its own, including
/// the baseline captured before the action.
#[derive(Debug, Clone, PartialEq)]
pub enum StabilizationSignal {
    /// Holds once the loader element is no longer visible.
    ElementVisibility {
        /// Transient loading indicator
        loader: Locator,
    },
    /// Holds once more than `baseline` elements match `items`.
    ElementCountThreshold {
        /// Locator of the records on the page
        items: Locator,
        /// Count captured immediately before the action
        baseline: usize,
    },
    /// Holds once the document is taller than `baseline`.
    PageHeightMetric {
        /// Height captured before the action, if any
        baseline: Option<f64>,
    },
}

impl fmt::Display for StabilizationSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ElementVisibility { loader } => write!(f, "{loader} to disappear"),
            Self::ElementCountThreshold { items, baseline } => {
                write!(f, "more than {baseline} of {items}")
            }
            Self::PageHeightMetric { baseline: Some(h) } => write!(f, "page height above {h}"),
            Self::PageHeightMetric { baseline: None } => f.write_str("page height"),
        }
    }
}

/// One sample of a signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalValue {
    /// Loader state at the sample, and whether it was ever seen visible
    /// during this wait.
    Visibility {
        visible: bool,
        observed_visible: bool,
    },
    /// Number of matching elements.
    Count(usize),
    /// Document height in CSS pixels.
    Height(f64),
}

/// The last value seen by a wait, with how long it took to get there.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SignalSnapshot {
    pub value: SignalValue,
    pub samples: u32,
    pub elapsed: Duration,
}

/// Values captured before the triggering action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Baseline {
    /// Items matched before the action.
    pub item_count: usize,
}
