//! Per-session navigation state.

use crate::signal::SignalValue;
use crate::strategy::NavigationAction;
use serde::Serialize;
use tracing::warn;

/// Lifecycle status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Running,
    /// Ended normally with content stable (e.g. the iteration cap).
    Stabilized,
    TimedOut,
    /// No further content to load.
    Exhausted,
    Failed,
    Cancelled,
}

impl SessionStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// Why a session's content was declared exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Exhaustion {
    /// The strategy reported that the source has nothing more.
    SourceSignaled,
    /// Neither the item count nor the page height changed.
    ContentStalled,
}

/// State owned by one [`NavigationController`](crate::NavigationController)
/// for the lifetime of a session.
///
/// Mutated once per iteration by the controller. `iteration_count` never
/// decreases and a terminal status, once set, never changes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavigationState {
    iteration_count: u32,
    cumulative_extracted_count: usize,
    last_signal_value: Option<SignalValue>,
    last_height_metric: Option<f64>,
    last_action: NavigationAction,
    consecutive_no_growth: u32,
    actions_dispatched: u32,
    waits_attempted: u32,
    exhaustion: Option<Exhaustion>,
    status: SessionStatus,
}

impl Default for NavigationState {
    fn default() -> Self {
        Self::new()
    }
}

impl NavigationState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            iteration_count: 0,
            cumulative_extracted_count: 0,
            last_signal_value: None,
            last_height_metric: None,
            last_action: NavigationAction::None,
            consecutive_no_growth: 0,
            actions_dispatched: 0,
            waits_attempted: 0,
            exhaustion: None,
            status: SessionStatus::Running,
        }
    }

    /// Zero-based index of the current iteration.
    #[must_use]
    pub fn iteration_count(&self) -> u32 {
        self.iteration_count
    }

    /// Elements handed to the sink so far.
    #[must_use]
    pub fn cumulative_extracted_count(&self) -> usize {
        self.cumulative_extracted_count
    }

    #[must_use]
    pub fn last_signal_value(&self) -> Option<SignalValue> {
        self.last_signal_value
    }

    /// Page height sampled after the previous wait (scroll sessions only).
    #[must_use]
    pub fn last_height_metric(&self) -> Option<f64> {
        self.last_height_metric
    }

    #[must_use]
    pub fn last_action(&self) -> &NavigationAction {
        &self.last_action
    }

    /// Iterations in a row in which no new items appeared.
    #[must_use]
    pub fn consecutive_no_growth(&self) -> u32 {
        self.consecutive_no_growth
    }

    #[must_use]
    pub fn actions_dispatched(&self) -> u32 {
        self.actions_dispatched
    }

    #[must_use]
    pub fn waits_attempted(&self) -> u32 {
        self.waits_attempted
    }

    #[must_use]
    pub fn exhaustion(&self) -> Option<Exhaustion> {
        self.exhaustion
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub(crate) fn record_action(&mut self, action: NavigationAction) {
        self.actions_dispatched += 1;
        self.last_action = action;
    }

    pub(crate) fn record_wait_attempt(&mut self) {
        self.waits_attempted += 1;
    }

    pub(crate) fn record_signal(&mut self, value: SignalValue) {
        self.last_signal_value = Some(value);
    }

    pub(crate) fn record_extracted(&mut self, elements: usize) {
        self.cumulative_extracted_count += elements;
    }

    pub(crate) fn record_growth(&mut self, grew: bool) {
        if grew {
            self.consecutive_no_growth = 0;
        } else {
            self.consecutive_no_growth += 1;
        }
    }

    /// Stores this iteration's height and returns the previous one.
    pub(crate) fn record_height(&mut self, height: f64) -> Option<f64> {
        self.last_height_metric.replace(height)
    }

    pub(crate) fn signal_exhaustion(&mut self, exhaustion: Exhaustion) {
        self.exhaustion.get_or_insert(exhaustion);
    }

    pub(crate) fn advance(&mut self) {
        self.iteration_count += 1;
    }

    /// Sets the terminal status. Returns false, leaving the state untouched,
    /// if the session already finished.
    pub(crate) fn finish(&mut self, status: SessionStatus) -> bool {
        if self.status.is_terminal() {
            warn!(
                current = ?self.status,
                requested = ?status,
                "session already finished, keeping terminal status"
            );
            return false;
        }
        self.status = status;
        true
    }
}
