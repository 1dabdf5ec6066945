//! Termination policy.
//!
//! A pure function of the session state: the controller feeds it the state
//! after each completed iteration and acts on the decision.

use crate::state::{Exhaustion, NavigationState, SessionStatus};
use serde::Serialize;
use std::fmt;

/// A sub-condition of the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationCondition {
    /// Stop once this many iterations have completed.
    MaxIterations(u32),
    /// Stop after this many consecutive iterations without new items.
    NoGrowthForConsecutive(u32),
    /// Stop when the strategy or the controller declared exhaustion.
    ExhaustionSignaled,
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    CappedByIterationLimit,
    NoFurtherGrowthObserved,
    SourceSignaledExhaustion,
    Timeout,
    Error,
    Cancelled,
}

impl StopReason {
    /// Terminal status a session ending for this reason takes.
    #[must_use]
    pub fn status(self) -> SessionStatus {
        match self {
            Self::CappedByIterationLimit => SessionStatus::Stabilized,
            Self::NoFurtherGrowthObserved | Self::SourceSignaledExhaustion => {
                SessionStatus::Exhausted
            }
            Self::Timeout => SessionStatus::TimedOut,
            Self::Error => SessionStatus::Failed,
            Self::Cancelled => SessionStatus::Cancelled,
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::CappedByIterationLimit => "capped by iteration limit",
            Self::NoFurtherGrowthObserved => "no further growth observed",
            Self::SourceSignaledExhaustion => "source signaled exhaustion",
            Self::Timeout => "timeout",
            Self::Error => "error",
            Self::Cancelled => "cancelled",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Continue,
    Stop(StopReason),
}

/// Composite of [`TerminationCondition`]s.
///
/// Conditions are evaluated by precedence, not by insertion order:
/// exhaustion, then no-growth, then the iteration cap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminationPolicy {
    conditions: Vec<TerminationCondition>,
}

impl TerminationPolicy {
    /// Policy with an iteration cap, an optional no-growth threshold, and
    /// exhaustion detection.
    #[must_use]
    pub fn new(max_iterations: u32, no_growth_threshold: Option<u32>) -> Self {
        let mut conditions = vec![
            TerminationCondition::ExhaustionSignaled,
            TerminationCondition::MaxIterations(max_iterations),
        ];
        if let Some(k) = no_growth_threshold {
            conditions.push(TerminationCondition::NoGrowthForConsecutive(k));
        }
        Self { conditions }
    }

    /// Policy from explicit conditions.
    ///
    /// `ExhaustionSignaled` is always added: a strategy that reports no more
    /// content has no action left to dispatch.
    #[must_use]
    pub fn with_conditions(mut conditions: Vec<TerminationCondition>) -> Self {
        if !conditions.contains(&TerminationCondition::ExhaustionSignaled) {
            conditions.push(TerminationCondition::ExhaustionSignaled);
        }
        Self { conditions }
    }

    #[must_use]
    pub fn conditions(&self) -> &[TerminationCondition] {
        &self.conditions
    }

    /// Decides whether the session continues after the iteration recorded in
    /// `state`.
    #[must_use]
    pub fn evaluate(&self, state: &NavigationState) -> Decision {
        if let Some(exhaustion) = state.exhaustion() {
            return Decision::Stop(match exhaustion {
                Exhaustion::SourceSignaled => StopReason::SourceSignaledExhaustion,
                Exhaustion::ContentStalled => StopReason::NoFurtherGrowthObserved,
            });
        }

        let no_growth_limit = self.conditions.iter().find_map(|c| match c {
            TerminationCondition::NoGrowthForConsecutive(k) if *k > 0 => Some(*k),
            _ => None,
        });
        if no_growth_limit.is_some_and(|k| state.consecutive_no_growth() >= k) {
            return Decision::Stop(StopReason::NoFurtherGrowthObserved);
        }

        let iteration_cap = self
            .conditions
            .iter()
            .filter_map(|c| match c {
                TerminationCondition::MaxIterations(n) => Some(*n),
                _ => None,
            })
            .min();
        let completed = state.iteration_count().saturating_add(1);
        if iteration_cap.is_some_and(|n| completed >= n) {
            return Decision::Stop(StopReason::CappedByIterationLimit);
        }

        Decision::Continue
    }
}
