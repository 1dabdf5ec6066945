//! Deadline-bounded polling and stabilization detection.
//!
//! Content injected by page scripts arrives at an unknown time after the
//! action that requested it. Rather than sleeping for a fixed period, the
//! detector samples a [`StabilizationSignal`] at a fixed interval until its
//! predicate holds or a deadline passes.
//!
//! # Design
//!
//! The deadline is computed once on `tokio::time::Instant`, which is
//! monotonic, so wall-clock adjustments cannot shorten or extend a wait. The
//! pause before the next sample is capped at the time left, which means the
//! last sample is taken at the deadline itself. Between samples the task
//! suspends on a `tokio::select!` against the session's cancellation token;
//! each poll boundary is therefore also a cancellation point.
//!
//! Driver errors while sampling are not treated as "not yet": they end the
//! wait immediately and are surfaced to the controller.

use crate::driver::{count_elements, is_visible, page_height, PageDriver};
use crate::error::Result;
use crate::signal::{SignalSnapshot, SignalValue, StabilizationSignal};
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Default timeout for a single stabilization wait (10 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default poll interval between samples (250ms).
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Configuration for wait operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitConfig {
    /// Maximum time to wait for the condition.
    pub timeout: Duration,

    /// How often to check if the condition is satisfied.
    pub poll_interval: Duration,
}

impl WaitConfig {
    /// Creates a new wait configuration.
    #[must_use]
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
        }
    }

    /// Creates a config with custom timeout and default poll interval.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new(timeout, DEFAULT_POLL_INTERVAL)
    }
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT, DEFAULT_POLL_INTERVAL)
    }
}

/// How a poll loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStatus {
    /// The predicate held.
    Ready,
    /// The deadline passed first.
    TimedOut,
    /// The cancellation token fired at a poll boundary.
    Cancelled,
}

/// Result of [`poll_until`]: the status plus the last sampled value.
#[derive(Debug, Clone, PartialEq)]
pub struct Polled<T> {
    pub status: PollStatus,
    pub last: T,
    pub samples: u32,
    pub elapsed: Duration,
}

/// Samples `probe` until `holds` accepts a value, the deadline passes, or
/// `cancel` fires.
///
/// The probe is always sampled at least once. A probe error ends the loop
/// and is returned unchanged.
pub async fn poll_until<T, E, F, Fut, P>(
    probe: F,
    mut holds: P,
    config: WaitConfig,
    cancel: &CancellationToken,
) -> std::result::Result<Polled<T>, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    P: FnMut(&T) -> bool,
{
    let start = Instant::now();
    let deadline = start + config.timeout;
    let mut samples = 0u32;

    loop {
        let value = probe().await?;
        samples += 1;

        let finished = |status, last| Polled {
            status,
            last,
            samples,
            elapsed: start.elapsed(),
        };

        if holds(&value) {
            return Ok(finished(PollStatus::Ready, value));
        }

        let now = Instant::now();
        if now >= deadline {
            return Ok(finished(PollStatus::TimedOut, value));
        }

        let pause = config.poll_interval.min(deadline - now);
        tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(finished(PollStatus::Cancelled, value)),
            () = sleep(pause) => {}
        }
    }
}

/// How a stabilization wait ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WaitOutcome {
    /// The signal's predicate held.
    Stabilized(SignalSnapshot),
    /// The deadline passed before the predicate held.
    Timeout(SignalSnapshot),
    /// The session was cancelled while waiting.
    Cancelled(SignalSnapshot),
}

impl WaitOutcome {
    /// The last snapshot taken, whatever the outcome.
    #[must_use]
    pub fn snapshot(&self) -> &SignalSnapshot {
        match self {
            Self::Stabilized(s) | Self::Timeout(s) | Self::Cancelled(s) => s,
        }
    }
}

/// Polls stabilization signals at a fixed interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StabilizationDetector {
    poll_interval: Duration,
}

impl Default for StabilizationDetector {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl StabilizationDetector {
    /// Creates a detector sampling every `poll_interval`.
    #[must_use]
    pub fn new(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }

    /// Interval between two samples.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Waits until `signal` holds, `timeout` elapses, or `cancel` fires.
    ///
    /// Predicates:
    /// - visibility holds when the loader is not visible. A loader that is
    ///   hidden on the first sample was never observed loading, so the wait
    ///   ends immediately instead of running out the timeout;
    /// - count threshold holds when the live count strictly exceeds the
    ///   baseline;
    /// - page height holds when the height strictly exceeds the baseline (or
    ///   on the first sample without a baseline).
    ///
    /// # Errors
    ///
    /// Returns `DriverCommunication` if sampling fails.
    pub async fn wait_for_stabilization<D: PageDriver + ?Sized>(
        &self,
        driver: &D,
        signal: &StabilizationSignal,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<WaitOutcome> {
        let config = WaitConfig::new(timeout, self.poll_interval);
        let mut observed_visible = false;

        let polled = poll_until(
            || sample(driver, signal),
            |value| match *value {
                SignalValue::Visibility { visible, .. } => {
                    observed_visible |= visible;
                    trace!(visible, observed_visible, "loader sampled");
                    !visible
                }
                SignalValue::Count(count) => match signal {
                    StabilizationSignal::ElementCountThreshold { baseline, .. } => {
                        count > *baseline
                    }
                    _ => false,
                },
                SignalValue::Height(height) => match signal {
                    StabilizationSignal::PageHeightMetric { baseline } => {
                        baseline.is_none_or(|b| height > b)
                    }
                    _ => false,
                },
            },
            config,
            cancel,
        )
        .await?;

        let value = match polled.last {
            SignalValue::Visibility { visible, .. } => SignalValue::Visibility {
                visible,
                observed_visible,
            },
            other => other,
        };
        let snapshot = SignalSnapshot {
            value,
            samples: polled.samples,
            elapsed: polled.elapsed,
        };

        debug!(
            signal = %signal,
            status = ?polled.status,
            samples = polled.samples,
            elapsed_ms = u64::try_from(polled.elapsed.as_millis()).unwrap_or(u64::MAX),
            "stabilization wait finished"
        );

        Ok(match polled.status {
            PollStatus::Ready => WaitOutcome::Stabilized(snapshot),
            PollStatus::TimedOut => WaitOutcome::Timeout(snapshot),
            PollStatus::Cancelled => WaitOutcome::Cancelled(snapshot),
        })
    }
}

async fn sample<D: PageDriver + ?Sized>(
    driver: &D,
    signal: &StabilizationSignal,
) -> Result<SignalValue> {
    let value = match signal {
        StabilizationSignal::ElementVisibility { loader } => SignalValue::Visibility {
            visible: is_visible(driver, loader).await?,
            observed_visible: false,
        },
        StabilizationSignal::ElementCountThreshold { items, .. } => {
            SignalValue::Count(count_elements(driver, items).await?)
        }
        StabilizationSignal::PageHeightMetric { .. } => {
            SignalValue::Height(page_height(driver).await?)
        }
    };
    Ok(value)
}
