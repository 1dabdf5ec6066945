//! The navigation loop.
//!
//! One controller drives one page for one session. Each iteration runs
//! strictly in order:
//!
//! 1. capture the baseline (item count, loader state) before acting;
//! 2. trigger the strategy's action;
//! 3. wait for the strategy's signal to stabilize;
//! 4. extract only the elements that are new since the last pass;
//! 5. for scroll sessions, compare the page height with the previous
//!    iteration;
//! 6. ask the termination policy whether to continue.
//!
//! Whatever happens, [`NavigationController::run`] returns a
//! [`SessionReport`] holding every record extracted so far.

use crate::config::{default_max_iterations, default_no_growth_threshold, NavigationConfig};
use crate::detector::{StabilizationDetector, WaitOutcome, DEFAULT_TIMEOUT};
use crate::driver::{count_elements, page_height, PageDriver};
use crate::error::{ConfigError, NavigationError, Result};
use crate::policy::{Decision, StopReason, TerminationPolicy};
use crate::signal::Baseline;
use crate::sink::ExtractionSink;
use crate::state::{Exhaustion, NavigationState, SessionStatus};
use crate::strategy::{ActionOutcome, ContentMode, NavigationStrategy};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Outcome of a session: records, final state and why it stopped.
#[derive(Debug)]
pub struct SessionReport<R> {
    /// Records in extraction order, across all iterations.
    pub records: Vec<R>,
    pub state: NavigationState,
    pub reason: StopReason,
    /// Set when the session timed out or failed.
    pub error: Option<NavigationError>,
}

impl<R> SessionReport<R> {
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.state.status()
    }

    #[must_use]
    pub fn iteration_count(&self) -> u32 {
        self.state.iteration_count()
    }

    /// True if the session ended without timing out, failing or being
    /// cancelled.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(
            self.status(),
            SessionStatus::Stabilized | SessionStatus::Exhausted
        )
    }
}

/// Drives one page through a navigation strategy.
#[derive(Debug)]
pub struct NavigationController<'d, D: PageDriver + ?Sized> {
    driver: &'d D,
    strategy: NavigationStrategy,
    detector: StabilizationDetector,
    policy: TerminationPolicy,
    timeout: Duration,
    cancel: CancellationToken,
}

impl<'d, D: PageDriver + ?Sized> NavigationController<'d, D> {
    /// Controller with default timings and termination policy.
    pub fn new(driver: &'d D, strategy: NavigationStrategy) -> Self {
        Self {
            driver,
            strategy,
            detector: StabilizationDetector::default(),
            policy: TerminationPolicy::new(
                default_max_iterations(),
                Some(default_no_growth_threshold()),
            ),
            timeout: DEFAULT_TIMEOUT,
            cancel: CancellationToken::new(),
        }
    }

    /// Controller configured from `config`.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the configuration does not validate.
    pub fn from_config(
        driver: &'d D,
        config: &NavigationConfig,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(driver, config.strategy()?)
            .with_detector(config.detector())
            .with_policy(config.termination_policy())
            .with_timeout(config.timeout()))
    }

    #[must_use]
    pub fn with_detector(mut self, detector: StabilizationDetector) -> Self {
        self.detector = detector;
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: TerminationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Deadline for each stabilization wait.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Token checked before every action and at every poll boundary.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    #[must_use]
    pub fn strategy(&self) -> &NavigationStrategy {
        &self.strategy
    }

    /// Runs the session to a terminal status.
    #[instrument(skip_all, fields(strategy = self.strategy.name()))]
    pub async fn run<S>(self, sink: &mut S) -> SessionReport<S::Record>
    where
        S: ExtractionSink<D::Element>,
    {
        let mut state = NavigationState::new();
        let mut records = Vec::new();
        info!("navigation session started");

        let (reason, error) = loop {
            match self.iterate(&mut state, sink, &mut records).await {
                Ok(Decision::Continue) => state.advance(),
                Ok(Decision::Stop(reason)) => break (reason, None),
                Err(err) => {
                    let reason = match err {
                        NavigationError::Timeout { .. } => StopReason::Timeout,
                        _ => StopReason::Error,
                    };
                    break (reason, Some(err));
                }
            }
        };
        state.finish(reason.status());

        match &error {
            Some(err) => warn!(
                %reason,
                error = %err,
                iterations = state.iteration_count(),
                records = records.len(),
                "navigation session ended early"
            ),
            None => info!(
                %reason,
                iterations = state.iteration_count(),
                records = records.len(),
                "navigation session finished"
            ),
        }

        SessionReport {
            records,
            state,
            reason,
            error,
        }
    }

    async fn iterate<S>(
        &self,
        state: &mut NavigationState,
        sink: &mut S,
        records: &mut Vec<S::Record>,
    ) -> Result<Decision>
    where
        S: ExtractionSink<D::Element>,
    {
        let iteration = state.iteration_count();
        if self.cancel.is_cancelled() {
            return Ok(Decision::Stop(StopReason::Cancelled));
        }

        let baseline = self.capture_baseline().await?;
        debug!(
            iteration,
            items = baseline.item_count,
            "baseline captured"
        );

        let action = match self.strategy.trigger(self.driver, iteration).await? {
            ActionOutcome::Dispatched(action) => action,
            ActionOutcome::Exhausted => {
                state.signal_exhaustion(Exhaustion::SourceSignaled);
                return Ok(self.policy.evaluate(state));
            }
        };
        debug!(iteration, ?action, "action dispatched");
        state.record_action(action);

        // An action is never left without a recorded wait, even if the wait
        // itself is cancelled or fails.
        let signal = self.strategy.signal(&baseline);
        state.record_wait_attempt();
        let outcome = self
            .detector
            .wait_for_stabilization(self.driver, &signal, self.timeout, &self.cancel)
            .await?;
        state.record_signal(outcome.snapshot().value);

        match outcome {
            WaitOutcome::Stabilized(_) => {}
            WaitOutcome::Timeout(snapshot) if self.strategy.timeout_means_no_growth() => {
                debug!(
                    iteration,
                    samples = snapshot.samples,
                    "nothing arrived after scrolling"
                );
            }
            WaitOutcome::Timeout(snapshot) => {
                return Err(NavigationError::Timeout {
                    waited: snapshot.elapsed,
                });
            }
            WaitOutcome::Cancelled(_) => return Ok(Decision::Stop(StopReason::Cancelled)),
        }

        let elements = self.driver.find_elements(self.strategy.items()).await?;
        let (delta, grew) = match self.strategy.content_mode() {
            ContentMode::Append => {
                let offset = state.cumulative_extracted_count();
                if elements.len() < offset {
                    warn!(
                        iteration,
                        matched = elements.len(),
                        extracted = offset,
                        "fewer items on the page than already extracted"
                    );
                }
                (
                    elements.get(offset..).unwrap_or_default(),
                    elements.len() > baseline.item_count,
                )
            }
            ContentMode::Replace => (elements.as_slice(), !elements.is_empty()),
        };

        if !delta.is_empty() {
            let batch = sink.extract(delta).await?;
            debug!(
                iteration,
                elements = delta.len(),
                records = batch.len(),
                "delta extracted"
            );
            state.record_extracted(delta.len());
            records.extend(batch);
        }
        state.record_growth(grew);

        if self.strategy.tracks_page_height() {
            let height = page_height(self.driver).await?;
            let previous = state.record_height(height);
            let unchanged = previous.is_some_and(|p| (p - height).abs() < f64::EPSILON);
            debug!(iteration, height, ?previous, grew, "page height sampled");
            // Item growth is authoritative; an unchanged height only confirms
            // that nothing else is on its way.
            if unchanged && !grew {
                state.signal_exhaustion(Exhaustion::ContentStalled);
            }
        }

        Ok(self.policy.evaluate(state))
    }

    async fn capture_baseline(&self) -> Result<Baseline> {
        let item_count = count_elements(self.driver, self.strategy.items()).await?;
        Ok(Baseline { item_count })
    }
}
