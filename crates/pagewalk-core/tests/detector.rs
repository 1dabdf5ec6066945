//! Stabilization timing against the in-memory page.

mod common;

use common::{batch, FakePage, ITEMS, LOADER};
use pagewalk_core::{
    CancellationToken, Locator, NavigationError, SignalValue, StabilizationDetector,
    StabilizationSignal, WaitOutcome,
};
use std::time::Duration;
use tokio::time::Instant;

const POLL: Duration = Duration::from_millis(100);

fn count_signal(baseline: usize) -> StabilizationSignal {
    StabilizationSignal::ElementCountThreshold {
        items: Locator::css(ITEMS),
        baseline,
    }
}

#[tokio::test(start_paused = true)]
async fn reports_growth_within_one_poll_interval() {
    let page = FakePage::new();
    page.schedule_append(Instant::now() + POLL * 3, batch("late", 2));

    let outcome = StabilizationDetector::new(POLL)
        .wait_for_stabilization(
            &page,
            &count_signal(0),
            Duration::from_secs(5),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let WaitOutcome::Stabilized(snapshot) = outcome else {
        panic!("expected stabilization, got {outcome:?}");
    };
    assert!(snapshot.elapsed >= POLL * 3);
    assert!(snapshot.elapsed <= POLL * 4);
    assert_eq!(snapshot.value, SignalValue::Count(2));
}

#[tokio::test(start_paused = true)]
async fn deadline_is_sampled_before_giving_up() {
    let page = FakePage::new().with_items(batch("old", 3));

    let outcome = StabilizationDetector::new(POLL)
        .wait_for_stabilization(
            &page,
            &count_signal(3),
            Duration::from_millis(250),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let WaitOutcome::Timeout(snapshot) = outcome else {
        panic!("expected timeout, got {outcome:?}");
    };
    // 0, 100, 200 and the deadline itself.
    assert_eq!(snapshot.samples, 4);
    assert_eq!(snapshot.elapsed, Duration::from_millis(250));
    assert_eq!(snapshot.value, SignalValue::Count(3));
}

#[tokio::test(start_paused = true)]
async fn loader_must_disappear() {
    let page = FakePage::new();
    page.show_loader();
    page.schedule_hide_loader(Instant::now() + Duration::from_millis(420));

    let outcome = StabilizationDetector::new(POLL)
        .wait_for_stabilization(
            &page,
            &StabilizationSignal::ElementVisibility {
                loader: Locator::css(LOADER),
            },
            Duration::from_secs(2),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let WaitOutcome::Stabilized(snapshot) = outcome else {
        panic!("expected stabilization, got {outcome:?}");
    };
    assert_eq!(snapshot.elapsed, Duration::from_millis(500));
    assert_eq!(
        snapshot.value,
        SignalValue::Visibility {
            visible: false,
            observed_visible: true
        }
    );
}

#[tokio::test(start_paused = true)]
async fn loader_hidden_by_class_is_seen_as_gone() {
    let page = FakePage::new().with_class_styled_loader();
    page.show_loader();
    page.schedule_hide_loader(Instant::now() + Duration::from_millis(220));

    let outcome = StabilizationDetector::new(POLL)
        .wait_for_stabilization(
            &page,
            &StabilizationSignal::ElementVisibility {
                loader: Locator::css(LOADER),
            },
            Duration::from_secs(1),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let WaitOutcome::Stabilized(snapshot) = outcome else {
        panic!("expected stabilization, got {outcome:?}");
    };
    assert_eq!(snapshot.elapsed, Duration::from_millis(300));
    assert_eq!(
        snapshot.value,
        SignalValue::Visibility {
            visible: false,
            observed_visible: true
        }
    );
}

#[tokio::test(start_paused = true)]
async fn already_hidden_loader_counts_as_stable() {
    let page = FakePage::new();

    let outcome = StabilizationDetector::new(POLL)
        .wait_for_stabilization(
            &page,
            &StabilizationSignal::ElementVisibility {
                loader: Locator::css(LOADER),
            },
            Duration::from_secs(2),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let WaitOutcome::Stabilized(snapshot) = outcome else {
        panic!("expected stabilization, got {outcome:?}");
    };
    assert_eq!(snapshot.samples, 1);
    assert_eq!(
        snapshot.value,
        SignalValue::Visibility {
            visible: false,
            observed_visible: false
        }
    );
}

#[tokio::test(start_paused = true)]
async fn page_height_must_exceed_baseline() {
    let page = FakePage::new().with_items(batch("row", 5));
    page.schedule_append(Instant::now() + Duration::from_millis(150), batch("more", 1));

    let outcome = StabilizationDetector::new(POLL)
        .wait_for_stabilization(
            &page,
            &StabilizationSignal::PageHeightMetric {
                baseline: Some(1000.0),
            },
            Duration::from_secs(1),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let WaitOutcome::Stabilized(snapshot) = outcome else {
        panic!("expected stabilization, got {outcome:?}");
    };
    assert_eq!(snapshot.elapsed, Duration::from_millis(200));
    assert_eq!(snapshot.value, SignalValue::Height(1040.0));
}

#[tokio::test(start_paused = true)]
async fn cancellation_interrupts_the_wait() {
    let page = FakePage::new();
    let cancel = CancellationToken::new();
    let detector = StabilizationDetector::new(POLL);
    let signal = count_signal(0);

    let wait = detector.wait_for_stabilization(&page, &signal, Duration::from_secs(30), &cancel);
    let canceller = async {
        tokio::time::sleep(Duration::from_millis(250)).await;
        cancel.cancel();
    };
    let (outcome, ()) = tokio::join!(wait, canceller);

    let WaitOutcome::Cancelled(snapshot) = outcome.unwrap() else {
        panic!("expected cancellation");
    };
    assert!(snapshot.elapsed < Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn sampling_errors_end_the_wait() {
    let err = StabilizationDetector::default()
        .wait_for_stabilization(
            &common::DeadPage,
            &count_signal(0),
            Duration::from_secs(1),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, NavigationError::DriverCommunication(_)));
}
