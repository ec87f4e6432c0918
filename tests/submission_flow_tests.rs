mod common;

use common::spawn_collector;
use idempay::application::controller::SubmissionController;
use idempay::domain::payment::PaymentRequest;
use idempay::domain::policy::RetryPolicy;
use idempay::domain::state::SubmissionState;
use idempay::infrastructure::simulated::{Resolution, ScriptedPlan, SimulatedBackend};
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;

fn request() -> PaymentRequest {
    PaymentRequest::new("alice@example.com", dec!(25.00))
}

fn scripted(steps: impl IntoIterator<Item = Resolution>) -> Arc<SimulatedBackend<ScriptedPlan>> {
    Arc::new(SimulatedBackend::with_plan(ScriptedPlan::new(steps)))
}

#[tokio::test(start_paused = true)]
async fn test_first_try_success() {
    let backend = scripted([Resolution::Commit]);
    let controller = SubmissionController::new(backend.clone(), RetryPolicy::default());
    let collector = spawn_collector(controller.subscribe());

    assert_eq!(controller.state(), SubmissionState::Idle);
    controller.submit(request()).await;
    controller.settled().await;

    assert_eq!(controller.state().status(), "success");
    assert_eq!(controller.state().message(), "Success");
    assert_eq!(backend.calls(), 1);
    assert!(backend.is_committed(&request().key()).await);

    drop(controller);
    let seen = collector.await.unwrap();
    let statuses: Vec<_> = seen.iter().map(|s| s.status()).collect();
    assert_eq!(statuses, ["pending", "success"]);
}

#[tokio::test(start_paused = true)]
async fn test_recovers_after_two_transient_failures() {
    let backend = scripted([Resolution::Reject, Resolution::Reject, Resolution::Commit]);
    let controller = SubmissionController::new(backend.clone(), RetryPolicy::default());
    let collector = spawn_collector(controller.subscribe());

    controller.submit(request()).await;
    controller.settled().await;

    assert_eq!(controller.state().message(), "Success");
    assert_eq!(backend.calls(), 3);

    drop(controller);
    let seen = collector.await.unwrap();
    let statuses: Vec<_> = seen.iter().map(|s| s.status()).collect();
    assert_eq!(
        statuses,
        ["pending", "retrying", "pending", "retrying", "pending", "success"]
    );

    let retry_messages: Vec<_> = seen
        .iter()
        .filter(|s| s.status() == "retrying")
        .map(|s| s.message().to_string())
        .collect();
    assert_eq!(retry_messages, ["Retrying 1/3...", "Retrying 2/3..."]);
}

#[tokio::test(start_paused = true)]
async fn test_gives_up_after_bounded_retries() {
    let backend = scripted(vec![Resolution::Reject; 4]);
    let controller = SubmissionController::new(backend.clone(), RetryPolicy::default());
    let collector = spawn_collector(controller.subscribe());

    controller.submit(request()).await;
    controller.settled().await;

    assert_eq!(controller.state().status(), "error");
    assert_eq!(controller.state().message(), "Failed after retries");
    // Initial attempt plus exactly three retries.
    assert_eq!(backend.calls(), 4);
    assert!(!backend.is_committed(&request().key()).await);

    // A fresh submit is accepted after the terminal failure; the exhausted
    // script commits from here on.
    controller.submit(request()).await;
    controller.settled().await;
    assert_eq!(controller.state().message(), "Success");
    assert_eq!(backend.calls(), 5);

    drop(controller);
    let seen = collector.await.unwrap();
    let retry_messages: Vec<_> = seen
        .iter()
        .filter(|s| s.status() == "retrying")
        .map(|s| s.message().to_string())
        .collect();
    assert_eq!(
        retry_messages,
        ["Retrying 1/3...", "Retrying 2/3...", "Retrying 3/3..."]
    );
}

#[tokio::test(start_paused = true)]
async fn test_linear_backoff_timing() {
    let backend = scripted(vec![Resolution::Reject; 4]);
    let controller = SubmissionController::new(backend.clone(), RetryPolicy::default());

    let start = tokio::time::Instant::now();
    controller.submit(request()).await;
    controller.settled().await;
    let elapsed = start.elapsed();

    // Four 800ms round trips plus backoffs of 1s, 2s and 3s.
    let expected = Duration::from_millis(4 * 800 + 1000 + 2000 + 3000);
    assert!(
        elapsed >= expected && elapsed < expected + Duration::from_millis(10),
        "elapsed {elapsed:?}, expected {expected:?}"
    );
}

#[tokio::test(start_paused = true)]
async fn test_slow_success_is_not_a_failure() {
    let backend = scripted([Resolution::CommitDelayed]);
    let controller = SubmissionController::new(backend.clone(), RetryPolicy::default());
    let collector = spawn_collector(controller.subscribe());

    controller.submit(request()).await;
    controller.settled().await;

    assert_eq!(controller.state().status(), "success");
    assert_eq!(controller.state().message(), "Success after delay");

    drop(controller);
    let seen = collector.await.unwrap();
    assert!(seen.iter().all(|s| s.status() != "error"));
    let statuses: Vec<_> = seen.iter().map(|s| s.status()).collect();
    assert_eq!(statuses, ["pending", "success"]);
}

#[tokio::test(start_paused = true)]
async fn test_resubmit_after_commit_is_duplicate() {
    let backend = scripted([Resolution::Commit]);
    let controller = SubmissionController::new(backend.clone(), RetryPolicy::default());

    controller.submit(request()).await;
    controller.settled().await;
    assert_eq!(controller.state().message(), "Success");

    // Every later submission of the same fields resolves as a duplicate.
    for _ in 0..2 {
        controller.submit(request()).await;
        controller.settled().await;
        assert_eq!(
            controller.state().message(),
            "Already processed — no duplicate created"
        );
    }
    assert_eq!(backend.calls(), 3);
    assert!(backend.is_committed(&request().key()).await);
}

#[tokio::test(start_paused = true)]
async fn test_distinct_requests_commit_separately() {
    let backend = scripted([Resolution::Commit, Resolution::Commit]);
    let controller = SubmissionController::new(backend.clone(), RetryPolicy::default());

    let first = PaymentRequest::new("alice@example.com", dec!(25.00));
    let second = PaymentRequest::new("alice@example.com", dec!(30.00));

    controller.submit(first.clone()).await;
    controller.settled().await;
    controller.submit(second.clone()).await;
    controller.settled().await;

    // A different amount is a different logical request, not a duplicate.
    assert_eq!(controller.state().message(), "Success");
    assert!(backend.is_committed(&first.key()).await);
    assert!(backend.is_committed(&second.key()).await);
}
