use crate::domain::payment::{PaymentRequest, Receipt, RequestKey};
use crate::domain::policy::RetryPolicy;
use crate::domain::ports::{PaymentProcessor, SharedProcessor};
use crate::domain::state::SubmissionState;
use crate::error::PaymentError;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Drives idempotent payment submissions against a processor port.
///
/// A controller runs at most one submission chain at a time: `submit` while a
/// chain is outstanding (backoff waits included) is a silent no-op. Each
/// chain applies bounded linear backoff on transient failures and publishes
/// every state transition through a watch channel.
///
/// All mutable state lives on the instance; dropping the controller aborts a
/// chain that is still running, so no backoff timer outlives disposal.
pub struct SubmissionController {
    processor: SharedProcessor,
    policy: RetryPolicy,
    shared: Arc<ChainShared>,
    chain: Mutex<Option<JoinHandle<()>>>,
}

/// State shared between the controller and its spawned chain task.
struct ChainShared {
    in_flight: AtomicBool,
    state_tx: watch::Sender<SubmissionState>,
}

impl ChainShared {
    fn transition(&self, next: SubmissionState) {
        debug!(status = next.status(), message = next.message(), "transition");
        self.state_tx.send_replace(next);
    }
}

impl SubmissionController {
    pub fn new(processor: SharedProcessor, policy: RetryPolicy) -> Self {
        let (state_tx, _) = watch::channel(SubmissionState::Idle);
        Self {
            processor,
            policy,
            shared: Arc::new(ChainShared {
                in_flight: AtomicBool::new(false),
                state_tx,
            }),
            chain: Mutex::new(None),
        }
    }

    /// Starts a submission chain for `request`.
    ///
    /// If a chain is already in flight the call has no observable effect: no
    /// processor invocation, no state change. The chain itself runs as a
    /// spawned task and settles independently; observe it through
    /// [`subscribe`](Self::subscribe) or await it with
    /// [`settled`](Self::settled).
    pub async fn submit(&self, request: PaymentRequest) {
        if self
            .shared
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!(payer = %request.payer, "submission already in flight, ignoring");
            return;
        }

        let key = request.key();
        info!(key = %key, "starting submission chain");
        self.shared.transition(SubmissionState::Pending);

        let handle = tokio::spawn(run_chain(
            self.processor.clone(),
            self.policy.clone(),
            key,
            self.shared.clone(),
        ));
        *self.chain.lock().await = Some(handle);
    }

    /// Current state of the most recent chain.
    pub fn state(&self) -> SubmissionState {
        self.shared.state_tx.borrow().clone()
    }

    /// Subscribes to state transitions.
    pub fn subscribe(&self) -> watch::Receiver<SubmissionState> {
        self.shared.state_tx.subscribe()
    }

    /// Waits until the outstanding chain, if any, reaches a terminal state.
    pub async fn settled(&self) {
        let handle = self.chain.lock().await.take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}

impl Drop for SubmissionController {
    fn drop(&mut self) {
        // Cancel a chain that is still sleeping through a backoff or waiting
        // on a slow processor; the task must not outlive the controller.
        if let Ok(mut chain) = self.chain.try_lock()
            && let Some(handle) = chain.take()
        {
            handle.abort();
        }
    }
}

/// One submission chain: attempt, and on transient failure back off and
/// re-attempt with the same key until success or exhaustion.
///
/// Each retry is only scheduled after the prior outcome is known, so state
/// transitions are applied strictly in attempt order. A slow success is
/// awaited indefinitely; elapsed time alone never escalates to failure.
async fn run_chain(
    processor: SharedProcessor,
    policy: RetryPolicy,
    key: RequestKey,
    shared: Arc<ChainShared>,
) {
    let mut attempt: u32 = 0;
    loop {
        match processor.process(key.clone()).await {
            Ok(receipt) => {
                info!(
                    key = %key,
                    duplicate = receipt.duplicate,
                    delayed = receipt.delayed,
                    "payment settled"
                );
                shared.transition(SubmissionState::Success {
                    message: receipt_message(receipt),
                });
                break;
            }
            Err(PaymentError::Transient) => match policy.delay_for_attempt(attempt + 1) {
                Some(delay) => {
                    attempt += 1;
                    warn!(key = %key, attempt, "transient failure, backing off");
                    shared.transition(SubmissionState::Retrying {
                        attempt,
                        message: format!("Retrying {attempt}/{}...", policy.max_retries),
                    });
                    tokio::time::sleep(delay).await;
                    shared.transition(SubmissionState::Pending);
                }
                None => {
                    warn!(key = %key, attempt, "retries exhausted, giving up");
                    shared.transition(SubmissionState::Failed {
                        message: "Failed after retries".to_string(),
                    });
                    break;
                }
            },
        }
    }
    // Attempt counting restarts from zero with the next chain; clearing the
    // guard is what makes a fresh submit acceptable again.
    shared.in_flight.store(false, Ordering::SeqCst);
}

fn receipt_message(receipt: Receipt) -> String {
    if receipt.duplicate {
        "Already processed — no duplicate created"
    } else if receipt.delayed {
        "Success after delay"
    } else {
        "Success"
    }
    .to_string()
}
