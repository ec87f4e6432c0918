use crate::domain::payment::{Outcome, Receipt, RequestKey};
use crate::domain::ports::PaymentProcessor;
use crate::error::PaymentError;
use async_trait::async_trait;
use rand::Rng;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

/// How the simulated processor resolves a request for a fresh key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Commit and confirm after the short round-trip delay.
    Commit,
    /// Reject after the short round-trip delay without committing anything.
    Reject,
    /// Commit, but confirm only after the long delay. Models a request that
    /// actually landed while its response was slow.
    CommitDelayed,
}

/// Strategy deciding the resolution for each fresh-key request.
///
/// Injectable so deterministic sequences can drive tests and the demo binary
/// without real randomness.
pub trait ResolutionPlan: Send + Sync {
    fn draw(&self) -> Resolution;
}

/// Uniform random draw: 40% commit, 30% reject, 30% delayed commit.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomPlan;

impl ResolutionPlan for RandomPlan {
    fn draw(&self) -> Resolution {
        let r: f64 = rand::thread_rng().r#gen();
        if r < 0.4 {
            Resolution::Commit
        } else if r < 0.7 {
            Resolution::Reject
        } else {
            Resolution::CommitDelayed
        }
    }
}

/// Pops a fixed sequence of resolutions; draws `Commit` once exhausted.
pub struct ScriptedPlan {
    script: Mutex<VecDeque<Resolution>>,
}

impl ScriptedPlan {
    pub fn new(steps: impl IntoIterator<Item = Resolution>) -> Self {
        Self {
            script: Mutex::new(steps.into_iter().collect()),
        }
    }
}

impl ResolutionPlan for ScriptedPlan {
    fn draw(&self) -> Resolution {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or(Resolution::Commit)
    }
}

/// Delay profile of the simulated processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendTiming {
    /// Round-trip delay for ordinary commits and rejections.
    pub short_delay: Duration,
    /// Bounds for the slow-confirmation delay, sampled uniformly per request.
    pub long_delay_min: Duration,
    pub long_delay_max: Duration,
}

impl Default for BackendTiming {
    fn default() -> Self {
        Self {
            short_delay: Duration::from_millis(800),
            long_delay_min: Duration::from_secs(5),
            long_delay_max: Duration::from_secs(10),
        }
    }
}

/// Simulated unreliable payment processor.
///
/// Remembers every key it has committed, so a retried request for an
/// already-committed key resolves immediately as a harmless duplicate instead
/// of re-applying its effect. Rejections commit nothing; that asymmetry is
/// what makes the controller's retries safe.
pub struct SimulatedBackend<P: ResolutionPlan = RandomPlan> {
    committed: Arc<RwLock<HashSet<RequestKey>>>,
    plan: P,
    timing: BackendTiming,
    calls: AtomicU64,
}

impl SimulatedBackend {
    pub fn new() -> Self {
        Self::with_plan(RandomPlan)
    }
}

impl Default for SimulatedBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: ResolutionPlan> SimulatedBackend<P> {
    pub fn with_plan(plan: P) -> Self {
        Self::with_plan_and_timing(plan, BackendTiming::default())
    }

    pub fn with_plan_and_timing(plan: P, timing: BackendTiming) -> Self {
        Self {
            committed: Arc::new(RwLock::new(HashSet::new())),
            plan,
            timing,
            calls: AtomicU64::new(0),
        }
    }

    /// Whether `key` has been committed at least once.
    pub async fn is_committed(&self, key: &RequestKey) -> bool {
        self.committed.read().await.contains(key)
    }

    /// Number of `process` invocations so far.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    async fn commit(&self, key: &RequestKey) {
        self.committed.write().await.insert(key.clone());
    }

    fn long_delay(&self) -> Duration {
        let min = self.timing.long_delay_min;
        let max = self.timing.long_delay_max;
        if max <= min {
            return min;
        }
        min + Duration::from_millis(
            rand::thread_rng().gen_range(0..=(max - min).as_millis() as u64),
        )
    }
}

#[async_trait]
impl<P: ResolutionPlan> PaymentProcessor for SimulatedBackend<P> {
    async fn process(&self, key: RequestKey) -> Outcome {
        self.calls.fetch_add(1, Ordering::SeqCst);

        // A key that already landed resolves immediately as a fast, reliable
        // round trip.
        if self.committed.read().await.contains(&key) {
            debug!(%key, "duplicate submission for committed key");
            return Ok(Receipt {
                duplicate: true,
                delayed: false,
            });
        }

        match self.plan.draw() {
            Resolution::Commit => {
                self.commit(&key).await;
                tokio::time::sleep(self.timing.short_delay).await;
                Ok(Receipt::default())
            }
            Resolution::Reject => {
                tokio::time::sleep(self.timing.short_delay).await;
                Err(PaymentError::Transient)
            }
            Resolution::CommitDelayed => {
                tokio::time::sleep(self.long_delay()).await;
                self.commit(&key).await;
                Ok(Receipt {
                    duplicate: false,
                    delayed: true,
                })
            }
        }
    }
}
