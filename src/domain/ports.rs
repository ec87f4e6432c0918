use super::payment::{Outcome, RequestKey};
use async_trait::async_trait;
use std::sync::Arc;

/// Port for the remote payment processor.
///
/// One invocation per submission attempt; the call suspends until the
/// processor resolves. Implementations own their committed-key bookkeeping
/// and must classify a re-submitted key as a duplicate rather than re-apply
/// its effect.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    async fn process(&self, key: RequestKey) -> Outcome;
}

/// Shared between a controller and the chain task it spawns.
pub type SharedProcessor = Arc<dyn PaymentProcessor>;
