use idempay::domain::state::SubmissionState;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Records every state transition until the controller is dropped.
pub fn spawn_collector(
    mut transitions: watch::Receiver<SubmissionState>,
) -> JoinHandle<Vec<SubmissionState>> {
    tokio::spawn(async move {
        let mut seen = Vec::new();
        while transitions.changed().await.is_ok() {
            seen.push(transitions.borrow_and_update().clone());
        }
        seen
    })
}
