/// Visible state of one submission chain.
///
/// Exactly one value is current at any time; it is the only thing a
/// presentation layer is expected to render. `Success` and `Failed` are
/// terminal for the chain that produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    Pending,
    Retrying { attempt: u32, message: String },
    Success { message: String },
    Failed { message: String },
}

impl SubmissionState {
    /// Wire-level status string for the presentation contract.
    pub fn status(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Pending => "pending",
            Self::Retrying { .. } => "retrying",
            Self::Success { .. } => "success",
            Self::Failed { .. } => "error",
        }
    }

    /// Human-readable message for the current state.
    pub fn message(&self) -> &str {
        match self {
            Self::Idle => "",
            Self::Pending => "Submitting...",
            Self::Retrying { message, .. }
            | Self::Success { message }
            | Self::Failed { message } => message,
        }
    }

    /// Whether the chain that produced this state has finished.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success { .. } | Self::Failed { .. })
    }
}
