use thiserror::Error;

/// Errors reported by a payment processor.
///
/// Only one kind is modelled: a retryable failure that committed nothing.
/// There is deliberately no distinction between "network unreachable" and
/// "server rejected"; the controller treats every non-success outcome as
/// transient and fully recoverable.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentError {
    #[error("transient processor failure")]
    Transient,
}

pub type Result<T> = std::result::Result<T, PaymentError>;
