use crate::error::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

/// The caller-supplied fields that define one logical payment.
///
/// Validation of the fields (non-empty payer, positive amount, ...) is the
/// caller's responsibility; the core only cares about their identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentRequest {
    pub payer: String,
    pub amount: Decimal,
}

impl PaymentRequest {
    pub fn new(payer: impl Into<String>, amount: Decimal) -> Self {
        Self {
            payer: payer.into(),
            amount,
        }
    }

    pub fn key(&self) -> RequestKey {
        RequestKey::derive(self)
    }
}

/// Deterministic identity of a payment request.
///
/// Two submissions with identical fields derive the same key; the key is the
/// sole basis for duplicate detection on the processor side.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey(String);

impl RequestKey {
    pub fn derive(request: &PaymentRequest) -> Self {
        Self(format!("{}-{}", request.payer, request.amount))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A successful processor resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Receipt {
    /// The key had already been committed by an earlier request; nothing was
    /// re-applied.
    pub duplicate: bool,
    /// The request committed, but confirmation only arrived after a long
    /// delay.
    pub delayed: bool,
}

/// What a single processor invocation resolves to, produced exactly once per
/// call.
pub type Outcome = Result<Receipt>;
