//! Infrastructure adapters for the processor port.
//!
//! The only adapter in scope is the simulated unreliable backend; a real
//! transport would slot in behind the same `PaymentProcessor` trait.

pub mod simulated;
