//! Application layer containing the submission orchestration logic.
//!
//! This module defines the `SubmissionController`, which drives at most one
//! retry chain at a time against a `PaymentProcessor` port and publishes the
//! visible state machine for callers to render.

pub mod controller;
