//! Domain layer: request identity, processor outcomes, the retry policy and
//! the visible submission state machine.

pub mod payment;
pub mod policy;
pub mod ports;
pub mod state;
