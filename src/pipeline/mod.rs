//! Run orchestration: configuration, cancellation and the stage sequence.

pub mod cancel;
pub mod config;
pub mod orchestrator;
