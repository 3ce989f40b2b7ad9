//! Verification orchestrator: dispatches uploads through normalisation,
//! extraction, and rule evaluation, then aggregates per-ticket verdicts.

mod error;
pub use error::EngineError;

mod orchestrator;
pub use orchestrator::VerificationEngine;
