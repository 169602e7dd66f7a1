//! Error taxonomy for the calculation engine
//!
//! Validation, not-found, and conflict failures surface as distinct
//! variants. Legacy-tolerant coercions (unknown reason or classification
//! codes) are deliberately NOT errors; see the code enums in
//! `participant::data`.

use thiserror::Error;

/// Typed failure surfaced by the engine's fallible operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    /// Malformed or out-of-range request parameters
    #[error("validation failed: {0}")]
    Validation(String),

    /// A participant, transaction, or snapshot lookup returned no match
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: u64 },

    /// A second reversal was attempted against an already-reversed row
    #[error("transaction {source_id} is already reversed by transaction {reversal_id}")]
    AlreadyReversed { source_id: u64, reversal_id: u64 },

    /// Plan year outside the supported accounting range
    #[error("plan year {plan_year} outside supported range {min}..={max}")]
    PlanYearOutOfRange { plan_year: i32, min: i32, max: i32 },
}
