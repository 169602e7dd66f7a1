//! Vesting System - Calculation engine for employer profit-sharing plans
//!
//! This library provides:
//! - Classification replay over a participant's transaction ledger
//! - Year-end policy deltas (enrollment, points, certificates)
//! - Balance, distribution, and vesting-ratio aggregation
//! - Forfeiture and reversal ledger mutations
//! - Parallel year-end close across participants

pub mod aggregate;
pub mod batch;
pub mod calendar;
pub mod error;
pub mod ledger;
pub mod participant;
pub mod replay;
pub mod yearend;

// Re-export commonly used types
pub use batch::{CloseConfig, CloseRunner, ParticipantCase, ParticipantCloseResult};
pub use calendar::{FiscalYearBounds, PlanCalendar};
pub use error::EngineError;
pub use ledger::{LedgerTransaction, TransactionKind};
pub use participant::{ClassificationCode, ParticipantFacts, ParticipantYearSnapshot};
pub use replay::{compute_classification, ReplayInput, ReplayOutcome, VestingState};
pub use yearend::{compute_year_end_change, YearEndChange, YearEndInput};
