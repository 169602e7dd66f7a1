//! Enrollment/vesting classification replay over a participant's ledger

mod engine;
mod state;

pub use engine::{compute_classification, ReplayInput, ReplayOutcome};
pub use state::ReplayState;

use serde::{Deserialize, Serialize};

// ============================================================================
// Plan policy constants
// ============================================================================
// Year boundaries baked into the plan document and its 2007 restatement.

/// First plan year under the restated (post-change) vesting schedule
pub const POLICY_CHANGE_YEAR: i32 = 2007;

/// Plan year whose void cleanup left stray code-8 rows in the ledger
pub const VOID_ANOMALY_YEAR: i32 = 2003;

/// Years of service at which partial vesting ends
pub const FULL_VESTING_YEARS: u32 = 5;

/// Coarse vesting signal derived from a replay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VestingState {
    NotVested,
    PartiallyVested,
    FullyVested,
}
