//! Replay fold state for a single participant
//!
//! Rebuilt from scratch on every invocation and never persisted: the state
//! is a pure function of the transaction sequence, which is what makes the
//! replay idempotent.

use rust_decimal::Decimal;

use crate::participant::ClassificationCode;

/// Accumulator threaded through the classification fold.
///
/// The two `saw_*` flags and `forfeiture_is_post_policy` drive the final
/// classification upgrades; each boolean has a single set-point in the
/// engine and the sticky ones are never cleared once set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayState {
    /// Most recent plan year whose first contribution row was examined.
    /// Gates the first-row-per-year rule: duplicate same-year rows are
    /// no-ops.
    pub last_year_examined: Option<i32>,

    /// Most recent plan year that counted toward enrollment
    pub last_year_counted: Option<i32>,

    /// Running classification as of the rows folded so far
    pub classification: ClassificationCode,

    /// Net forfeiture outflow accumulated across the replay, excluding
    /// class-action forfeitures fully offset by settlement credits
    pub accumulated_forfeiture: Decimal,

    /// Sticky: a code-8 row was seen in the 2003 void-cleanup year
    pub saw_void_anomaly_2003: bool,

    /// Sticky: some contribution landed in a post-change plan year.
    /// Set in exactly one place per rule and never cleared.
    pub saw_post_policy_contribution: bool,

    /// Whether the most recent post-2006 forfeiture was a net outflow
    pub forfeiture_is_post_policy: bool,
}

impl ReplayState {
    pub fn new() -> Self {
        Self {
            last_year_examined: None,
            last_year_counted: None,
            classification: ClassificationCode::NotEnrolled,
            accumulated_forfeiture: Decimal::ZERO,
            saw_void_anomaly_2003: false,
            saw_post_policy_contribution: false,
            forfeiture_is_post_policy: false,
        }
    }
}

impl Default for ReplayState {
    fn default() -> Self {
        Self::new()
    }
}
