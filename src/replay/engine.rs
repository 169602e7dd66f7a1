//! Classification replay engine
//!
//! Folds a participant's ordered transaction sequence into an enrollment
//! classification and a coarse vesting signal. Single participant, single
//! pass, no I/O; callers supply rows pre-sorted by plan year then creation
//! order so the first-row-per-year rule is deterministic.

use rust_decimal::Decimal;

use super::state::ReplayState;
use super::{VestingState, FULL_VESTING_YEARS, POLICY_CHANGE_YEAR, VOID_ANOMALY_YEAR};
use crate::ledger::{CommentKind, LedgerTransaction, TransactionKind, YearIteration};
use crate::participant::{
    ClassificationCode, ParticipantFacts, ParticipantYearSnapshot, ZeroContributionReason,
};

/// Inputs for one classification replay
#[derive(Debug, Clone)]
pub struct ReplayInput<'a> {
    /// Prior-year snapshot; only its zero-contribution reason feeds the
    /// fully-vested override
    pub prior_snapshot: &'a ParticipantYearSnapshot,

    pub facts: &'a ParticipantFacts,

    /// Cumulative years-of-service credit from the aggregator
    pub years_of_service: Decimal,

    pub target_year: i32,

    /// One participant's rows, already restricted to `plan_year <=
    /// target_year` and sorted by (plan_year, creation order)
    pub transactions: &'a [LedgerTransaction],
}

/// Result of a classification replay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayOutcome {
    pub classification: ClassificationCode,

    /// `None` when the ledger was empty: vesting state is left untouched
    pub vesting: Option<VestingState>,
}

/// Replay a participant's ledger into a classification and vesting signal.
///
/// Pure and idempotent: identical inputs always produce identical outcomes.
/// Malformed rows never raise; unknown reason codes act as `Normal`.
pub fn compute_classification(input: &ReplayInput) -> ReplayOutcome {
    use ClassificationCode::*;

    if input.transactions.is_empty() {
        return ReplayOutcome {
            classification: NotEnrolled,
            vesting: None,
        };
    }

    // Settlement credits available to offset class-action forfeitures.
    let settlement_credit: Decimal = input
        .transactions
        .iter()
        .filter(|tx| tx.plan_year <= input.target_year)
        .filter(|tx| {
            tx.is_class_action() || tx.kind == TransactionKind::Incoming100PctVestedEarnings
        })
        .map(|tx| tx.earnings_amount)
        .sum();

    let mut state = ReplayState::new();

    for tx in input.transactions {
        // Defensive guard; inputs should already be filtered.
        if tx.plan_year > input.target_year {
            continue;
        }

        fold_transaction(&mut state, tx, settlement_credit);
    }

    let vesting = resolve_vesting(&state, input);

    let mut classification = state.classification;
    if state.saw_post_policy_contribution && classification == OldPlanHasContributions {
        classification = NewPlanHasContributions;
    }
    if vesting != VestingState::NotVested {
        if !state.accumulated_forfeiture.is_zero() && state.forfeiture_is_post_policy {
            classification = OldPlanHasForfeitureRecords;
        }
        if state.saw_post_policy_contribution {
            classification = match classification {
                OldPlanHasContributions => NewPlanHasContributions,
                OldPlanHasForfeitureRecords => NewPlanHasForfeitureRecords,
                other => other,
            };
        }
    }

    ReplayOutcome {
        classification,
        vesting: Some(vesting),
    }
}

/// Fold one transaction into the replay state
fn fold_transaction(state: &mut ReplayState, tx: &LedgerTransaction, settlement_credit: Decimal) {
    use ClassificationCode::*;

    // Single set-point for the sticky post-change flag: any contribution
    // in a post-change year except a QDRO award.
    if tx.contribution_amount > Decimal::ZERO
        && tx.plan_year >= POLICY_CHANGE_YEAR
        && tx.kind != TransactionKind::IncomingQdroBeneficiary
    {
        state.saw_post_policy_contribution = true;
    }

    // The 2003 void cleanup left code-8 rows that mark legacy forfeiture
    // history regardless of anything else in the ledger.
    if tx.plan_year == VOID_ANOMALY_YEAR && tx.kind == TransactionKind::Outgoing100PctVestedPayment
    {
        state.saw_void_anomaly_2003 = true;
        state.classification = OldPlanHasForfeitureRecords;
    }

    match tx.kind {
        TransactionKind::OutgoingForfeiture => {
            if tx.plan_year > POLICY_CHANGE_YEAR - 1 {
                state.forfeiture_is_post_policy = -tx.forfeiture_amount < Decimal::ZERO;
            }
            // Class-action forfeitures fully covered by settlement credits
            // never count against the participant.
            let offset = tx.is_class_action() && tx.forfeiture_amount.abs() <= settlement_credit;
            if !offset {
                state.accumulated_forfeiture += -tx.forfeiture_amount;
            }
        }
        TransactionKind::IncomingContribution => {
            count_contribution_year(state, tx);
        }
        _ => {}
    }
}

/// Count-this-year rule for a contribution row
fn count_contribution_year(state: &mut ReplayState, tx: &LedgerTransaction) {
    use ClassificationCode::*;

    match tx.year_iteration {
        YearIteration::Military => {
            if tx.comment_kind == Some(CommentKind::Military) {
                state.classification = OldPlanHasContributions;
                state.last_year_counted = Some(tx.plan_year);
                if tx.plan_year > POLICY_CHANGE_YEAR {
                    state.saw_post_policy_contribution = true;
                }
            }
        }
        // Settlement rows never count as contribution years.
        YearIteration::ClassAction => {}
        YearIteration::Normal | YearIteration::Administrative => {
            // First row per plan year wins; later same-year rows are no-ops.
            if state.last_year_examined == Some(tx.plan_year) {
                return;
            }
            state.last_year_examined = Some(tx.plan_year);

            let reason = tx
                .zero_contribution_reason
                .unwrap_or(ZeroContributionReason::Normal);
            let counts = !tx.contribution_amount.is_zero()
                || counts_without_contribution(reason, tx.comment_kind);
            if !counts {
                return;
            }

            state.classification = OldPlanHasContributions;
            state.last_year_counted = Some(tx.plan_year);
            if state.saw_void_anomaly_2003 {
                state.classification = OldPlanHasForfeitureRecords;
            }
            if tx.plan_year >= POLICY_CHANGE_YEAR && tx.contribution_amount > Decimal::ZERO {
                state.classification = NewPlanHasContributions;
            }
        }
    }
}

/// Historical reason codes that let a zero-contribution year count
fn counts_without_contribution(
    reason: ZeroContributionReason,
    comment: Option<CommentKind>,
) -> bool {
    match reason {
        ZeroContributionReason::TerminatedOver1000HoursGetsYearVested => true,
        ZeroContributionReason::VestingServiceOnly => comment == Some(CommentKind::VOnly),
        ZeroContributionReason::SixtyFivePlusFullyVested => true,
        ZeroContributionReason::SixtyFourFullyVestedOnBirthday => true,
        _ => false,
    }
}

/// Vesting signal from service years plus the forced overrides
fn resolve_vesting(state: &ReplayState, input: &ReplayInput) -> VestingState {
    use ClassificationCode::*;

    // Pre-change participants lose one year: the first plan year did not
    // vest under the old schedule.
    let mut effective_years = input.years_of_service;
    if !state.saw_post_policy_contribution {
        effective_years -= Decimal::ONE;
    }

    let mut vesting = if effective_years <= Decimal::ZERO {
        VestingState::NotVested
    } else if effective_years <= Decimal::from(FULL_VESTING_YEARS) {
        VestingState::PartiallyVested
    } else {
        VestingState::FullyVested
    };

    if state.classification == OldPlanHasForfeitureRecords {
        vesting = VestingState::PartiallyVested;
    }

    if input.prior_snapshot.zero_contribution_reason
        == ZeroContributionReason::SixtyFivePlusFullyVested
        || input.facts.is_deceased()
    {
        vesting = VestingState::FullyVested;
    }

    vesting
}
