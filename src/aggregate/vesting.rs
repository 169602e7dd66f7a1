//! Vesting ratio and vested balance
//!
//! The ratio is the non-forfeitable fraction of a participant's balance.
//! A handful of situations vest at 100% outright; everything else scores
//! on classification, hours, and service years.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::calendar::FiscalYearBounds;
use crate::participant::{
    ClassificationCode, ParticipantFacts, ZeroContributionReason, MINIMUM_HOURS_THRESHOLD,
    RETIREMENT_AGE,
};

/// Inputs for one participant's vesting ratio
#[derive(Debug, Clone)]
pub struct VestingRatioInput<'a> {
    pub facts: &'a ParticipantFacts,

    pub classification: ClassificationCode,

    pub zero_contribution_reason: ZeroContributionReason,

    pub hours_worked: u32,

    pub years_of_service: Decimal,

    /// Fiscal bounds of the year being valued; age is taken as of the end
    pub bounds: FiscalYearBounds,
}

/// Non-forfeitable fraction of the balance, 0.0 through 1.0
pub fn vesting_ratio(input: &VestingRatioInput) -> Decimal {
    let facts = input.facts;

    // Beneficiary records with no employee of their own hold money already
    // vested by the source participant.
    if facts.beneficiary_only {
        return Decimal::ONE;
    }

    let age = facts.age_on(input.bounds.end);
    let retired_in_service = facts
        .termination_date
        .map_or(true, |d| d < input.bounds.begin);
    if age >= RETIREMENT_AGE && retired_in_service {
        return Decimal::ONE;
    }

    if input.classification.has_forfeiture_records() {
        return Decimal::ONE;
    }

    if facts.is_deceased() {
        return Decimal::ONE;
    }

    if input.zero_contribution_reason == ZeroContributionReason::SixtyFivePlusFullyVested {
        return Decimal::ONE;
    }

    let mut score = input.years_of_service;
    if input.classification == ClassificationCode::NewPlanHasContributions {
        score += Decimal::ONE;
    }
    if input.hours_worked >= MINIMUM_HOURS_THRESHOLD {
        score += Decimal::ONE;
    }

    if score < dec!(3) {
        Decimal::ZERO
    } else if score < dec!(4) {
        dec!(0.2)
    } else if score < dec!(5) {
        dec!(0.4)
    } else if score < dec!(6) {
        dec!(0.6)
    } else if score <= dec!(6) {
        dec!(0.8)
    } else {
        Decimal::ONE
    }
}

/// Combine the aggregate figures into the single vested-balance number.
///
/// The special balance and past distributions are always the
/// participant's; only the remainder is subject to the ratio.
pub fn vested_balance(
    current_balance: Decimal,
    total_distributions: Decimal,
    special_balance: Decimal,
    ratio: Decimal,
) -> Decimal {
    ((current_balance + total_distributions - special_balance) * ratio) + special_balance
        - total_distributions
}
