//! Year-end policy calculator
//!
//! Computes the year-end deltas for one participant: new-enrollee flag,
//! zero-contribution reason, earned points, and certificate date. Branches
//! on age and termination status but never replays the ledger; balances
//! come in from the aggregator.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::participant::{
    ParticipantFacts, ParticipantYearSnapshot, ZeroContributionReason, MINIMUM_ENROLLMENT_AGE,
    MINIMUM_HOURS_THRESHOLD, PRE_RETIREMENT_AGE, RETIREMENT_AGE,
};

/// Income divisor for point awards: one point per $100 of compensation
const POINTS_DIVISOR: Decimal = dec!(100);

/// Years since first contribution required for the 65+ full-vesting reason
const FULL_VESTING_WAIT_YEARS: i32 = 5;

/// Inputs for one participant's year-end calculation
#[derive(Debug, Clone)]
pub struct YearEndInput<'a> {
    pub plan_year: i32,

    /// Earliest plan year with a real contribution, if any
    pub first_contribution_year: Option<i32>,

    /// Age as of the fiscal year end
    pub age: u8,

    /// Current balance from the aggregator
    pub current_balance: Decimal,

    pub snapshot: &'a ParticipantYearSnapshot,

    pub facts: &'a ParticipantFacts,

    pub fiscal_year_end: NaiveDate,

    /// Run date stamped onto any issued certificate
    pub today: NaiveDate,
}

/// Year-end deltas applied to a participant's snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearEndChange {
    /// Participant enrolled for the first time this year
    pub is_new_enrollee: bool,

    pub zero_contribution_reason: ZeroContributionReason,

    pub earned_points: Decimal,

    /// Set when points were awarded
    pub certificate_issue_date: Option<NaiveDate>,
}

/// Compute the year-end change for one participant.
///
/// Branches are mutually exclusive and evaluated in priority order:
/// under-21, terminated by fiscal year end, age 64+, then active under 64.
pub fn compute_year_end_change(input: &YearEndInput) -> YearEndChange {
    if input.age < MINIMUM_ENROLLMENT_AGE {
        return YearEndChange {
            is_new_enrollee: input.first_contribution_year.is_none(),
            zero_contribution_reason: ZeroContributionReason::Under21WithOver1KHours,
            earned_points: Decimal::ZERO,
            certificate_issue_date: None,
        };
    }

    if input.facts.terminated_on_or_before(input.fiscal_year_end) {
        let reason = if input.snapshot.hours_worked >= MINIMUM_HOURS_THRESHOLD {
            ZeroContributionReason::TerminatedOver1000HoursGetsYearVested
        } else {
            ZeroContributionReason::Normal
        };
        if input.age < PRE_RETIREMENT_AGE {
            return YearEndChange {
                is_new_enrollee: false,
                zero_contribution_reason: reason,
                earned_points: Decimal::ZERO,
                certificate_issue_date: None,
            };
        }
        // Terminated 64+: the age-based reason refinement still applies,
        // but no points accrue and the enrollee flag stays cleared.
        return YearEndChange {
            is_new_enrollee: false,
            zero_contribution_reason: refine_reason_for_64_plus(input, reason),
            earned_points: Decimal::ZERO,
            certificate_issue_date: None,
        };
    }

    if input.age >= PRE_RETIREMENT_AGE {
        let earned_points = if input.snapshot.hours_worked < MINIMUM_HOURS_THRESHOLD {
            Decimal::ZERO
        } else {
            points_from_income(input.snapshot.income)
        };
        return YearEndChange {
            is_new_enrollee: input.first_contribution_year.is_none(),
            zero_contribution_reason: refine_reason_for_64_plus(
                input,
                input.snapshot.zero_contribution_reason,
            ),
            earned_points,
            certificate_issue_date: certificate_date(earned_points, input.today),
        };
    }

    // Active, under 64: points accrue without the hours gate.
    let earned_points = points_from_income(input.snapshot.income);
    YearEndChange {
        is_new_enrollee: input.first_contribution_year.is_none(),
        zero_contribution_reason: ZeroContributionReason::Normal,
        earned_points,
        certificate_issue_date: certificate_date(earned_points, input.today),
    }
}

/// One point per $100 of income, rounded half away from zero
fn points_from_income(income: Decimal) -> Decimal {
    (income / POINTS_DIVISOR).round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

fn certificate_date(points: Decimal, today: NaiveDate) -> Option<NaiveDate> {
    (points > Decimal::ZERO).then_some(today)
}

/// Age-64+ reason refinement shared by the terminated and active branches.
///
/// The snapshot's existing reason outranks the branch reason when it is an
/// age-based full-vesting code; the retired codes 3 and 4 reset to Normal.
/// The years-since-first-contribution rules then award the full-vesting
/// reasons for 65-year-olds past the wait and 64-year-olds on the birthday
/// rule.
fn refine_reason_for_64_plus(
    input: &YearEndInput,
    base: ZeroContributionReason,
) -> ZeroContributionReason {
    let existing = input.snapshot.zero_contribution_reason;
    let full_vesting_code = ZeroContributionReason::SixtyFivePlusFullyVested.code();

    let candidate = if existing.code() >= full_vesting_code {
        existing
    } else if (3..=5).contains(&existing.code()) {
        ZeroContributionReason::Normal
    } else {
        base
    };

    let first_year = input.first_contribution_year.unwrap_or(input.plan_year);
    let mut years_since_first = input.plan_year - first_year;
    if input.current_balance > Decimal::ZERO {
        years_since_first += 1;
    }

    if years_since_first >= FULL_VESTING_WAIT_YEARS && input.age >= RETIREMENT_AGE {
        ZeroContributionReason::SixtyFivePlusFullyVested
    } else if (years_since_first == FULL_VESTING_WAIT_YEARS - 1 && input.age >= RETIREMENT_AGE)
        || (years_since_first >= FULL_VESTING_WAIT_YEARS - 1 && input.age == PRE_RETIREMENT_AGE)
    {
        ZeroContributionReason::SixtyFourFullyVestedOnBirthday
    } else {
        candidate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::participant::{EmploymentStatus, TerminationCode};
    use rust_decimal_macros::dec;

    fn facts() -> ParticipantFacts {
        ParticipantFacts {
            participant_key: 9,
            birth_date: NaiveDate::from_ymd_opt(1960, 1, 10).unwrap(),
            termination_date: None,
            termination_code: None,
            employment_status: EmploymentStatus::Active,
            beneficiary_only: false,
        }
    }

    fn input_for<'a>(
        age: u8,
        snapshot: &'a ParticipantYearSnapshot,
        facts: &'a ParticipantFacts,
    ) -> YearEndInput<'a> {
        YearEndInput {
            plan_year: 2024,
            first_contribution_year: Some(2015),
            age,
            current_balance: dec!(50000),
            snapshot,
            facts,
            fiscal_year_end: NaiveDate::from_ymd_opt(2025, 1, 4).unwrap(),
            today: NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
        }
    }

    #[test]
    fn test_under_21_branch() {
        let snapshot = ParticipantYearSnapshot::new(9, 2024);
        let f = facts();
        let mut input = input_for(20, &snapshot, &f);
        input.first_contribution_year = None;

        let change = compute_year_end_change(&input);
        assert!(change.is_new_enrollee);
        assert_eq!(
            change.zero_contribution_reason,
            ZeroContributionReason::Under21WithOver1KHours
        );
        assert_eq!(change.earned_points, Decimal::ZERO);
        assert_eq!(change.certificate_issue_date, None);
    }

    #[test]
    fn test_terminated_under_64_with_hours_gets_year_vested() {
        let mut snapshot = ParticipantYearSnapshot::new(9, 2024);
        snapshot.hours_worked = 1200;
        let mut f = facts();
        f.termination_date = NaiveDate::from_ymd_opt(2024, 10, 3);
        f.termination_code = Some(TerminationCode::Resigned);

        let change = compute_year_end_change(&input_for(55, &snapshot, &f));
        assert!(!change.is_new_enrollee);
        assert_eq!(
            change.zero_contribution_reason,
            ZeroContributionReason::TerminatedOver1000HoursGetsYearVested
        );
        assert_eq!(change.earned_points, Decimal::ZERO);
    }

    #[test]
    fn test_terminated_under_64_without_hours_is_normal() {
        let mut snapshot = ParticipantYearSnapshot::new(9, 2024);
        snapshot.hours_worked = 400;
        let mut f = facts();
        f.termination_date = NaiveDate::from_ymd_opt(2024, 3, 3);

        let change = compute_year_end_change(&input_for(55, &snapshot, &f));
        assert_eq!(
            change.zero_contribution_reason,
            ZeroContributionReason::Normal
        );
    }

    #[test]
    fn test_terminated_65_gets_full_vesting_reason_but_no_points() {
        let mut snapshot = ParticipantYearSnapshot::new(9, 2024);
        snapshot.hours_worked = 1500;
        snapshot.income = dec!(42000);
        let mut f = facts();
        f.termination_date = NaiveDate::from_ymd_opt(2024, 11, 14);

        // First contribution 2015, balance positive: ten years since first.
        let change = compute_year_end_change(&input_for(65, &snapshot, &f));
        assert!(!change.is_new_enrollee);
        assert_eq!(
            change.zero_contribution_reason,
            ZeroContributionReason::SixtyFivePlusFullyVested
        );
        assert_eq!(change.earned_points, Decimal::ZERO);
        assert_eq!(change.certificate_issue_date, None);
    }

    #[test]
    fn test_active_64_plus_points_are_hours_gated() {
        let mut snapshot = ParticipantYearSnapshot::new(9, 2024);
        snapshot.hours_worked = 900;
        snapshot.income = dec!(38000);
        let f = facts();

        let change = compute_year_end_change(&input_for(66, &snapshot, &f));
        assert_eq!(change.earned_points, Decimal::ZERO);
        assert_eq!(change.certificate_issue_date, None);

        snapshot.hours_worked = 1100;
        let change = compute_year_end_change(&input_for(66, &snapshot, &f));
        assert_eq!(change.earned_points, dec!(380));
        assert_eq!(
            change.certificate_issue_date,
            Some(NaiveDate::from_ymd_opt(2025, 1, 6).unwrap())
        );
    }

    #[test]
    fn test_points_round_half_away_from_zero() {
        assert_eq!(points_from_income(dec!(12345.67)), dec!(123));
        assert_eq!(points_from_income(dec!(15050)), dec!(151));
        assert_eq!(points_from_income(dec!(15049.99)), dec!(150));
        assert_eq!(points_from_income(dec!(0)), dec!(0));
    }

    #[test]
    fn test_active_under_64_points_without_hours_gate() {
        let mut snapshot = ParticipantYearSnapshot::new(9, 2024);
        snapshot.hours_worked = 200;
        snapshot.income = dec!(21000);
        let f = facts();

        let change = compute_year_end_change(&input_for(45, &snapshot, &f));
        assert_eq!(change.earned_points, dec!(210));
        assert_eq!(
            change.zero_contribution_reason,
            ZeroContributionReason::Normal
        );
        assert!(change.certificate_issue_date.is_some());
    }

    #[test]
    fn test_new_enrollee_requires_no_prior_contribution() {
        let snapshot = ParticipantYearSnapshot::new(9, 2024);
        let f = facts();
        let mut input = input_for(45, &snapshot, &f);
        input.first_contribution_year = None;
        assert!(compute_year_end_change(&input).is_new_enrollee);

        input.first_contribution_year = Some(2020);
        assert!(!compute_year_end_change(&input).is_new_enrollee);
    }

    #[test]
    fn test_refinement_preserves_existing_full_vesting_reason() {
        let mut snapshot = ParticipantYearSnapshot::new(9, 2024);
        snapshot.zero_contribution_reason = ZeroContributionReason::SixtyFivePlusFullyVested;
        snapshot.hours_worked = 1500;
        snapshot.income = dec!(30000);
        let f = facts();

        // Recent first contribution: years rule does not fire; the existing
        // reason survives.
        let mut input = input_for(66, &snapshot, &f);
        input.first_contribution_year = Some(2023);
        input.current_balance = dec!(0);

        let change = compute_year_end_change(&input);
        assert_eq!(
            change.zero_contribution_reason,
            ZeroContributionReason::SixtyFivePlusFullyVested
        );
    }

    #[test]
    fn test_refinement_resets_retired_codes() {
        let mut snapshot = ParticipantYearSnapshot::new(9, 2024);
        snapshot.zero_contribution_reason = ZeroContributionReason::VestingServiceOnly;
        snapshot.hours_worked = 1500;
        snapshot.income = dec!(30000);
        let f = facts();

        let mut input = input_for(66, &snapshot, &f);
        input.first_contribution_year = Some(2023);
        input.current_balance = dec!(0);

        let change = compute_year_end_change(&input);
        assert_eq!(
            change.zero_contribution_reason,
            ZeroContributionReason::Normal
        );
    }

    #[test]
    fn test_sixty_five_with_five_year_wait_fully_vests() {
        let snapshot = ParticipantYearSnapshot::new(9, 2024);
        let f = facts();
        let mut input = input_for(65, &snapshot, &f);
        input.snapshot = &snapshot;
        input.first_contribution_year = Some(2020);
        input.current_balance = dec!(100);
        // 2024 - 2020 = 4, plus 1 for the positive balance.

        let change = compute_year_end_change(&input);
        assert_eq!(
            change.zero_contribution_reason,
            ZeroContributionReason::SixtyFivePlusFullyVested
        );
    }

    #[test]
    fn test_sixty_four_birthday_rule() {
        let snapshot = ParticipantYearSnapshot::new(9, 2024);
        let f = facts();
        let mut input = input_for(64, &snapshot, &f);
        input.first_contribution_year = Some(2019);
        input.current_balance = dec!(0);
        // Five years since first contribution at exactly age 64.

        let change = compute_year_end_change(&input);
        assert_eq!(
            change.zero_contribution_reason,
            ZeroContributionReason::SixtyFourFullyVestedOnBirthday
        );
    }

    #[test]
    fn test_sixty_five_with_exactly_four_years_gets_birthday_reason() {
        let snapshot = ParticipantYearSnapshot::new(9, 2024);
        let f = facts();
        let mut input = input_for(65, &snapshot, &f);
        input.first_contribution_year = Some(2020);
        input.current_balance = dec!(0);
        // 2024 - 2020 = 4 exactly, age 65.

        let change = compute_year_end_change(&input);
        assert_eq!(
            change.zero_contribution_reason,
            ZeroContributionReason::SixtyFourFullyVestedOnBirthday
        );
    }
}
