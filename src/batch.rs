//! Batch year-end close across participants
//!
//! Each participant's close is an independent pure computation over that
//! participant's rows, so the batch is a parallel map with no shared
//! mutable state. One participant's failure never aborts the run; results
//! come back as per-participant `Result`s.

use chrono::NaiveDate;
use log::debug;
use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::aggregate::{self, ParticipantAggregate};
use crate::calendar::PlanCalendar;
use crate::error::EngineError;
use crate::ledger::{LedgerTransaction, TransactionKind};
use crate::participant::{ClassificationCode, ParticipantFacts, ParticipantYearSnapshot};
use crate::replay::{compute_classification, ReplayInput, ReplayOutcome, VestingState};
use crate::yearend::{compute_year_end_change, YearEndChange, YearEndInput};

/// Configuration for a year-end close run
#[derive(Debug, Clone, Copy)]
pub struct CloseConfig {
    /// Plan year being closed
    pub plan_year: i32,

    /// Run date stamped onto certificates
    pub today: NaiveDate,
}

/// Everything the close needs for one participant
#[derive(Debug, Clone)]
pub struct ParticipantCase {
    pub facts: ParticipantFacts,

    pub prior_snapshot: ParticipantYearSnapshot,

    /// Rows sorted by (plan year, transaction id); rows past the close
    /// year are tolerated and ignored
    pub transactions: Vec<LedgerTransaction>,
}

/// Output of one participant's close
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantCloseResult {
    pub participant_key: u32,

    pub classification: ClassificationCode,

    pub vesting: Option<VestingState>,

    /// Snapshot with the close applied
    pub snapshot: ParticipantYearSnapshot,

    pub aggregate: ParticipantAggregate,

    pub year_end: YearEndChange,
}

/// Runs the year-end close for one plan year
#[derive(Debug, Clone)]
pub struct CloseRunner {
    calendar: PlanCalendar,
    config: CloseConfig,
}

impl CloseRunner {
    pub fn new(calendar: PlanCalendar, config: CloseConfig) -> Self {
        Self { calendar, config }
    }

    /// Close one participant: replay the ledger, aggregate balances, then
    /// apply the year-end policy deltas to the snapshot.
    pub fn close_participant(
        &self,
        case: &ParticipantCase,
    ) -> Result<ParticipantCloseResult, EngineError> {
        if case.facts.participant_key != case.prior_snapshot.participant_key {
            return Err(EngineError::Validation(format!(
                "facts are for participant {} but snapshot is for participant {}",
                case.facts.participant_key, case.prior_snapshot.participant_key
            )));
        }

        let bounds = self.calendar.fiscal_year_bounds(self.config.plan_year)?;

        let transactions: Vec<LedgerTransaction> = case
            .transactions
            .iter()
            .filter(|tx| tx.plan_year <= self.config.plan_year)
            .cloned()
            .collect();

        let years_of_service = aggregate::years_of_service(&transactions);

        let outcome: ReplayOutcome = compute_classification(&ReplayInput {
            prior_snapshot: &case.prior_snapshot,
            facts: &case.facts,
            years_of_service,
            target_year: self.config.plan_year,
            transactions: &transactions,
        });

        let mut snapshot = case.prior_snapshot.clone();
        snapshot.plan_year = self.config.plan_year;
        snapshot.classification = outcome.classification;
        if let Some(vesting) = outcome.vesting {
            snapshot.vesting_schedule_flag = vesting != VestingState::NotVested;
        }

        let aggregate =
            aggregate::aggregate_participant(&case.facts, &snapshot, &transactions, bounds);
        snapshot.special_balance = aggregate.special_balance;

        let year_end = compute_year_end_change(&YearEndInput {
            plan_year: self.config.plan_year,
            first_contribution_year: first_contribution_year(&transactions),
            age: case.facts.age_on(bounds.end),
            current_balance: aggregate.current_balance,
            snapshot: &snapshot,
            facts: &case.facts,
            fiscal_year_end: bounds.end,
            today: self.config.today,
        });
        snapshot.zero_contribution_reason = year_end.zero_contribution_reason;

        debug!(
            "closed participant {}: classification {:?}, vested balance {}",
            case.facts.participant_key, snapshot.classification, aggregate.vested_balance
        );

        Ok(ParticipantCloseResult {
            participant_key: case.facts.participant_key,
            classification: outcome.classification,
            vesting: outcome.vesting,
            snapshot,
            aggregate,
            year_end,
        })
    }

    /// Close every participant in parallel.
    ///
    /// Results are index-aligned with `cases`; failed participants carry
    /// their error in place.
    pub fn close_all(
        &self,
        cases: &[ParticipantCase],
    ) -> Vec<Result<ParticipantCloseResult, EngineError>> {
        cases
            .par_iter()
            .map(|case| self.close_participant(case))
            .collect()
    }
}

/// Earliest plan year with a real contribution
fn first_contribution_year(transactions: &[LedgerTransaction]) -> Option<i32> {
    transactions
        .iter()
        .filter(|tx| {
            tx.kind == TransactionKind::IncomingContribution
                && tx.contribution_amount > Decimal::ZERO
        })
        .map(|tx| tx.plan_year)
        .min()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::YearIteration;
    use crate::participant::EmploymentStatus;
    use rust_decimal_macros::dec;

    fn runner() -> CloseRunner {
        CloseRunner::new(
            PlanCalendar::with_latest_year(2030),
            CloseConfig {
                plan_year: 2024,
                today: NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
            },
        )
    }

    fn contribution(id: u64, key: u32, plan_year: i32, amount: Decimal) -> LedgerTransaction {
        LedgerTransaction {
            transaction_id: id,
            participant_key: key,
            plan_year,
            year_iteration: YearIteration::Normal,
            kind: TransactionKind::IncomingContribution,
            contribution_amount: amount,
            earnings_amount: Decimal::ZERO,
            forfeiture_amount: Decimal::ZERO,
            service_credit: Decimal::ONE,
            tax_withheld: Decimal::ZERO,
            zero_contribution_reason: None,
            comment_kind: None,
            reversed_from: None,
            transaction_date: NaiveDate::from_ymd_opt(plan_year, 12, 15).unwrap(),
        }
    }

    fn case(key: u32) -> ParticipantCase {
        let mut snapshot = ParticipantYearSnapshot::new(key, 2023);
        snapshot.hours_worked = 1600;
        snapshot.income = dec!(48000);
        ParticipantCase {
            facts: ParticipantFacts {
                participant_key: key,
                birth_date: NaiveDate::from_ymd_opt(1975, 9, 12).unwrap(),
                termination_date: None,
                termination_code: None,
                employment_status: EmploymentStatus::Active,
                beneficiary_only: false,
            },
            prior_snapshot: snapshot,
            transactions: (0..4)
                .map(|i| contribution(i + 1, key, 2020 + i as i32, dec!(1000)))
                .collect(),
        }
    }

    #[test]
    fn test_close_participant_end_to_end() {
        let result = runner().close_participant(&case(5)).unwrap();

        assert_eq!(
            result.classification,
            ClassificationCode::NewPlanHasContributions
        );
        assert_eq!(result.vesting, Some(VestingState::PartiallyVested));
        assert_eq!(result.aggregate.current_balance, dec!(4000));
        assert_eq!(result.aggregate.years_of_service, dec!(4));
        // 48000 / 100, active and under 64
        assert_eq!(result.year_end.earned_points, dec!(480));
        assert!(!result.year_end.is_new_enrollee);
    }

    #[test]
    fn test_close_all_isolates_failures() {
        let good = case(1);
        let mut mismatched = case(2);
        mismatched.prior_snapshot.participant_key = 99;
        let also_good = case(3);

        let results = runner().close_all(&[good, mismatched, also_good]);
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(EngineError::Validation(_))));
        assert!(results[2].is_ok());
    }

    #[test]
    fn test_close_rejects_out_of_range_year() {
        let runner = CloseRunner::new(
            PlanCalendar::with_latest_year(2030),
            CloseConfig {
                plan_year: 1998,
                today: NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
            },
        );
        let result = runner.close_participant(&case(1));
        assert!(matches!(
            result,
            Err(EngineError::PlanYearOutOfRange { plan_year: 1998, .. })
        ));
    }
}
