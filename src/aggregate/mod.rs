//! Balance and vesting ratio aggregation over a participant's full ledger

mod balance;
mod vesting;

pub use balance::{current_balance, special_balance, total_distributions, years_of_service};
pub use vesting::{vested_balance, vesting_ratio, VestingRatioInput};

use std::collections::HashMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::calendar::FiscalYearBounds;
use crate::ledger::LedgerTransaction;
use crate::participant::{ParticipantFacts, ParticipantYearSnapshot};

/// Per-participant aggregate figures consumed by reporting and
/// distribution services
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantAggregate {
    pub participant_key: u32,

    pub current_balance: Decimal,

    /// Special balance ("ETVA")
    pub special_balance: Decimal,

    pub total_distributions: Decimal,

    pub years_of_service: Decimal,

    /// Non-forfeitable fraction of the balance, 0.0 through 1.0
    pub vesting_ratio: Decimal,

    /// Vesting ratio as a percentage, for statements
    pub vesting_percent: Decimal,

    pub vested_balance: Decimal,
}

/// Aggregate one participant's ledger into the combined figures.
///
/// `transactions` must already be restricted to `plan_year <= target`.
pub fn aggregate_participant(
    facts: &ParticipantFacts,
    snapshot: &ParticipantYearSnapshot,
    transactions: &[LedgerTransaction],
    bounds: FiscalYearBounds,
) -> ParticipantAggregate {
    let current = current_balance(transactions);
    let special = special_balance(transactions);
    let distributions = total_distributions(transactions);
    let service_years = years_of_service(transactions);

    let ratio = vesting_ratio(&VestingRatioInput {
        facts,
        classification: snapshot.classification,
        zero_contribution_reason: snapshot.zero_contribution_reason,
        hours_worked: snapshot.hours_worked,
        years_of_service: service_years,
        bounds,
    });

    ParticipantAggregate {
        participant_key: facts.participant_key,
        current_balance: current,
        special_balance: special,
        total_distributions: distributions,
        years_of_service: service_years,
        vesting_ratio: ratio,
        vesting_percent: ratio * dec!(100),
        vested_balance: vested_balance(current, distributions, special, ratio),
    }
}

/// Aggregate every participant in the facts map.
///
/// Left-join semantics: a participant with no ledger rows or no snapshot
/// gets zero for the missing figures, never an error.
pub fn aggregate_all(
    facts: &HashMap<u32, ParticipantFacts>,
    snapshots: &HashMap<u32, ParticipantYearSnapshot>,
    ledgers: &HashMap<u32, Vec<LedgerTransaction>>,
    bounds: FiscalYearBounds,
) -> Vec<ParticipantAggregate> {
    let empty: Vec<LedgerTransaction> = Vec::new();
    let mut keys: Vec<u32> = facts.keys().copied().collect();
    keys.sort_unstable();

    keys.into_iter()
        .map(|key| {
            let participant = &facts[&key];
            let snapshot = snapshots
                .get(&key)
                .cloned()
                .unwrap_or_else(|| ParticipantYearSnapshot::new(key, 0));
            let transactions = ledgers.get(&key).unwrap_or(&empty);
            aggregate_participant(participant, &snapshot, transactions, bounds)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::participant::EmploymentStatus;
    use chrono::NaiveDate;

    fn bounds() -> FiscalYearBounds {
        FiscalYearBounds {
            begin: NaiveDate::from_ymd_opt(2024, 1, 7).unwrap(),
            end: NaiveDate::from_ymd_opt(2025, 1, 4).unwrap(),
        }
    }

    fn facts(key: u32) -> ParticipantFacts {
        ParticipantFacts {
            participant_key: key,
            birth_date: NaiveDate::from_ymd_opt(1970, 5, 5).unwrap(),
            termination_date: None,
            termination_code: None,
            employment_status: EmploymentStatus::Active,
            beneficiary_only: false,
        }
    }

    #[test]
    fn test_participant_with_no_ledger_rows_aggregates_to_zero() {
        let mut all_facts = HashMap::new();
        all_facts.insert(11, facts(11));
        let snapshots = HashMap::new();
        let ledgers = HashMap::new();

        let results = aggregate_all(&all_facts, &snapshots, &ledgers, bounds());
        assert_eq!(results.len(), 1);

        let agg = &results[0];
        assert_eq!(agg.participant_key, 11);
        assert_eq!(agg.current_balance, Decimal::ZERO);
        assert_eq!(agg.special_balance, Decimal::ZERO);
        assert_eq!(agg.total_distributions, Decimal::ZERO);
        assert_eq!(agg.years_of_service, Decimal::ZERO);
        assert_eq!(agg.vested_balance, Decimal::ZERO);
    }

    #[test]
    fn test_aggregate_all_is_sorted_by_key() {
        let mut all_facts = HashMap::new();
        for key in [42, 7, 19] {
            all_facts.insert(key, facts(key));
        }

        let results = aggregate_all(&all_facts, &HashMap::new(), &HashMap::new(), bounds());
        let keys: Vec<u32> = results.iter().map(|a| a.participant_key).collect();
        assert_eq!(keys, vec![7, 19, 42]);
    }
}
