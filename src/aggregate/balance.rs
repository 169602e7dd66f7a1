//! Running-total queries over a participant's ledger
//!
//! All four queries share the same sign convention: `Outgoing*` kinds store
//! a positive value for an outflow, so the forfeiture field is negated when
//! summed into balance and kept as stored when summed into distributions.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::ledger::{LedgerTransaction, TransactionKind};

/// Current general balance across the full ledger
pub fn current_balance(transactions: &[LedgerTransaction]) -> Decimal {
    transactions
        .iter()
        .map(|tx| {
            if tx.kind.is_net_outflow() {
                -tx.forfeiture_amount + tx.contribution_amount + tx.earnings_amount
            } else {
                tx.contribution_amount + tx.earnings_amount + tx.forfeiture_amount
            }
        })
        .sum()
}

/// Special balance ("ETVA"): QDRO awards plus 100%-vested earnings, less
/// 100%-vested payments
pub fn special_balance(transactions: &[LedgerTransaction]) -> Decimal {
    transactions
        .iter()
        .map(|tx| match tx.kind {
            TransactionKind::IncomingQdroBeneficiary => tx.contribution_amount,
            TransactionKind::Incoming100PctVestedEarnings => tx.earnings_amount,
            TransactionKind::Outgoing100PctVestedPayment => -tx.forfeiture_amount,
            _ => Decimal::ZERO,
        })
        .sum()
}

/// Total distributions: forfeiture-field values across the net-outflow
/// kinds, kept as stored
pub fn total_distributions(transactions: &[LedgerTransaction]) -> Decimal {
    transactions
        .iter()
        .filter(|tx| tx.kind.is_net_outflow())
        .map(|tx| tx.forfeiture_amount)
        .sum()
}

/// Cumulative years-of-service credit.
///
/// Takes the maximum service credit per plan year before summing, so
/// duplicate same-year rows cannot double-count a year.
pub fn years_of_service(transactions: &[LedgerTransaction]) -> Decimal {
    let mut per_year: BTreeMap<i32, Decimal> = BTreeMap::new();
    for tx in transactions {
        let credit = per_year.entry(tx.plan_year).or_insert(Decimal::ZERO);
        if tx.service_credit > *credit {
            *credit = tx.service_credit;
        }
    }
    per_year.values().copied().sum()
}
