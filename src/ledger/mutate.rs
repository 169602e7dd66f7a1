//! Forfeiture and reversal mutations against one participant's ledger
//!
//! Both operations are check-then-append: the ledger and snapshot arrive
//! behind exclusive borrows, which is the per-participant serialization
//! unit. Callers running concurrent requests for the same participant must
//! funnel them through a single owner so the reversal-uniqueness check and
//! the append stay atomic.

use chrono::NaiveDate;
use log::warn;
use rust_decimal::Decimal;

use super::{CommentKind, LedgerTransaction, TransactionKind, YearIteration};
use crate::error::EngineError;
use crate::participant::ParticipantYearSnapshot;

/// Append a forfeit (positive `amount`) or un-forfeit (negative `amount`)
/// row and adjust the snapshot.
///
/// The appended row stores `-|amount|` for a forfeit and `+|amount|` for
/// an un-forfeit in its forfeiture field. Forfeiting zeroes the special
/// balance and promotes the classification; the next ledger replay
/// rebuilds the special balance after an un-forfeit.
pub fn apply_forfeiture_adjustment(
    ledger: &mut Vec<LedgerTransaction>,
    snapshot: &mut ParticipantYearSnapshot,
    plan_year: i32,
    amount: Decimal,
    class_action: bool,
    today: NaiveDate,
) -> Result<LedgerTransaction, EngineError> {
    if amount.is_zero() {
        return Err(EngineError::Validation(
            "forfeiture adjustment amount must be non-zero".to_string(),
        ));
    }

    let is_forfeit = amount > Decimal::ZERO;
    let stored_amount = if is_forfeit {
        -amount.abs()
    } else {
        amount.abs()
    };

    let transaction = LedgerTransaction {
        transaction_id: next_transaction_id(ledger),
        participant_key: snapshot.participant_key,
        plan_year,
        year_iteration: if class_action {
            YearIteration::ClassAction
        } else {
            YearIteration::Normal
        },
        kind: TransactionKind::OutgoingForfeiture,
        contribution_amount: Decimal::ZERO,
        earnings_amount: Decimal::ZERO,
        forfeiture_amount: stored_amount,
        service_credit: Decimal::ZERO,
        tax_withheld: Decimal::ZERO,
        zero_contribution_reason: None,
        comment_kind: Some(if is_forfeit {
            CommentKind::Forfeit
        } else {
            CommentKind::Unforfeit
        }),
        reversed_from: None,
        transaction_date: today,
    };

    if is_forfeit {
        let promoted = snapshot.classification.on_forfeit();
        if !promoted.has_forfeiture_records() {
            warn!(
                "participant {} forfeited while classified {:?}; classification reset to {:?}",
                snapshot.participant_key, snapshot.classification, promoted
            );
        }
        snapshot.classification = promoted;
        snapshot.special_balance = Decimal::ZERO;
        snapshot.has_forfeited = true;
    } else {
        snapshot.classification = snapshot.classification.on_unforfeit();
    }

    ledger.push(transaction.clone());
    Ok(transaction)
}

/// Append a reversal of `source_id`, if that row is reversible.
///
/// Returns `Ok(None)` for the kinds the reversal path never touches
/// (contribution, forfeiture, and 100%-vested-earnings rows); reversing
/// an already-reversed row is a conflict, checked before any append.
pub fn reverse_transaction(
    ledger: &mut Vec<LedgerTransaction>,
    snapshot: &mut ParticipantYearSnapshot,
    source_id: u64,
    today: NaiveDate,
) -> Result<Option<LedgerTransaction>, EngineError> {
    let source = ledger
        .iter()
        .find(|tx| tx.transaction_id == source_id)
        .cloned()
        .ok_or(EngineError::NotFound {
            entity: "transaction",
            id: source_id,
        })?;

    if !source.kind.is_reversible() {
        return Ok(None);
    }

    if let Some(existing) = ledger.iter().find(|tx| tx.reversed_from == Some(source_id)) {
        return Err(EngineError::AlreadyReversed {
            source_id,
            reversal_id: existing.transaction_id,
        });
    }

    let comment = if source.comment_kind == Some(CommentKind::Reversal) {
        CommentKind::Unreversal
    } else {
        CommentKind::Reversal
    };

    let reversal = LedgerTransaction {
        transaction_id: next_transaction_id(ledger),
        participant_key: source.participant_key,
        plan_year: source.plan_year,
        year_iteration: source.year_iteration,
        kind: source.kind,
        contribution_amount: -source.contribution_amount,
        earnings_amount: Decimal::ZERO,
        forfeiture_amount: -source.forfeiture_amount,
        service_credit: Decimal::ZERO,
        tax_withheld: -source.tax_withheld,
        zero_contribution_reason: None,
        comment_kind: Some(comment),
        reversed_from: Some(source_id),
        transaction_date: today,
    };

    // QDRO awards and 100%-vested payments flow through the special
    // balance, so their reversals adjust it by the negated net.
    if matches!(
        source.kind,
        TransactionKind::IncomingQdroBeneficiary | TransactionKind::Outgoing100PctVestedPayment
    ) {
        snapshot.special_balance += reversal.contribution_amount + reversal.forfeiture_amount;
    }

    ledger.push(reversal.clone());
    Ok(Some(reversal))
}

fn next_transaction_id(ledger: &[LedgerTransaction]) -> u64 {
    ledger
        .iter()
        .map(|tx| tx.transaction_id)
        .max()
        .unwrap_or(0)
        + 1
}
