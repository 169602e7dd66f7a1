//! Ledger transaction entity matching the plan's transaction record layout

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::participant::ZeroContributionReason;

/// Transaction kind.
///
/// Sign convention: stored amounts are positive inflows, except that the
/// `Outgoing*` kinds store a positive value for an outflow. The balance
/// aggregation negates the forfeiture field for those kinds.
///
/// The numeric values are the legacy transaction codes; they survive only
/// as the persistence-boundary mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    /// Annual employer contribution (code 1)
    IncomingContribution,
    /// Partial withdrawal paid out (code 2)
    OutgoingPartialWithdrawal,
    /// Forfeiture of non-vested balance (code 3)
    OutgoingForfeiture,
    /// Direct payment to the participant (code 4)
    OutgoingDirectPayment,
    /// QDRO award received from another participant's account (code 5)
    IncomingQdroBeneficiary,
    /// Transfer out to a beneficiary account (code 6)
    OutgoingXferBeneficiary,
    /// Earnings credited at 100% vesting (code 7)
    Incoming100PctVestedEarnings,
    /// Payment drawn from the 100%-vested sub-balance (code 8)
    Outgoing100PctVestedPayment,
}

impl TransactionKind {
    /// Map a stored numeric code to a kind, or `None` for an unknown code.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(TransactionKind::IncomingContribution),
            2 => Some(TransactionKind::OutgoingPartialWithdrawal),
            3 => Some(TransactionKind::OutgoingForfeiture),
            4 => Some(TransactionKind::OutgoingDirectPayment),
            5 => Some(TransactionKind::IncomingQdroBeneficiary),
            6 => Some(TransactionKind::OutgoingXferBeneficiary),
            7 => Some(TransactionKind::Incoming100PctVestedEarnings),
            8 => Some(TransactionKind::Outgoing100PctVestedPayment),
            _ => None,
        }
    }

    /// Stored numeric code
    pub fn code(&self) -> u8 {
        match self {
            TransactionKind::IncomingContribution => 1,
            TransactionKind::OutgoingPartialWithdrawal => 2,
            TransactionKind::OutgoingForfeiture => 3,
            TransactionKind::OutgoingDirectPayment => 4,
            TransactionKind::IncomingQdroBeneficiary => 5,
            TransactionKind::OutgoingXferBeneficiary => 6,
            TransactionKind::Incoming100PctVestedEarnings => 7,
            TransactionKind::Outgoing100PctVestedPayment => 8,
        }
    }

    /// Kinds whose forfeiture field is negated when summed into balance
    /// and whose stored value counts as a distribution.
    pub fn is_net_outflow(&self) -> bool {
        matches!(
            self,
            TransactionKind::OutgoingPartialWithdrawal
                | TransactionKind::OutgoingForfeiture
                | TransactionKind::OutgoingDirectPayment
                | TransactionKind::OutgoingXferBeneficiary
                | TransactionKind::Outgoing100PctVestedPayment
        )
    }

    /// Kinds that the reversal path never touches. Requests to reverse
    /// these are skipped, not rejected; reporting depends on the rows
    /// staying unique per year.
    pub fn is_reversible(&self) -> bool {
        !matches!(
            self,
            TransactionKind::IncomingContribution
                | TransactionKind::OutgoingForfeiture
                | TransactionKind::Incoming100PctVestedEarnings
        )
    }
}

/// Sub-ledger a row belongs to within its plan year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum YearIteration {
    /// Regular plan-year row (iteration 0)
    Normal,
    /// Military make-up contribution (iteration 1)
    Military,
    /// Class-action settlement row (iteration 2)
    ClassAction,
    /// Administrative correction (iteration 3)
    Administrative,
}

impl YearIteration {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(YearIteration::Normal),
            1 => Some(YearIteration::Military),
            2 => Some(YearIteration::ClassAction),
            3 => Some(YearIteration::Administrative),
            _ => None,
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            YearIteration::Normal => 0,
            YearIteration::Military => 1,
            YearIteration::ClassAction => 2,
            YearIteration::Administrative => 3,
        }
    }
}

/// Free-form comment tag carried on a ledger row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommentKind {
    Military,
    ClassAction,
    VOnly,
    Forfeit,
    Unforfeit,
    Reversal,
    Unreversal,
}

/// One profit/forfeiture/distribution event for a participant in a plan year.
///
/// Append-only: rows are never mutated once persisted. A reversal appends a
/// new row carrying `reversed_from`; at most one reversal may reference a
/// given source id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerTransaction {
    pub transaction_id: u64,

    /// Ledger identity, stable across demographic changes
    pub participant_key: u32,

    pub plan_year: i32,

    pub year_iteration: YearIteration,

    pub kind: TransactionKind,

    pub contribution_amount: Decimal,

    pub earnings_amount: Decimal,

    pub forfeiture_amount: Decimal,

    /// Service credit earned by this row's plan year, aggregated per year
    /// by maximum so duplicate rows cannot double-count
    pub service_credit: Decimal,

    pub tax_withheld: Decimal,

    /// Reason code explaining a zero contribution, when one applies
    pub zero_contribution_reason: Option<ZeroContributionReason>,

    pub comment_kind: Option<CommentKind>,

    /// Set only on a row that reverses another; never forms a cycle
    pub reversed_from: Option<u64>,

    pub transaction_date: NaiveDate,
}

impl LedgerTransaction {
    /// Whether this row belongs to the class-action settlement sub-ledger
    pub fn is_class_action(&self) -> bool {
        self.year_iteration == YearIteration::ClassAction
            || self.comment_kind == Some(CommentKind::ClassAction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_codes_round_trip() {
        for code in 1..=8 {
            let kind = TransactionKind::from_code(code).unwrap();
            assert_eq!(kind.code(), code);
        }
        assert_eq!(TransactionKind::from_code(0), None);
        assert_eq!(TransactionKind::from_code(9), None);
    }

    #[test]
    fn test_net_outflow_set() {
        assert!(TransactionKind::OutgoingPartialWithdrawal.is_net_outflow());
        assert!(TransactionKind::OutgoingForfeiture.is_net_outflow());
        assert!(TransactionKind::OutgoingDirectPayment.is_net_outflow());
        assert!(TransactionKind::OutgoingXferBeneficiary.is_net_outflow());
        assert!(TransactionKind::Outgoing100PctVestedPayment.is_net_outflow());

        assert!(!TransactionKind::IncomingContribution.is_net_outflow());
        assert!(!TransactionKind::IncomingQdroBeneficiary.is_net_outflow());
        assert!(!TransactionKind::Incoming100PctVestedEarnings.is_net_outflow());
    }

    #[test]
    fn test_non_reversible_kinds() {
        assert!(!TransactionKind::IncomingContribution.is_reversible());
        assert!(!TransactionKind::OutgoingForfeiture.is_reversible());
        assert!(!TransactionKind::Incoming100PctVestedEarnings.is_reversible());

        assert!(TransactionKind::IncomingQdroBeneficiary.is_reversible());
        assert!(TransactionKind::Outgoing100PctVestedPayment.is_reversible());
    }
}
