//! Append-only transaction ledger and its mutation operations

mod transaction;

pub mod mutate;

pub use transaction::{CommentKind, LedgerTransaction, TransactionKind, YearIteration};
