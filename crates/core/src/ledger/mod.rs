//! Bank ledger rules.
//!
//! This module implements the pure side of the ledger:
//! - Movement directions and balance snapshots
//! - Posting rules for appending ledger rows
//! - Transfer planning with ordered preconditions and lock ordering
//! - Balance reconciliation against the ledger
//! - Error types for ledger operations

pub mod error;
pub mod posting;
pub mod reconcile;
pub mod transfer;
pub mod types;

#[cfg(test)]
mod posting_props;
#[cfg(test)]
mod transfer_props;

pub use error::{AccountSide, LedgerError};
pub use posting::{validate_amount, validate_opening_balance};
pub use reconcile::{BalanceReport, Movement, recompute_balance};
pub use transfer::{
    TransferLeg, TransferPlan, TransferRequest, incoming_description, outgoing_description,
    plan_transfer,
};
pub use types::{AccountState, BalanceSnapshot, Direction, Posting};
