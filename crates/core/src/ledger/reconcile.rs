//! Balance reconciliation.
//!
//! Recomputes an account balance from its opening balance and its ledger rows
//! and compares it with the stored balance.

use agencia_shared::types::BankAccountId;
use rust_decimal::Decimal;
use serde::Serialize;

use super::types::{BalanceSnapshot, Direction};

/// A ledger row as needed for reconciliation, in ledger order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Movement {
    /// Direction of the row.
    pub direction: Direction,
    /// Positive amount.
    pub amount: Decimal,
    /// Snapshot stored on the row.
    pub snapshot: BalanceSnapshot,
}

/// Outcome of comparing the stored balance with the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceReport {
    /// Account checked.
    pub account_id: BankAccountId,
    /// Balance stored on the account row.
    pub stored: Decimal,
    /// Opening balance plus entradas minus saidas.
    pub computed: Decimal,
    /// `balance_after` of the newest ledger row, if any.
    pub last_snapshot: Option<Decimal>,
    /// `stored - computed`.
    pub drift: Decimal,
    /// Number of ledger rows read.
    pub entries: usize,
    /// Rows whose snapshot does not match their own amount and direction,
    /// or whose `before` differs from the previous row's `after`.
    pub broken_snapshots: usize,
    /// Whether the stored balance was overwritten with `computed`.
    pub applied: bool,
}

impl BalanceReport {
    /// Builds a report from the account and its movements in ledger order.
    #[must_use]
    pub fn compute(
        account_id: BankAccountId,
        opening: Decimal,
        stored: Decimal,
        movements: &[Movement],
    ) -> Self {
        let computed = recompute_balance(opening, movements);
        Self {
            account_id,
            stored,
            computed,
            last_snapshot: movements.last().map(|m| m.snapshot.after),
            drift: stored - computed,
            entries: movements.len(),
            broken_snapshots: count_broken_snapshots(opening, movements),
            applied: false,
        }
    }

    /// Returns true if the stored balance disagrees with the ledger.
    #[must_use]
    pub fn has_drift(&self) -> bool {
        !self.drift.is_zero()
    }
}

/// Opening balance plus the signed sum of every movement.
///
/// Saturates at the `Decimal` bounds, which then shows up as drift.
#[must_use]
pub fn recompute_balance(opening: Decimal, movements: &[Movement]) -> Decimal {
    movements
        .iter()
        .fold(opening, |balance, m| balance.saturating_add(m.direction.signed(m.amount)))
}

fn count_broken_snapshots(opening: Decimal, movements: &[Movement]) -> usize {
    let mut previous_after = opening;
    let mut broken = 0;
    for m in movements {
        if !m.snapshot.is_consistent(m.direction, m.amount) || m.snapshot.before != previous_after {
            broken += 1;
        }
        previous_after = m.snapshot.after;
    }
    broken
}
