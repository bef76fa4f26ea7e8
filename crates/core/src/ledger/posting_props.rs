//! Property-based tests for ledger postings.
//!
//! - Every posting keeps `after == before ± amount`
//! - Consecutive postings chain their snapshots
//! - The balance always equals the opening balance plus the signed postings

use agencia_shared::types::BankAccountId;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::reconcile::{BalanceReport, Movement};
use super::types::{AccountState, Direction};

/// Strategy to generate a valid positive amount (0.01 to 1,000,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate any balance, including overdrawn ones.
fn any_balance() -> impl Strategy<Value = Decimal> {
    (-100_000_000i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn direction_strategy() -> impl Strategy<Value = Direction> {
    prop_oneof![Just(Direction::Entrada), Just(Direction::Saida)]
}

fn account(balance: Decimal) -> AccountState {
    AccountState {
        id: BankAccountId::new(),
        name: "Conta".to_string(),
        balance,
        version: 0,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// For any balance, amount and direction the snapshot is consistent.
    #[test]
    fn prop_snapshot_consistent(
        balance in any_balance(),
        amount in positive_amount(),
        direction in direction_strategy(),
    ) {
        let mut state = account(balance);
        let posting = state.post(direction, amount).unwrap();

        prop_assert!(posting.snapshot.is_consistent(direction, amount));
        prop_assert_eq!(posting.snapshot.before, balance);
        prop_assert_eq!(posting.snapshot.after, state.balance);
    }

    /// A sequence of postings forms an unbroken chain that reconciles cleanly.
    #[test]
    fn prop_postings_chain_and_reconcile(
        opening in (0i64..100_000_000i64).prop_map(|c| Decimal::new(c, 2)),
        steps in prop::collection::vec((direction_strategy(), positive_amount()), 1..30),
    ) {
        let mut state = account(opening);
        let mut movements = Vec::with_capacity(steps.len());

        for (direction, amount) in steps {
            let posting = state.post(direction, amount).unwrap();
            movements.push(Movement {
                direction,
                amount: posting.amount,
                snapshot: posting.snapshot,
            });
        }

        let report = BalanceReport::compute(state.id, opening, state.balance, &movements);
        prop_assert!(!report.has_drift());
        prop_assert_eq!(report.broken_snapshots, 0);
        prop_assert_eq!(report.last_snapshot, Some(state.balance));
        prop_assert_eq!(state.version, i64::try_from(movements.len()).unwrap());
    }
}
