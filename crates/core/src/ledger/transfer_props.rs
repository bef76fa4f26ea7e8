//! Property-based tests for transfer planning.
//!
//! - Conservation: the pair's total balance never changes
//! - Same-account transfers are always rejected
//! - Transfers above the source balance are always rejected

use agencia_shared::types::BankAccountId;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::error::LedgerError;
use super::transfer::{TransferRequest, plan_transfer};
use super::types::AccountState;

fn cents(range: std::ops::Range<i64>) -> impl Strategy<Value = Decimal> {
    range.prop_map(|c| Decimal::new(c, 2))
}

fn account(name: &str, balance: Decimal) -> AccountState {
    AccountState {
        id: BankAccountId::new(),
        name: name.to_string(),
        balance,
        version: 0,
    }
}

fn request(source: &AccountState, destination: &AccountState, amount: Decimal) -> TransferRequest {
    TransferRequest {
        source: source.id,
        destination: destination.id,
        amount,
        description: "prop".to_string(),
        notes: None,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// A successful transfer moves exactly `amount` and conserves the sum.
    #[test]
    fn prop_transfer_conserves_total(
        source_balance in cents(1..100_000_000),
        destination_balance in cents(-1_000_000..100_000_000),
        fraction in 1u32..=100,
    ) {
        let amount = (source_balance * Decimal::from(fraction) / Decimal::ONE_HUNDRED)
            .round_dp(2)
            .max(Decimal::new(1, 2));
        prop_assume!(amount <= source_balance);

        let source = account("A", source_balance);
        let destination = account("B", destination_balance);
        let plan = plan_transfer(&request(&source, &destination, amount), Some(source), Some(destination))
            .unwrap();

        prop_assert_eq!(plan.source.balance, source_balance - amount);
        prop_assert_eq!(plan.destination.balance, destination_balance + amount);
        prop_assert_eq!(
            plan.source.balance + plan.destination.balance,
            source_balance + destination_balance
        );
        prop_assert_eq!(plan.outgoing.posting.amount, plan.incoming.posting.amount);
    }

    /// Transferring to the same account fails regardless of balance.
    #[test]
    fn prop_same_account_rejected(
        balance in cents(-1_000_000..100_000_000),
        amount in cents(1..100_000_000),
    ) {
        let a = account("A", balance);
        let result = plan_transfer(&request(&a, &a, amount), Some(a.clone()), Some(a));
        prop_assert!(matches!(result, Err(LedgerError::SameAccount(_))));
    }

    /// Any amount above the source balance is rejected.
    #[test]
    fn prop_insufficient_funds_rejected(
        balance in cents(0..100_000_000),
        excess in cents(1..100_000_000),
    ) {
        let source = account("A", balance);
        let destination = account("B", Decimal::ZERO);
        let result = plan_transfer(
            &request(&source, &destination, balance + excess),
            Some(source),
            Some(destination),
        );
        let is_insufficient = matches!(result, Err(LedgerError::InsufficientFunds { .. }));
        prop_assert!(is_insufficient);
    }
}
