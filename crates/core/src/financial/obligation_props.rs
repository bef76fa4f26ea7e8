//! Property-based tests for liquidation arithmetic.
//!
//! - `total == liquidated + open` after any sequence of liquidations
//! - Status always matches the derivation rule
//! - Partial liquidations that stay within the total never leave open < 0

use agencia_shared::OverpaymentPolicy;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::obligation::Obligation;
use super::types::FinancialStatus;

fn cents(range: std::ops::Range<i64>) -> impl Strategy<Value = Decimal> {
    range.prop_map(|c| Decimal::new(c, 2))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_total_equals_liquidated_plus_open(
        total in cents(1..10_000_000),
        amounts in prop::collection::vec(cents(1..5_000_000), 1..10),
    ) {
        let mut obligation = Obligation::new(total);
        for amount in amounts {
            obligation = obligation.liquidate(amount, OverpaymentPolicy::Allow).unwrap();
            prop_assert!(obligation.is_consistent());
            prop_assert_eq!(
                obligation.status(),
                FinancialStatus::derive(obligation.liquidated, obligation.open)
            );
        }
    }

    #[test]
    fn prop_split_liquidation_never_negative(
        total in cents(2..10_000_000),
        split in 1u32..100,
    ) {
        let first = (total * Decimal::from(split) / Decimal::ONE_HUNDRED).round_dp(2);
        prop_assume!(first > Decimal::ZERO && first < total);
        let second = total - first;

        let obligation = Obligation::new(total);
        let after_first = obligation.liquidate(first, OverpaymentPolicy::Reject).unwrap();
        prop_assert_eq!(after_first.status(), FinancialStatus::Parcial);
        prop_assert!(after_first.open >= Decimal::ZERO);

        let after_second = after_first.liquidate(second, OverpaymentPolicy::Reject).unwrap();
        prop_assert_eq!(after_second.open, Decimal::ZERO);
        prop_assert_eq!(after_second.status(), FinancialStatus::Liquidado);
    }

    #[test]
    fn prop_reject_policy_never_overpays(
        total in cents(1..10_000_000),
        amounts in prop::collection::vec(cents(1..5_000_000), 1..10),
    ) {
        let mut obligation = Obligation::new(total);
        for amount in amounts {
            if let Ok(next) = obligation.liquidate(amount, OverpaymentPolicy::Reject) {
                obligation = next;
            }
            prop_assert!(obligation.open >= Decimal::ZERO);
        }
    }
}
