//! Liquidation arithmetic for financial accounts.
//!
//! Invariant: `total == liquidated + open` for every value this module returns.

use agencia_shared::OverpaymentPolicy;
use agencia_shared::types::{is_money_range, is_money_scale, round_money};
use rust_decimal::Decimal;
use serde::Serialize;

use super::error::FinancialError;
use super::types::{FinancialStatus, validate_total};

/// Amounts of a receivable or payable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Obligation {
    /// Amount owed in total.
    pub total: Decimal,
    /// Amount settled so far.
    pub liquidated: Decimal,
    /// Amount still open. Negative means the counterparty has a credit.
    pub open: Decimal,
}

impl Obligation {
    /// A fresh obligation: nothing liquidated, everything open.
    #[must_use]
    pub fn new(total: Decimal) -> Self {
        Self {
            total,
            liquidated: Decimal::ZERO,
            open: total,
        }
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> FinancialStatus {
        FinancialStatus::derive(self.liquidated, self.open)
    }

    /// Returns true if `total == liquidated + open`.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.total == self.liquidated + self.open
    }

    /// Credit held by the counterparty after an over-payment.
    #[must_use]
    pub fn credit(&self) -> Decimal {
        if self.open < Decimal::ZERO {
            -self.open
        } else {
            Decimal::ZERO
        }
    }

    /// Applies a liquidation of `amount`.
    ///
    /// Under [`OverpaymentPolicy::Allow`] an amount above the open balance is
    /// recorded and the open amount goes negative.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` for non-positive, sub-cent or unstorable
    /// amounts, including one that would push the liquidated sum past the
    /// storable range, and `OverLiquidation` when the policy rejects
    /// over-payment.
    pub fn liquidate(&self, amount: Decimal, policy: OverpaymentPolicy) -> Result<Self, FinancialError> {
        if amount <= Decimal::ZERO || !is_money_scale(amount) || !is_money_range(amount) {
            return Err(FinancialError::InvalidAmount(amount));
        }
        let amount = round_money(amount);

        if policy == OverpaymentPolicy::Reject && amount > self.open {
            return Err(FinancialError::OverLiquidation {
                open: self.open,
                requested: amount,
            });
        }

        let liquidated = self.liquidated + amount;
        if !is_money_range(liquidated) {
            return Err(FinancialError::InvalidAmount(amount));
        }
        Ok(Self {
            total: self.total,
            liquidated,
            open: self.total - liquidated,
        })
    }

    /// Replaces the total, keeping what was already liquidated.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTotal` for non-positive or sub-cent totals.
    pub fn retotal(&self, total: Decimal) -> Result<Self, FinancialError> {
        let total = validate_total(total)?;
        Ok(Self {
            total,
            liquidated: self.liquidated,
            open: total - self.liquidated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_two_step_liquidation() {
        let obligation = Obligation::new(dec!(900.00));
        assert_eq!(obligation.status(), FinancialStatus::Pendente);

        let first = obligation.liquidate(dec!(300.00), OverpaymentPolicy::Allow).unwrap();
        assert_eq!(first.status(), FinancialStatus::Parcial);
        assert_eq!(first.open, dec!(600.00));
        assert_eq!(first.liquidated, dec!(300.00));

        let second = first.liquidate(dec!(600.00), OverpaymentPolicy::Allow).unwrap();
        assert_eq!(second.status(), FinancialStatus::Liquidado);
        assert_eq!(second.open, dec!(0.00));
        assert!(second.is_consistent());
    }

    #[test]
    fn test_overpayment_allowed_becomes_credit() {
        let obligation = Obligation::new(dec!(100.00));
        let paid = obligation.liquidate(dec!(130.00), OverpaymentPolicy::Allow).unwrap();
        assert_eq!(paid.open, dec!(-30.00));
        assert_eq!(paid.credit(), dec!(30.00));
        assert_eq!(paid.status(), FinancialStatus::Liquidado);
        assert!(paid.is_consistent());
    }

    #[test]
    fn test_overpayment_rejected() {
        let obligation = Obligation::new(dec!(100.00));
        let err = obligation
            .liquidate(dec!(100.01), OverpaymentPolicy::Reject)
            .unwrap_err();
        assert!(matches!(err, FinancialError::OverLiquidation { .. }));

        let exact = obligation.liquidate(dec!(100.00), OverpaymentPolicy::Reject).unwrap();
        assert_eq!(exact.open, Decimal::ZERO);
    }

    #[test]
    fn test_invalid_amounts() {
        let obligation = Obligation::new(dec!(100.00));
        assert!(matches!(
            obligation.liquidate(dec!(0), OverpaymentPolicy::Allow),
            Err(FinancialError::InvalidAmount(_))
        ));
        assert!(matches!(
            obligation.liquidate(dec!(-5), OverpaymentPolicy::Allow),
            Err(FinancialError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_unstorable_amounts_rejected() {
        let obligation = Obligation::new(dec!(100.00));
        assert!(matches!(
            obligation.liquidate(dec!(79228162514264337593543950000), OverpaymentPolicy::Allow),
            Err(FinancialError::InvalidAmount(_))
        ));
        assert!(matches!(
            obligation.liquidate(dec!(10000000000000.00), OverpaymentPolicy::Allow),
            Err(FinancialError::InvalidAmount(_))
        ));

        let nearly_full = Obligation::new(dec!(100.00))
            .liquidate(dec!(9999999999999.00), OverpaymentPolicy::Allow)
            .unwrap();
        assert!(matches!(
            nearly_full.liquidate(dec!(1.00), OverpaymentPolicy::Allow),
            Err(FinancialError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_retotal_keeps_liquidated() {
        let partly = Obligation::new(dec!(500.00))
            .liquidate(dec!(200.00), OverpaymentPolicy::Allow)
            .unwrap();
        let updated = partly.retotal(dec!(800.00)).unwrap();
        assert_eq!(updated.liquidated, dec!(200.00));
        assert_eq!(updated.open, dec!(600.00));
        assert_eq!(updated.status(), FinancialStatus::Parcial);
        assert!(updated.is_consistent());
    }
}
