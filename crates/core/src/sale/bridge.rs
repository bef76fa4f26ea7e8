//! Derivation of financial obligations from sales and payment plans.
//!
//! Nothing here touches a bank balance. Obligations created by the bridge are
//! settled later through financial account liquidation.

use agencia_shared::types::{
    FinancialAccountId, UserId, is_money_range, is_money_scale, ratio_percent, round_money,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::error::SaleError;
use super::types::{
    CommissionStatus, NewCommission, PlanSnapshot, PlanStatus, Receiver, SaleSnapshot, SaleStatus,
};
use crate::financial::{Counterparties, FinancialDirection, NewFinancialAccount, Obligation};

/// Commission type recorded for supplier installments.
pub const SUPPLIER_COMMISSION_TYPE: &str = "fornecedor";

/// Obligations raised when a sale is confirmed.
///
/// One receivable for the client total, one payable for the supplier cost if
/// non-zero, and one payable per seller commission with a non-zero amount.
///
/// # Errors
///
/// Returns `AlreadyConfirmed`, `Cancelled` or `InvalidSaleTotal`.
pub fn confirmation_accounts(
    sale: &SaleSnapshot,
    due_date: NaiveDate,
) -> Result<Vec<NewFinancialAccount>, SaleError> {
    match sale.status {
        SaleStatus::Venda => return Err(SaleError::AlreadyConfirmed(sale.id)),
        SaleStatus::Cancelada => return Err(SaleError::Cancelled(sale.id)),
        SaleStatus::Orcamento => {}
    }
    if sale.total_amount <= Decimal::ZERO {
        return Err(SaleError::InvalidSaleTotal(sale.total_amount));
    }

    let mut accounts = Vec::with_capacity(2 + sale.sellers.len());
    accounts.push(NewFinancialAccount {
        description: format!("Sale {}: client receivable", sale.id),
        total: round_money(sale.total_amount),
        direction: FinancialDirection::Receber,
        due_date,
        counterparties: sale.counterparties(FinancialDirection::Receber),
        sale_id: Some(sale.id),
        payment_plan_id: None,
        category_id: None,
    });

    if sale.total_cost > Decimal::ZERO {
        accounts.push(NewFinancialAccount {
            description: format!("Sale {}: supplier cost", sale.id),
            total: round_money(sale.total_cost),
            direction: FinancialDirection::Pagar,
            due_date,
            counterparties: sale.counterparties(FinancialDirection::Pagar),
            sale_id: Some(sale.id),
            payment_plan_id: None,
            category_id: None,
        });
    }

    for seller in sale.sellers.iter().filter(|s| s.amount > Decimal::ZERO) {
        accounts.push(NewFinancialAccount {
            description: format!("Sale {}: seller commission", sale.id),
            total: round_money(seller.amount),
            direction: FinancialDirection::Pagar,
            due_date,
            counterparties: Counterparties {
                user_id: Some(seller.user_id),
                ..Counterparties::default()
            },
            sale_id: Some(sale.id),
            payment_plan_id: None,
            category_id: None,
        });
    }

    Ok(accounts)
}

/// Checks a payment plan amount and returns it at cent scale.
///
/// # Errors
///
/// Returns `InvalidPlanAmount` for non-positive, sub-cent or unstorable amounts.
pub fn validate_plan_amount(amount: Decimal) -> Result<Decimal, SaleError> {
    if amount <= Decimal::ZERO || !is_money_scale(amount) || !is_money_range(amount) {
        return Err(SaleError::InvalidPlanAmount(amount));
    }
    Ok(round_money(amount))
}

/// The shadow financial account a payment plan should have.
#[must_use]
pub fn shadow_account(plan: &PlanSnapshot, sale: &SaleSnapshot) -> NewFinancialAccount {
    let direction = plan.receiver.financial_direction();
    NewFinancialAccount {
        description: plan.description.clone(),
        total: plan.amount,
        direction,
        due_date: plan.due_date,
        counterparties: sale.counterparties(direction),
        sale_id: Some(plan.sale_id),
        payment_plan_id: Some(plan.id),
        category_id: None,
    }
}

/// The shadow account of a plan as currently stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShadowState {
    /// Financial account id.
    pub id: FinancialAccountId,
    /// Stored direction.
    pub direction: FinancialDirection,
    /// Stored amounts.
    pub obligation: Obligation,
}

impl ShadowState {
    /// Returns true if any amount was already settled.
    #[must_use]
    pub fn has_liquidations(&self) -> bool {
        !self.obligation.liquidated.is_zero()
    }
}

/// What to do with the shadow account after a plan changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShadowSync {
    /// No shadow exists yet; create it.
    Create(NewFinancialAccount),
    /// The receiver changed; delete the old shadow and create one in the opposite direction.
    Recreate {
        /// Shadow to delete.
        remove: FinancialAccountId,
        /// Replacement.
        create: NewFinancialAccount,
    },
    /// Same direction; patch the stored shadow in place.
    Patch {
        /// Shadow to update.
        id: FinancialAccountId,
        /// New amounts, keeping what was already liquidated.
        obligation: Obligation,
        /// New due date.
        due_date: NaiveDate,
        /// New description.
        description: String,
    },
}

/// Decides how the shadow account follows an updated plan.
///
/// `current` is the plan as stored, `updated` the plan after the edit.
///
/// # Errors
///
/// Returns `PlanAlreadyLiquidated` for liquidated plans, `ShadowAccountLiquidated`
/// when a shadow with liquidations would be replaced, and `InvalidPlanAmount`.
pub fn sync_shadow(
    current: &PlanSnapshot,
    updated: &PlanSnapshot,
    sale: &SaleSnapshot,
    shadow: Option<&ShadowState>,
) -> Result<ShadowSync, SaleError> {
    if current.status == PlanStatus::Liquidado {
        return Err(SaleError::PlanAlreadyLiquidated(current.id));
    }
    validate_plan_amount(updated.amount)?;

    let Some(shadow) = shadow else {
        return Ok(ShadowSync::Create(shadow_account(updated, sale)));
    };

    if shadow.direction != updated.receiver.financial_direction() {
        if shadow.has_liquidations() {
            return Err(SaleError::ShadowAccountLiquidated(current.id));
        }
        return Ok(ShadowSync::Recreate {
            remove: shadow.id,
            create: shadow_account(updated, sale),
        });
    }

    let obligation = shadow.obligation.retotal(updated.amount)?;
    Ok(ShadowSync::Patch {
        id: shadow.id,
        obligation,
        due_date: updated.due_date,
        description: updated.description.clone(),
    })
}

/// Checks that a plan may be deleted and returns the shadow to delete with it.
///
/// # Errors
///
/// Returns `PlanAlreadyLiquidated` or `ShadowAccountLiquidated`.
pub fn plan_removal(
    plan: &PlanSnapshot,
    shadow: Option<&ShadowState>,
) -> Result<Option<FinancialAccountId>, SaleError> {
    if plan.status == PlanStatus::Liquidado {
        return Err(SaleError::PlanAlreadyLiquidated(plan.id));
    }
    match shadow {
        Some(s) if s.has_liquidations() => Err(SaleError::ShadowAccountLiquidated(plan.id)),
        Some(s) => Ok(Some(s.id)),
        None => Ok(None),
    }
}

/// Checks that a plan can be liquidated.
///
/// # Errors
///
/// Returns `PlanAlreadyLiquidated`.
pub fn check_plan_liquidation(plan: &PlanSnapshot) -> Result<(), SaleError> {
    if plan.status == PlanStatus::Liquidado {
        return Err(SaleError::PlanAlreadyLiquidated(plan.id));
    }
    Ok(())
}

/// Commission derived from a supplier installment.
///
/// The percentage is the sale margin `(total - cost) / total × 100` and the
/// amount is the installment times that margin, both rounded to cents. Returns
/// `None` for agency installments.
#[must_use]
pub fn supplier_commission(
    sale: &SaleSnapshot,
    plan: &PlanSnapshot,
    beneficiary: UserId,
) -> Option<NewCommission> {
    if plan.receiver != Receiver::Fornecedor {
        return None;
    }

    let margin = sale.total_amount - sale.total_cost;
    let amount = if sale.total_amount.is_zero() {
        Decimal::ZERO
    } else {
        round_money(plan.amount * margin / sale.total_amount)
    };

    Some(NewCommission {
        sale_id: sale.id,
        payment_plan_id: Some(plan.id),
        beneficiary,
        commission_type: SUPPLIER_COMMISSION_TYPE.to_string(),
        percentage: ratio_percent(margin, sale.total_amount),
        amount,
        expected_date: plan.due_date,
        status: CommissionStatus::AReceber,
    })
}
