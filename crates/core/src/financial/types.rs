//! Financial account domain types.

use std::fmt;
use std::str::FromStr;

use agencia_shared::types::{
    PaymentPlanId, SaleId, UserId, is_money_range, is_money_scale, round_money,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::FinancialError;
use crate::ledger::Direction;

/// Whether the agency owes or is owed the amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FinancialDirection {
    /// Payable.
    Pagar,
    /// Receivable.
    Receber,
}

impl FinancialDirection {
    /// Ledger direction used when this obligation is settled against a bank account.
    #[must_use]
    pub const fn settlement(self) -> Direction {
        match self {
            Self::Receber => Direction::Entrada,
            Self::Pagar => Direction::Saida,
        }
    }

    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pagar => "pagar",
            Self::Receber => "receber",
        }
    }
}

impl fmt::Display for FinancialDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FinancialDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pagar" => Ok(Self::Pagar),
            "receber" => Ok(Self::Receber),
            other => Err(format!("unknown financial direction '{other}'")),
        }
    }
}

/// Settlement status of a financial account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FinancialStatus {
    /// Nothing settled yet.
    Pendente,
    /// Partially settled.
    Parcial,
    /// Fully settled.
    Liquidado,
}

impl FinancialStatus {
    /// Derives the status from the liquidated and open amounts.
    ///
    /// `open <= 0` is liquidado, otherwise any liquidated amount is parcial.
    #[must_use]
    pub fn derive(liquidated: Decimal, open: Decimal) -> Self {
        if open <= Decimal::ZERO {
            Self::Liquidado
        } else if liquidated > Decimal::ZERO {
            Self::Parcial
        } else {
            Self::Pendente
        }
    }

    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pendente => "pendente",
            Self::Parcial => "parcial",
            Self::Liquidado => "liquidado",
        }
    }
}

impl FromStr for FinancialStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pendente" => Ok(Self::Pendente),
            "parcial" => Ok(Self::Parcial),
            "liquidado" => Ok(Self::Liquidado),
            other => Err(format!("unknown financial status '{other}'")),
        }
    }
}

/// Who the obligation is with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counterparties {
    /// Client owing a receivable.
    pub client_id: Option<Uuid>,
    /// Supplier owed a payable.
    pub supplier_id: Option<Uuid>,
    /// Back-office user owed a commission.
    pub user_id: Option<UserId>,
}

/// Input for a new financial account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFinancialAccount {
    /// Description shown in listings.
    pub description: String,
    /// Amount owed.
    pub total: Decimal,
    /// Payable or receivable.
    pub direction: FinancialDirection,
    /// Due date.
    pub due_date: NaiveDate,
    /// Who the obligation is with.
    pub counterparties: Counterparties,
    /// Sale that spawned it.
    pub sale_id: Option<SaleId>,
    /// Payment plan it shadows.
    pub payment_plan_id: Option<PaymentPlanId>,
    /// Category for reporting.
    pub category_id: Option<Uuid>,
}

impl NewFinancialAccount {
    /// Checks the total and returns it at cent scale.
    ///
    /// # Errors
    ///
    /// Returns `FinancialError::InvalidTotal` for non-positive or sub-cent totals.
    pub fn validate(&self) -> Result<Decimal, FinancialError> {
        validate_total(self.total)
    }
}

/// Checks an obligation total.
///
/// # Errors
///
/// Returns `FinancialError::InvalidTotal` for non-positive, sub-cent or
/// unstorable totals.
pub fn validate_total(total: Decimal) -> Result<Decimal, FinancialError> {
    if total <= Decimal::ZERO || !is_money_scale(total) || !is_money_range(total) {
        return Err(FinancialError::InvalidTotal(total));
    }
    Ok(round_money(total))
}

/// Ledger description for a settlement posting.
#[must_use]
pub fn settlement_description(direction: FinancialDirection, description: &str) -> String {
    match direction {
        FinancialDirection::Receber => format!("Received: {description}"),
        FinancialDirection::Pagar => format!("Paid: {description}"),
    }
}
