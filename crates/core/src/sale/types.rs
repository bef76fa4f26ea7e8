//! Sale, payment plan and commission types as seen by the bridge.

use agencia_shared::types::{PaymentPlanId, SaleId, UserId};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::financial::{Counterparties, FinancialDirection};

/// Who receives the money of a payment plan installment (`quemRecebe`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Receiver {
    /// The agency receives it: a receivable.
    Agencia,
    /// The supplier receives it: a payable.
    Fornecedor,
}

impl Receiver {
    /// Direction of the shadow financial account.
    #[must_use]
    pub const fn financial_direction(self) -> FinancialDirection {
        match self {
            Self::Agencia => FinancialDirection::Receber,
            Self::Fornecedor => FinancialDirection::Pagar,
        }
    }
}

/// Lifecycle status of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaleStatus {
    /// Quote.
    Orcamento,
    /// Confirmed sale.
    Venda,
    /// Cancelled.
    Cancelada,
}

/// Payment plan status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    /// Not yet paid.
    Pendente,
    /// Paid.
    Liquidado,
}

/// Commission status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommissionStatus {
    /// Expected.
    AReceber,
    /// Received.
    Recebida,
}

/// Commission owed to one seller of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SellerCommission {
    /// Seller.
    pub user_id: UserId,
    /// Commission amount, may be zero.
    pub amount: Decimal,
}

/// The sale columns the bridge reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleSnapshot {
    /// Sale id.
    pub id: SaleId,
    /// Client buying the package.
    pub client_id: Option<Uuid>,
    /// Supplier providing it.
    pub supplier_id: Option<Uuid>,
    /// Amount owed by the client (`valorTotal`).
    pub total_amount: Decimal,
    /// Amount owed to the supplier (`custoTotal`).
    pub total_cost: Decimal,
    /// Current status.
    pub status: SaleStatus,
    /// Seller commissions.
    pub sellers: Vec<SellerCommission>,
}

impl SaleSnapshot {
    /// Counterparties for an obligation in the given direction.
    #[must_use]
    pub fn counterparties(&self, direction: FinancialDirection) -> Counterparties {
        match direction {
            FinancialDirection::Receber => Counterparties {
                client_id: self.client_id,
                ..Counterparties::default()
            },
            FinancialDirection::Pagar => Counterparties {
                supplier_id: self.supplier_id,
                ..Counterparties::default()
            },
        }
    }
}

/// A payment plan installment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanSnapshot {
    /// Plan id.
    pub id: PaymentPlanId,
    /// Owning sale.
    pub sale_id: SaleId,
    /// Description, also used for the shadow account.
    pub description: String,
    /// Installment amount.
    pub amount: Decimal,
    /// Due date.
    pub due_date: NaiveDate,
    /// Who receives the money.
    pub receiver: Receiver,
    /// Current status.
    pub status: PlanStatus,
}

/// A commission record to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCommission {
    /// Sale the commission comes from.
    pub sale_id: SaleId,
    /// Installment that produced it.
    pub payment_plan_id: Option<PaymentPlanId>,
    /// User credited.
    pub beneficiary: UserId,
    /// Kind of commission.
    pub commission_type: String,
    /// Percentage applied, two decimal places.
    pub percentage: Decimal,
    /// Commission amount, two decimal places.
    pub amount: Decimal,
    /// Expected receipt date.
    pub expected_date: NaiveDate,
    /// Status, always `a_receber` on creation.
    pub status: CommissionStatus,
}
