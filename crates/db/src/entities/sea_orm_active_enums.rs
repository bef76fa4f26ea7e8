//! `SeaORM` active enums mapped to Postgres enum types.
//!
//! Each enum converts to and from its counterpart in `agencia-core`.

use agencia_core::financial::{FinancialDirection, FinancialStatus};
use agencia_core::ledger::Direction;
use agencia_core::sale::{CommissionStatus, PlanStatus, Receiver, SaleStatus};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// `transaction_direction` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "transaction_direction")]
#[serde(rename_all = "lowercase")]
pub enum TransactionDirection {
    /// Money in.
    #[sea_orm(string_value = "entrada")]
    Entrada,
    /// Money out.
    #[sea_orm(string_value = "saida")]
    Saida,
}

/// `financial_direction` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "financial_direction")]
#[serde(rename_all = "lowercase")]
pub enum FinancialAccountDirection {
    /// Payable.
    #[sea_orm(string_value = "pagar")]
    Pagar,
    /// Receivable.
    #[sea_orm(string_value = "receber")]
    Receber,
}

/// `financial_status` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "financial_status")]
#[serde(rename_all = "lowercase")]
pub enum FinancialAccountStatus {
    /// Nothing settled.
    #[sea_orm(string_value = "pendente")]
    Pendente,
    /// Partially settled.
    #[sea_orm(string_value = "parcial")]
    Parcial,
    /// Fully settled.
    #[sea_orm(string_value = "liquidado")]
    Liquidado,
}

/// `sale_status` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "sale_status")]
#[serde(rename_all = "lowercase")]
pub enum SaleStatusDb {
    /// Quote.
    #[sea_orm(string_value = "orcamento")]
    Orcamento,
    /// Confirmed.
    #[sea_orm(string_value = "venda")]
    Venda,
    /// Cancelled.
    #[sea_orm(string_value = "cancelada")]
    Cancelada,
}

/// `plan_receiver` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "plan_receiver")]
#[serde(rename_all = "UPPERCASE")]
pub enum PlanReceiver {
    /// Agency.
    #[sea_orm(string_value = "AGENCIA")]
    Agencia,
    /// Supplier.
    #[sea_orm(string_value = "FORNECEDOR")]
    Fornecedor,
}

/// `plan_status` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "plan_status")]
#[serde(rename_all = "lowercase")]
pub enum PlanStatusDb {
    /// Open.
    #[sea_orm(string_value = "pendente")]
    Pendente,
    /// Paid.
    #[sea_orm(string_value = "liquidado")]
    Liquidado,
}

/// `commission_status` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "commission_status")]
#[serde(rename_all = "snake_case")]
pub enum CommissionStatusDb {
    /// Expected.
    #[sea_orm(string_value = "a_receber")]
    AReceber,
    /// Received.
    #[sea_orm(string_value = "recebida")]
    Recebida,
}

/// `idempotency_scope` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "idempotency_scope")]
#[serde(rename_all = "lowercase")]
pub enum IdempotencyScope {
    /// Bank account transfer.
    #[sea_orm(string_value = "transfer")]
    Transfer,
    /// Financial account liquidation.
    #[sea_orm(string_value = "liquidation")]
    Liquidation,
}

impl IdempotencyScope {
    /// Wire name used in error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Transfer => "transfer",
            Self::Liquidation => "liquidation",
        }
    }
}

macro_rules! mirror_enum {
    ($db:ident <=> $core:ident { $($variant:ident),+ $(,)? }) => {
        impl From<$core> for $db {
            fn from(value: $core) -> Self {
                match value {
                    $($core::$variant => Self::$variant,)+
                }
            }
        }

        impl From<$db> for $core {
            fn from(value: $db) -> Self {
                match value {
                    $($db::$variant => Self::$variant,)+
                }
            }
        }
    };
}

mirror_enum!(TransactionDirection <=> Direction { Entrada, Saida });
mirror_enum!(FinancialAccountDirection <=> FinancialDirection { Pagar, Receber });
mirror_enum!(FinancialAccountStatus <=> FinancialStatus { Pendente, Parcial, Liquidado });
mirror_enum!(SaleStatusDb <=> SaleStatus { Orcamento, Venda, Cancelada });
mirror_enum!(PlanReceiver <=> Receiver { Agencia, Fornecedor });
mirror_enum!(PlanStatusDb <=> PlanStatus { Pendente, Liquidado });
mirror_enum!(CommissionStatusDb <=> CommissionStatus { AReceber, Recebida });

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_mirror() {
        assert_eq!(TransactionDirection::from(Direction::Saida), TransactionDirection::Saida);
        assert_eq!(Direction::from(TransactionDirection::Entrada), Direction::Entrada);
    }

    #[test]
    fn test_receiver_mirror() {
        assert_eq!(PlanReceiver::from(Receiver::Fornecedor), PlanReceiver::Fornecedor);
        assert_eq!(Receiver::from(PlanReceiver::Agencia), Receiver::Agencia);
        assert_eq!(
            FinancialStatus::from(FinancialAccountStatus::Parcial),
            FinancialStatus::Parcial
        );
    }
}
