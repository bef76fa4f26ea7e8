//! `SeaORM` Entity for bank_transactions table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::TransactionDirection;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "bank_transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub bank_account_id: Uuid,
    pub financial_account_id: Option<Uuid>,
    pub description: String,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub amount: Decimal,
    pub direction: TransactionDirection,
    pub transaction_date: Date,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub balance_before: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub balance_after: Decimal,
    pub account_version: i64,
    pub reconciled: bool,
    #[sea_orm(column_type = "JsonBinary")]
    pub attachments: Json,
    pub notes: Option<String>,
    pub idempotency_key: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::bank_accounts::Entity",
        from = "Column::BankAccountId",
        to = "super::bank_accounts::Column::Id"
    )]
    BankAccounts,
    #[sea_orm(
        belongs_to = "super::financial_accounts::Entity",
        from = "Column::FinancialAccountId",
        to = "super::financial_accounts::Column::Id"
    )]
    FinancialAccounts,
}

impl Related<super::bank_accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BankAccounts.def()
    }
}

impl Related<super::financial_accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FinancialAccounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
