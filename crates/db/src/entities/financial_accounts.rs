//! `SeaORM` Entity for financial_accounts table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{FinancialAccountDirection, FinancialAccountStatus};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "financial_accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub description: String,
    pub sale_id: Option<Uuid>,
    pub payment_plan_id: Option<Uuid>,
    pub direction: FinancialAccountDirection,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub total_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub liquidated_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub open_amount: Decimal,
    pub due_date: Date,
    pub status: FinancialAccountStatus,
    pub category_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub liquidation_date: Option<Date>,
    pub last_bank_account_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::bank_transactions::Entity")]
    BankTransactions,
    #[sea_orm(
        belongs_to = "super::payment_plans::Entity",
        from = "Column::PaymentPlanId",
        to = "super::payment_plans::Column::Id"
    )]
    PaymentPlans,
    #[sea_orm(
        belongs_to = "super::sales::Entity",
        from = "Column::SaleId",
        to = "super::sales::Column::Id"
    )]
    Sales,
}

impl Related<super::bank_transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BankTransactions.def()
    }
}

impl Related<super::payment_plans::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentPlans.def()
    }
}

impl Related<super::sales::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sales.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
