//! `SeaORM` Entity for payment_plans table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{PlanReceiver, PlanStatusDb};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "payment_plans")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub sale_id: Uuid,
    pub description: String,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub amount: Decimal,
    pub due_date: Date,
    pub payment_method: Option<String>,
    pub payment_condition: Option<String>,
    pub receiver: PlanReceiver,
    pub payer_reference: Option<String>,
    pub status: PlanStatusDb,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub paid_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub open_amount: Decimal,
    pub bank_account_id: Option<Uuid>,
    pub liquidation_date: Option<Date>,
    pub liquidation_notes: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::sales::Entity",
        from = "Column::SaleId",
        to = "super::sales::Column::Id"
    )]
    Sales,
    #[sea_orm(has_many = "super::financial_accounts::Entity")]
    FinancialAccounts,
}

impl Related<super::sales::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sales.def()
    }
}

impl Related<super::financial_accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FinancialAccounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
