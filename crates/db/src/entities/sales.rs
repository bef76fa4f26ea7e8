//! `SeaORM` Entity for sales table.
//!
//! Only the columns the ledger bridge reads. The sales collaborator owns the rest.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::SaleStatusDb;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "sales")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub client_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub total_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub total_cost: Decimal,
    pub status: SaleStatusDb,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::payment_plans::Entity")]
    PaymentPlans,
    #[sea_orm(has_many = "super::sale_sellers::Entity")]
    SaleSellers,
    #[sea_orm(has_many = "super::sale_commissions::Entity")]
    SaleCommissions,
    #[sea_orm(has_many = "super::financial_accounts::Entity")]
    FinancialAccounts,
}

impl Related<super::payment_plans::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentPlans.def()
    }
}

impl Related<super::sale_sellers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SaleSellers.def()
    }
}

impl Related<super::sale_commissions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SaleCommissions.def()
    }
}

impl Related<super::financial_accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FinancialAccounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
