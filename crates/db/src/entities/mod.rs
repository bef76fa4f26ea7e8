//! `SeaORM` entity definitions.

pub mod prelude;

pub mod bank_accounts;
pub mod bank_transactions;
pub mod financial_accounts;
pub mod idempotency_keys;
pub mod payment_plans;
pub mod sale_commissions;
pub mod sale_sellers;
pub mod sales;
pub mod sea_orm_active_enums;
