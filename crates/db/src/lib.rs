//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - The ledger schema migration
//! - Repositories that run ledger rules inside Postgres transactions with row locks

pub mod entities;
pub mod migration;
pub mod repositories;

pub use repositories::{
    BankAccountRepository, FinancialAccountRepository, LedgerRepository, RepositoryError,
    SaleBridgeRepository, TransferRepository,
};

use std::time::Duration;

use agencia_shared::config::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Establishes a pooled connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .sqlx_logging(false);

    Database::connect(options).await
}
