//! Shared setup for database integration tests.
//!
//! Tests run against the Postgres at `DATABASE_URL` and are skipped when it is
//! unset or unreachable. The schema is migrated once per test binary.

#![allow(dead_code)]

use std::env;

use agencia_db::entities::{sale_sellers, sales, sea_orm_active_enums::SaleStatusDb};
use agencia_db::migration::{Migrator, MigratorTrait};
use agencia_db::repositories::{BankAccountRepository, CreateBankAccountInput};
use agencia_db::entities::bank_accounts;
use chrono::{NaiveDate, Utc};
use fake::Fake;
use fake::faker::company::en::CompanyName;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use tokio::sync::OnceCell;
use uuid::Uuid;

static MIGRATED: OnceCell<()> = OnceCell::const_new();

/// Connects and migrates, or returns `None` to skip the test.
pub async fn connect() -> Option<DatabaseConnection> {
    let Ok(url) = env::var("DATABASE_URL") else {
        eprintln!("Skipping test - DATABASE_URL not set");
        return None;
    };

    let db = match Database::connect(&url).await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Skipping test - database not available: {e}");
            return None;
        }
    };

    MIGRATED
        .get_or_init(|| async {
            Migrator::up(&db, None).await.expect("migrations should apply");
        })
        .await;

    Some(db)
}

/// Calendar date shorthand.
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

/// Creates an active bank account with a random name suffix.
pub async fn bank_account(
    db: &DatabaseConnection,
    name: &str,
    opening: Decimal,
) -> bank_accounts::Model {
    let company: String = CompanyName().fake();
    BankAccountRepository::new(db.clone())
        .create(CreateBankAccountInput {
            name: format!("{name} ({company})"),
            bank: Some(company),
            opening_balance: Some(opening),
            ..CreateBankAccountInput::default()
        })
        .await
        .expect("bank account should be created")
}

/// Inserts a quote the way the sales service would.
pub async fn quote(
    db: &DatabaseConnection,
    total: Decimal,
    cost: Decimal,
    seller_commissions: &[Decimal],
) -> sales::Model {
    let now = Utc::now().into();
    let sale = sales::ActiveModel {
        id: Set(Uuid::now_v7()),
        client_id: Set(Some(Uuid::new_v4())),
        supplier_id: Set(Some(Uuid::new_v4())),
        total_amount: Set(total),
        total_cost: Set(cost),
        status: Set(SaleStatusDb::Orcamento),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("sale should be inserted");

    for amount in seller_commissions {
        sale_sellers::ActiveModel {
            id: Set(Uuid::now_v7()),
            sale_id: Set(sale.id),
            user_id: Set(Uuid::new_v4()),
            commission_amount: Set(*amount),
        }
        .insert(db)
        .await
        .expect("seller should be inserted");
    }

    sale
}
