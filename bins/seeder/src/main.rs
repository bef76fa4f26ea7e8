//! Database seeder for agency ledger development and testing.
//!
//! Seeds the two bank accounts every local setup starts with and prints a
//! development bearer token for an admin user.
//!
//! Usage: cargo run --bin seeder

use agencia_db::repositories::{BankAccountRepository, CreateBankAccountInput};
use agencia_shared::{AppConfig, JwtConfig, JwtService};
use anyhow::Context;
use rust_decimal::Decimal;
use uuid::Uuid;

/// Development admin user (consistent for all seeds).
const DEV_ADMIN_ID: &str = "00000000-0000-0000-0000-000000000001";

/// Accounts seeded on an empty database: name, bank, opening balance in cents.
const ACCOUNTS: [(&str, Option<&str>, i64); 2] = [
    ("Caixa", None, 100_000),
    ("Banco X", Some("Banco X S.A."), 0),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("failed to load configuration")?;

    println!("Connecting to database...");
    let db = agencia_db::connect(&config.database)
        .await
        .context("failed to connect to database")?;

    println!("Seeding bank accounts...");
    seed_bank_accounts(BankAccountRepository::new(db)).await?;

    let jwt = JwtService::new(JwtConfig::from(&config.jwt));
    let admin = Uuid::parse_str(DEV_ADMIN_ID)?;
    let token = jwt
        .generate_access_token(admin, "admin")
        .context("failed to sign development token")?;
    println!("Development admin token (expires in {} s):", config.jwt.access_token_expiry_secs);
    println!("  {token}");

    println!("Seeding complete!");
    Ok(())
}

/// Creates the seed accounts that do not exist yet, matched by name.
async fn seed_bank_accounts(repo: BankAccountRepository) -> anyhow::Result<()> {
    let existing = repo.list_active().await?;

    for (name, bank, opening_cents) in ACCOUNTS {
        if existing.iter().any(|a| a.name == name) {
            println!("  {name} already exists, skipping...");
            continue;
        }

        let account = repo
            .create(CreateBankAccountInput {
                name: name.to_string(),
                bank: bank.map(ToString::to_string),
                opening_balance: Some(Decimal::new(opening_cents, 2)),
                ..CreateBankAccountInput::default()
            })
            .await?;
        println!("  Created {} with balance {}", account.name, account.balance);
    }

    Ok(())
}
