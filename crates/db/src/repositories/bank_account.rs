//! Bank account repository.
//!
//! Metadata edits never touch the balance. The balance only moves through the
//! ledger, or through an explicit reconciliation fix.

use agencia_core::ledger::{
    AccountSide, BalanceReport, BalanceSnapshot, LedgerError, Movement, validate_opening_balance,
};
use agencia_shared::types::BankAccountId;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use tracing::{info, warn};
use uuid::Uuid;

use super::error::RepositoryError;
use super::ledger::lock_account;
use crate::entities::{bank_accounts, bank_transactions};

/// Input for creating a bank account.
#[derive(Debug, Clone, Default)]
pub struct CreateBankAccountInput {
    /// Display name.
    pub name: String,
    /// Bank name.
    pub bank: Option<String>,
    /// Branch number.
    pub branch: Option<String>,
    /// Account number.
    pub account_number: Option<String>,
    /// Opening balance, zero when absent.
    pub opening_balance: Option<Decimal>,
    /// Active flag, true when absent.
    pub is_active: Option<bool>,
}

/// Metadata edit. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateBankAccountInput {
    /// Display name.
    pub name: Option<String>,
    /// Bank name.
    pub bank: Option<String>,
    /// Branch number.
    pub branch: Option<String>,
    /// Account number.
    pub account_number: Option<String>,
    /// Active flag.
    pub is_active: Option<bool>,
}

/// Repository for bank accounts.
#[derive(Debug, Clone)]
pub struct BankAccountRepository {
    db: DatabaseConnection,
}

impl BankAccountRepository {
    /// Creates a new bank account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists active accounts ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_active(&self) -> Result<Vec<bank_accounts::Model>, RepositoryError> {
        let accounts = bank_accounts::Entity::find()
            .filter(bank_accounts::Column::IsActive.eq(true))
            .order_by_asc(bank_accounts::Column::Name)
            .all(&self.db)
            .await?;
        Ok(accounts)
    }

    /// Finds an account by id.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` or a database error.
    pub async fn find(&self, id: BankAccountId) -> Result<bank_accounts::Model, RepositoryError> {
        let account = bank_accounts::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
            .ok_or(LedgerError::AccountNotFound {
                account_id: id,
                side: AccountSide::Path,
            })?;
        Ok(account)
    }

    /// Creates an account whose balance starts at the opening balance.
    ///
    /// # Errors
    ///
    /// Returns `NegativeOpeningBalance`, `InvalidAmount` or a database error.
    pub async fn create(
        &self,
        input: CreateBankAccountInput,
    ) -> Result<bank_accounts::Model, RepositoryError> {
        let opening = validate_opening_balance(input.opening_balance)?;
        let now = Utc::now().into();

        let account = bank_accounts::ActiveModel {
            id: Set(Uuid::now_v7()),
            name: Set(input.name),
            bank: Set(input.bank),
            branch: Set(input.branch),
            account_number: Set(input.account_number),
            opening_balance: Set(opening),
            balance: Set(opening),
            version: Set(0),
            is_active: Set(input.is_active.unwrap_or(true)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        info!(bank_account_id = %account.id, opening_balance = %opening, "Bank account created");
        Ok(account)
    }

    /// Edits account metadata.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` or a database error.
    pub async fn update(
        &self,
        id: BankAccountId,
        input: UpdateBankAccountInput,
    ) -> Result<bank_accounts::Model, RepositoryError> {
        let account = self.find(id).await?;
        let mut active: bank_accounts::ActiveModel = account.into();

        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(bank) = input.bank {
            active.bank = Set(Some(bank));
        }
        if let Some(branch) = input.branch {
            active.branch = Set(Some(branch));
        }
        if let Some(number) = input.account_number {
            active.account_number = Set(Some(number));
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Deactivates an account. Accounts are never deleted.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` or a database error.
    pub async fn deactivate(&self, id: BankAccountId) -> Result<bank_accounts::Model, RepositoryError> {
        let account = self
            .update(
                id,
                UpdateBankAccountInput {
                    is_active: Some(false),
                    ..UpdateBankAccountInput::default()
                },
            )
            .await?;
        info!(bank_account_id = %id, "Bank account deactivated");
        Ok(account)
    }

    /// Recomputes the balance from the opening balance and the ledger.
    ///
    /// Runs under the account row lock. With `apply`, a drifted stored
    /// balance is overwritten with the computed one.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` or a database error.
    pub async fn recalculate(
        &self,
        id: BankAccountId,
        apply: bool,
    ) -> Result<BalanceReport, RepositoryError> {
        let txn = self.db.begin().await?;

        let account = lock_account(&txn, id).await?.ok_or(LedgerError::AccountNotFound {
            account_id: id,
            side: AccountSide::Path,
        })?;

        let movements: Vec<Movement> = bank_transactions::Entity::find()
            .filter(bank_transactions::Column::BankAccountId.eq(account.id))
            .order_by_asc(bank_transactions::Column::AccountVersion)
            .all(&txn)
            .await?
            .into_iter()
            .map(|row| Movement {
                direction: row.direction.into(),
                amount: row.amount,
                snapshot: BalanceSnapshot {
                    before: row.balance_before,
                    after: row.balance_after,
                },
            })
            .collect();

        let mut report =
            BalanceReport::compute(id, account.opening_balance, account.balance, &movements);

        if report.has_drift() {
            warn!(
                bank_account_id = %id,
                stored = %report.stored,
                computed = %report.computed,
                drift = %report.drift,
                "Balance drift detected"
            );
        }

        if apply && report.has_drift() {
            let mut active: bank_accounts::ActiveModel = account.into();
            active.balance = Set(report.computed);
            active.updated_at = Set(Utc::now().into());
            active.update(&txn).await?;
            report.applied = true;
            info!(bank_account_id = %id, balance = %report.computed, "Balance fixed from ledger");
        }

        txn.commit().await?;
        Ok(report)
    }
}
