//! Bank transaction ledger repository.
//!
//! Every balance write goes through [`write_posting`]: the caller holds the
//! account row lock, the ledger row is inserted and the account balance and
//! version are updated in the same database transaction.

use agencia_core::financial::{FinancialError, Reference};
use agencia_core::ledger::{
    AccountSide, AccountState, Direction, LedgerError, Posting, validate_amount,
};
use agencia_shared::types::BankAccountId;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use super::error::RepositoryError;
use crate::entities::{bank_accounts, bank_transactions, financial_accounts};

/// Everything a ledger row stores besides the posting itself.
#[derive(Debug, Clone)]
pub struct EntryDetails {
    /// Row description.
    pub description: String,
    /// Business date of the movement.
    pub transaction_date: NaiveDate,
    /// Financial account settled by this movement.
    pub financial_account_id: Option<Uuid>,
    /// Free notes.
    pub notes: Option<String>,
    /// Attachment references.
    pub attachments: Vec<String>,
    /// Idempotency key of the request that produced the row.
    pub idempotency_key: Option<String>,
    /// Write timestamp. Both legs of a transfer share one.
    pub created_at: DateTimeWithTimeZone,
}

/// Input for a direct ledger append.
#[derive(Debug, Clone)]
pub struct AppendEntryInput {
    /// Account to post to.
    pub bank_account_id: BankAccountId,
    /// Row description.
    pub description: String,
    /// Positive amount.
    pub amount: Decimal,
    /// Direction of the movement.
    pub direction: Direction,
    /// Business date.
    pub transaction_date: NaiveDate,
    /// Optional linked financial account.
    pub financial_account_id: Option<Uuid>,
    /// Free notes.
    pub notes: Option<String>,
    /// Attachment references.
    pub attachments: Vec<String>,
}

/// Reads a bank account with `SELECT ... FOR UPDATE`.
pub(crate) async fn lock_account<C: ConnectionTrait>(
    conn: &C,
    id: BankAccountId,
) -> Result<Option<bank_accounts::Model>, DbErr> {
    bank_accounts::Entity::find_by_id(id.into_inner())
        .lock_exclusive()
        .one(conn)
        .await
}

/// Domain view of a locked account row.
pub(crate) fn account_state(model: &bank_accounts::Model) -> AccountState {
    AccountState {
        id: BankAccountId::from_uuid(model.id),
        name: model.name.clone(),
        balance: model.balance,
        version: model.version,
    }
}

/// Inserts the ledger row for `posting` and moves the account balance.
///
/// `account` must be the row locked in the current transaction.
pub(crate) async fn write_posting<C: ConnectionTrait>(
    conn: &C,
    account: bank_accounts::Model,
    posting: &Posting,
    details: EntryDetails,
) -> Result<(bank_transactions::Model, bank_accounts::Model), DbErr> {
    let entry = bank_transactions::ActiveModel {
        id: Set(Uuid::now_v7()),
        bank_account_id: Set(account.id),
        financial_account_id: Set(details.financial_account_id),
        description: Set(details.description),
        amount: Set(posting.amount),
        direction: Set(posting.direction.into()),
        transaction_date: Set(details.transaction_date),
        balance_before: Set(posting.snapshot.before),
        balance_after: Set(posting.snapshot.after),
        account_version: Set(posting.account_version),
        reconciled: Set(false),
        attachments: Set(json!(details.attachments)),
        notes: Set(details.notes),
        idempotency_key: Set(details.idempotency_key),
        created_at: Set(details.created_at),
    }
    .insert(conn)
    .await?;

    let mut active: bank_accounts::ActiveModel = account.into();
    active.balance = Set(posting.snapshot.after);
    active.version = Set(posting.account_version);
    active.updated_at = Set(details.created_at);
    let account = active.update(conn).await?;

    Ok((entry, account))
}

/// Repository for the bank transaction ledger.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    db: DatabaseConnection,
}

impl LedgerRepository {
    /// Creates a new ledger repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Appends one movement to an account.
    ///
    /// No sufficiency check: direct appends may overdraw an account.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount`, `AccountNotFound`, `BalanceOutOfRange`,
    /// `ReferenceNotFound` for an unknown linked financial account, or a
    /// database error.
    pub async fn append(
        &self,
        input: AppendEntryInput,
    ) -> Result<bank_transactions::Model, RepositoryError> {
        validate_amount(input.amount)?;

        let txn = self.db.begin().await?;

        let account = lock_account(&txn, input.bank_account_id)
            .await?
            .ok_or(LedgerError::AccountNotFound {
                account_id: input.bank_account_id,
                side: AccountSide::Settlement,
            })?;

        if let Some(linked) = input.financial_account_id {
            financial_accounts::Entity::find_by_id(linked)
                .one(&txn)
                .await?
                .ok_or(FinancialError::ReferenceNotFound {
                    reference: Reference::FinancialAccount,
                    id: linked,
                })?;
        }

        let mut state = account_state(&account);
        let posting = state.post(input.direction, input.amount)?;

        let (entry, _) = write_posting(
            &txn,
            account,
            &posting,
            EntryDetails {
                description: input.description,
                transaction_date: input.transaction_date,
                financial_account_id: input.financial_account_id,
                notes: input.notes,
                attachments: input.attachments,
                idempotency_key: None,
                created_at: Utc::now().into(),
            },
        )
        .await?;

        txn.commit().await?;

        info!(
            bank_transaction_id = %entry.id,
            bank_account_id = %input.bank_account_id,
            direction = %posting.direction,
            amount = %posting.amount,
            balance_after = %posting.snapshot.after,
            "Ledger entry appended"
        );

        Ok(entry)
    }

    /// Lists the ledger rows of an account, oldest first, optionally bounded by date.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` for unknown accounts or a database error.
    pub async fn list(
        &self,
        account_id: BankAccountId,
        date_from: Option<NaiveDate>,
        date_to: Option<NaiveDate>,
    ) -> Result<Vec<bank_transactions::Model>, RepositoryError> {
        bank_accounts::Entity::find_by_id(account_id.into_inner())
            .one(&self.db)
            .await?
            .ok_or(LedgerError::AccountNotFound {
                account_id,
                side: AccountSide::Path,
            })?;

        let mut query = bank_transactions::Entity::find()
            .filter(bank_transactions::Column::BankAccountId.eq(account_id.into_inner()));

        if let Some(from) = date_from {
            query = query.filter(bank_transactions::Column::TransactionDate.gte(from));
        }
        if let Some(to) = date_to {
            query = query.filter(bank_transactions::Column::TransactionDate.lte(to));
        }

        let rows = query
            .order_by_asc(bank_transactions::Column::TransactionDate)
            .order_by_asc(bank_transactions::Column::CreatedAt)
            .order_by_asc(bank_transactions::Column::AccountVersion)
            .all(&self.db)
            .await?;

        Ok(rows)
    }

    /// Sets the reconciled flag, the only mutable field of a ledger row.
    ///
    /// # Errors
    ///
    /// Returns `TransactionNotFound` or a database error.
    pub async fn set_reconciled(
        &self,
        transaction_id: Uuid,
        reconciled: bool,
    ) -> Result<bank_transactions::Model, RepositoryError> {
        let entry = bank_transactions::Entity::find_by_id(transaction_id)
            .one(&self.db)
            .await?
            .ok_or(LedgerError::TransactionNotFound(transaction_id))?;

        let mut active: bank_transactions::ActiveModel = entry.into();
        active.reconciled = Set(reconciled);
        let entry = active.update(&self.db).await?;

        info!(bank_transaction_id = %transaction_id, reconciled, "Reconciled flag updated");
        Ok(entry)
    }
}
