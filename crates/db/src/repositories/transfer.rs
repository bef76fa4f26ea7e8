//! Transfer repository.
//!
//! Runs a transfer as one database transaction: both account rows are locked
//! in ascending id order, balances are re-read under lock, and both legs are
//! written before commit. Dropping the future before commit rolls everything back.

use std::collections::HashMap;

use agencia_core::ledger::{AccountSide, LedgerError, TransferRequest, plan_transfer};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait, QueryFilter,
    TransactionTrait,
};
use tracing::{info, warn};
use uuid::Uuid;

use super::error::RepositoryError;
use super::idempotency::{self, Claim};
use super::ledger::{EntryDetails, account_state, lock_account, write_posting};
use crate::entities::{bank_transactions, sea_orm_active_enums::IdempotencyScope};

/// Result of a transfer.
#[derive(Debug, Clone)]
pub struct TransferOutcome {
    /// `saida` row on the source account.
    pub outgoing: bank_transactions::Model,
    /// `entrada` row on the destination account.
    pub incoming: bank_transactions::Model,
    /// Source balance right after the transfer.
    pub source_balance: Decimal,
    /// Destination balance right after the transfer.
    pub destination_balance: Decimal,
    /// True when the result was replayed from an idempotency key.
    pub replayed: bool,
}

/// Repository for account-to-account transfers.
#[derive(Debug, Clone)]
pub struct TransferRepository {
    db: DatabaseConnection,
}

impl TransferRepository {
    /// Creates a new transfer repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Moves `request.amount` from the source to the destination account.
    ///
    /// # Errors
    ///
    /// Returns the first failing precondition (`InvalidAmount`, `SameAccount`,
    /// `AccountNotFound`, `InsufficientFunds`), an idempotency error, or a
    /// database error. Nothing is written on error.
    pub async fn transfer(
        &self,
        request: &TransferRequest,
        transaction_date: NaiveDate,
        idempotency_key: Option<&str>,
    ) -> Result<TransferOutcome, RepositoryError> {
        request.validate()?;

        let txn = self.db.begin().await?;

        if let Some(key) = idempotency_key {
            if let Claim::Replay(ids) = idempotency::claim(&txn, key, IdempotencyScope::Transfer).await? {
                let outcome = replay(&txn, &ids).await?;
                txn.commit().await?;
                return Ok(outcome);
            }
        }

        let mut locked = HashMap::with_capacity(2);
        for id in request.lock_order() {
            if let Some(row) = lock_account(&txn, id).await? {
                locked.insert(id, row);
            }
        }

        let source_row = locked.remove(&request.source);
        let destination_row = locked.remove(&request.destination);

        let plan = match plan_transfer(
            request,
            source_row.as_ref().map(account_state),
            destination_row.as_ref().map(account_state),
        ) {
            Ok(plan) => plan,
            Err(err) => {
                warn!(
                    source = %request.source,
                    destination = %request.destination,
                    amount = %request.amount,
                    error = %err,
                    "Transfer rejected"
                );
                return Err(err.into());
            }
        };

        // plan_transfer only succeeds when both rows were found
        let (Some(source_row), Some(destination_row)) = (source_row, destination_row) else {
            return Err(LedgerError::AccountNotFound {
                account_id: request.source,
                side: AccountSide::Source,
            }
            .into());
        };

        let created_at = Utc::now().into();
        let details = |description: String| EntryDetails {
            description,
            transaction_date,
            financial_account_id: None,
            notes: request.notes.clone(),
            attachments: Vec::new(),
            idempotency_key: idempotency_key.map(ToString::to_string),
            created_at,
        };

        let (outgoing, source_after) = write_posting(
            &txn,
            source_row,
            &plan.outgoing.posting,
            details(plan.outgoing.description.clone()),
        )
        .await?;
        let (incoming, destination_after) = write_posting(
            &txn,
            destination_row,
            &plan.incoming.posting,
            details(plan.incoming.description.clone()),
        )
        .await?;

        if let Some(key) = idempotency_key {
            idempotency::record(&txn, key, &[outgoing.id, incoming.id]).await?;
        }

        txn.commit().await?;

        info!(
            source = %request.source,
            destination = %request.destination,
            amount = %plan.outgoing.posting.amount,
            outgoing_id = %outgoing.id,
            incoming_id = %incoming.id,
            source_balance = %source_after.balance,
            destination_balance = %destination_after.balance,
            "Transfer committed"
        );

        Ok(TransferOutcome {
            outgoing,
            incoming,
            source_balance: source_after.balance,
            destination_balance: destination_after.balance,
            replayed: false,
        })
    }
}

/// Re-reads the legs of a transfer recorded under an idempotency key.
async fn replay(txn: &DatabaseTransaction, ids: &[Uuid]) -> Result<TransferOutcome, RepositoryError> {
    let rows = bank_transactions::Entity::find()
        .filter(bank_transactions::Column::Id.is_in(ids.iter().copied()))
        .all(txn)
        .await?;

    let find = |id: Option<&Uuid>| {
        id.and_then(|id| rows.iter().find(|row| row.id == *id).cloned())
            .ok_or_else(|| sea_orm::DbErr::RecordNotFound("idempotent transfer legs".to_string()))
    };
    let outgoing = find(ids.first())?;
    let incoming = find(ids.get(1))?;

    Ok(TransferOutcome {
        source_balance: outgoing.balance_after,
        destination_balance: incoming.balance_after,
        outgoing,
        incoming,
        replayed: true,
    })
}
