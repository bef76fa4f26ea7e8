//! Financial account repository.
//!
//! Liquidation locks the financial account row first and the bank account row
//! second, updates the obligation and appends the settlement ledger row in one
//! database transaction.

use agencia_core::financial::{
    FinancialDirection, FinancialError, FinancialStatus, NewFinancialAccount, Obligation,
    Reference, settlement_description,
};
use agencia_core::ledger::{AccountSide, LedgerError, validate_amount};
use agencia_core::sale::ShadowState;
use agencia_shared::OverpaymentPolicy;
use agencia_shared::types::{
    BankAccountId, FinancialAccountId, PageRequest, PageResponse, PaymentPlanId, SaleId, UserId,
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
    TransactionTrait,
};
use tracing::{info, warn};
use uuid::Uuid;

use super::error::RepositoryError;
use super::idempotency::{self, Claim};
use super::ledger::{EntryDetails, account_state, lock_account, write_posting};
use crate::entities::sea_orm_active_enums::{
    FinancialAccountDirection, FinancialAccountStatus, IdempotencyScope,
};
use crate::entities::{bank_transactions, financial_accounts, payment_plans, sales};

/// Filters for listing financial accounts.
#[derive(Debug, Clone, Copy, Default)]
pub struct FinancialAccountFilter {
    /// Only accounts spawned by this sale.
    pub sale_id: Option<SaleId>,
    /// Only accounts in this status.
    pub status: Option<FinancialStatus>,
    /// Only payables or only receivables.
    pub direction: Option<FinancialDirection>,
}

/// Input for liquidating a financial account.
#[derive(Debug, Clone)]
pub struct LiquidationInput {
    /// Amount settled now.
    pub amount: Decimal,
    /// Bank account the money moves through.
    pub bank_account_id: BankAccountId,
    /// Business date of the settlement.
    pub liquidation_date: NaiveDate,
    /// Category to stamp on the account.
    pub category_id: Option<Uuid>,
    /// Attachment references copied onto the ledger row.
    pub attachments: Vec<String>,
    /// Free notes copied onto the ledger row.
    pub notes: Option<String>,
}

/// Result of a liquidation.
#[derive(Debug, Clone)]
pub struct LiquidationOutcome {
    /// Financial account after the liquidation.
    pub account: financial_accounts::Model,
    /// Settlement ledger row.
    pub transaction: bank_transactions::Model,
    /// True when the result was replayed from an idempotency key.
    pub replayed: bool,
}

/// Stored amounts of a financial account row.
pub(crate) fn obligation_of(model: &financial_accounts::Model) -> Obligation {
    Obligation {
        total: model.total_amount,
        liquidated: model.liquidated_amount,
        open: model.open_amount,
    }
}

/// Shadow view of a financial account row linked to a payment plan.
pub(crate) fn shadow_state(model: &financial_accounts::Model) -> ShadowState {
    ShadowState {
        id: FinancialAccountId::from_uuid(model.id),
        direction: model.direction.into(),
        obligation: obligation_of(model),
    }
}

/// Inserts a fresh obligation: everything open, status `pendente`.
///
/// A second account for the same payment plan is rejected with
/// `PlanAlreadyLinked`.
pub(crate) async fn insert_account<C: ConnectionTrait>(
    conn: &C,
    input: NewFinancialAccount,
) -> Result<financial_accounts::Model, RepositoryError> {
    let total = input.validate()?;
    let obligation = Obligation::new(total);
    let now = Utc::now().into();
    let plan_id = input.payment_plan_id;

    let account = financial_accounts::ActiveModel {
        id: Set(Uuid::now_v7()),
        description: Set(input.description),
        sale_id: Set(input.sale_id.map(SaleId::into_inner)),
        payment_plan_id: Set(input.payment_plan_id.map(PaymentPlanId::into_inner)),
        direction: Set(input.direction.into()),
        total_amount: Set(obligation.total),
        liquidated_amount: Set(obligation.liquidated),
        open_amount: Set(obligation.open),
        due_date: Set(input.due_date),
        status: Set(obligation.status().into()),
        category_id: Set(input.category_id),
        client_id: Set(input.counterparties.client_id),
        supplier_id: Set(input.counterparties.supplier_id),
        user_id: Set(input.counterparties.user_id.map(UserId::into_inner)),
        liquidation_date: Set(None),
        last_bank_account_id: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(conn)
    .await
    .map_err(|err| match (plan_id, err.sql_err()) {
        (Some(plan_id), Some(SqlErr::UniqueConstraintViolation(_))) => {
            RepositoryError::from(FinancialError::PlanAlreadyLinked(plan_id))
        }
        _ => RepositoryError::from(err),
    })?;

    Ok(account)
}

/// Resolves the sale and payment plan a client-created account links to.
async fn check_references<C: ConnectionTrait>(
    conn: &C,
    input: &NewFinancialAccount,
) -> Result<(), RepositoryError> {
    if let Some(sale_id) = input.sale_id {
        sales::Entity::find_by_id(sale_id.into_inner())
            .one(conn)
            .await?
            .ok_or(FinancialError::ReferenceNotFound {
                reference: Reference::Sale,
                id: sale_id.into_inner(),
            })?;
    }

    if let Some(plan_id) = input.payment_plan_id {
        payment_plans::Entity::find_by_id(plan_id.into_inner())
            .lock_exclusive()
            .one(conn)
            .await?
            .ok_or(FinancialError::ReferenceNotFound {
                reference: Reference::PaymentPlan,
                id: plan_id.into_inner(),
            })?;

        let linked = financial_accounts::Entity::find()
            .filter(financial_accounts::Column::PaymentPlanId.eq(plan_id.into_inner()))
            .count(conn)
            .await?;
        if linked > 0 {
            return Err(FinancialError::PlanAlreadyLinked(plan_id).into());
        }
    }

    Ok(())
}

/// Reads a financial account with `SELECT ... FOR UPDATE`.
pub(crate) async fn lock_financial_account<C: ConnectionTrait>(
    conn: &C,
    id: FinancialAccountId,
) -> Result<financial_accounts::Model, RepositoryError> {
    let account = financial_accounts::Entity::find_by_id(id.into_inner())
        .lock_exclusive()
        .one(conn)
        .await?
        .ok_or(FinancialError::NotFound(id))?;
    Ok(account)
}

/// Repository for receivables and payables.
#[derive(Debug, Clone)]
pub struct FinancialAccountRepository {
    db: DatabaseConnection,
}

impl FinancialAccountRepository {
    /// Creates a new financial account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a receivable or payable.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTotal`, `ReferenceNotFound` for an unknown sale or
    /// payment plan, `PlanAlreadyLinked`, or a database error.
    pub async fn create(
        &self,
        input: NewFinancialAccount,
    ) -> Result<financial_accounts::Model, RepositoryError> {
        input.validate()?;

        let txn = self.db.begin().await?;
        check_references(&txn, &input).await?;
        let account = insert_account(&txn, input).await?;
        txn.commit().await?;

        info!(
            financial_account_id = %account.id,
            direction = %FinancialDirection::from(account.direction),
            total = %account.total_amount,
            "Financial account created"
        );
        Ok(account)
    }

    /// Finds a financial account by id.
    ///
    /// # Errors
    ///
    /// Returns `FinancialAccountNotFound` or a database error.
    pub async fn find(
        &self,
        id: FinancialAccountId,
    ) -> Result<financial_accounts::Model, RepositoryError> {
        let account = financial_accounts::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
            .ok_or(FinancialError::NotFound(id))?;
        Ok(account)
    }

    /// Lists accounts matching `filter`, by due date.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list(
        &self,
        filter: FinancialAccountFilter,
        page: PageRequest,
    ) -> Result<PageResponse<financial_accounts::Model>, RepositoryError> {
        let mut query = financial_accounts::Entity::find();
        if let Some(sale_id) = filter.sale_id {
            query = query.filter(financial_accounts::Column::SaleId.eq(sale_id.into_inner()));
        }
        if let Some(status) = filter.status {
            query = query
                .filter(financial_accounts::Column::Status.eq(FinancialAccountStatus::from(status)));
        }
        if let Some(direction) = filter.direction {
            query = query.filter(
                financial_accounts::Column::Direction.eq(FinancialAccountDirection::from(direction)),
            );
        }

        let total = query.clone().count(&self.db).await?;
        let rows = query
            .order_by_asc(financial_accounts::Column::DueDate)
            .order_by_asc(financial_accounts::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok(PageResponse::new(rows, page, total))
    }

    /// Settles `input.amount` of an account against a bank account.
    ///
    /// # Errors
    ///
    /// Returns `FinancialAccountNotFound`, `InvalidAmount`, `OverLiquidation`
    /// (reject policy only), `AccountNotFound` for the bank account, an
    /// idempotency error, or a database error. Nothing is written on error.
    pub async fn liquidate(
        &self,
        id: FinancialAccountId,
        input: LiquidationInput,
        policy: OverpaymentPolicy,
        idempotency_key: Option<&str>,
    ) -> Result<LiquidationOutcome, RepositoryError> {
        validate_amount(input.amount).map_err(|_| FinancialError::InvalidAmount(input.amount))?;

        let txn = self.db.begin().await?;

        if let Some(key) = idempotency_key {
            if let Claim::Replay(ids) =
                idempotency::claim(&txn, key, IdempotencyScope::Liquidation).await?
            {
                let outcome = replay(&txn, &ids).await?;
                txn.commit().await?;
                return Ok(outcome);
            }
        }

        let account = lock_financial_account(&txn, id).await?;
        let direction: FinancialDirection = account.direction.into();

        let obligation = match obligation_of(&account).liquidate(input.amount, policy) {
            Ok(obligation) => obligation,
            Err(err) => {
                warn!(financial_account_id = %id, amount = %input.amount, error = %err, "Liquidation rejected");
                return Err(err.into());
            }
        };

        let bank_account = lock_account(&txn, input.bank_account_id)
            .await?
            .ok_or(LedgerError::AccountNotFound {
                account_id: input.bank_account_id,
                side: AccountSide::Settlement,
            })?;
        let posting = account_state(&bank_account).post(direction.settlement(), input.amount)?;

        let description = settlement_description(direction, &account.description);
        let mut active: financial_accounts::ActiveModel = account.into();
        active.liquidated_amount = Set(obligation.liquidated);
        active.open_amount = Set(obligation.open);
        active.status = Set(obligation.status().into());
        active.liquidation_date = Set(Some(input.liquidation_date));
        active.last_bank_account_id = Set(Some(input.bank_account_id.into_inner()));
        if let Some(category_id) = input.category_id {
            active.category_id = Set(Some(category_id));
        }
        active.updated_at = Set(Utc::now().into());
        let account = active.update(&txn).await?;

        let (transaction, bank_after) = write_posting(
            &txn,
            bank_account,
            &posting,
            EntryDetails {
                description,
                transaction_date: input.liquidation_date,
                financial_account_id: Some(account.id),
                notes: input.notes,
                attachments: input.attachments,
                idempotency_key: idempotency_key.map(ToString::to_string),
                created_at: Utc::now().into(),
            },
        )
        .await?;

        if let Some(key) = idempotency_key {
            idempotency::record(&txn, key, &[account.id, transaction.id]).await?;
        }

        txn.commit().await?;

        info!(
            financial_account_id = %account.id,
            bank_account_id = %input.bank_account_id,
            bank_transaction_id = %transaction.id,
            amount = %posting.amount,
            open = %account.open_amount,
            balance = %bank_after.balance,
            "Financial account liquidated"
        );
        if obligation.credit() > Decimal::ZERO {
            warn!(
                financial_account_id = %account.id,
                credit = %obligation.credit(),
                "Liquidation exceeded the open amount"
            );
        }

        Ok(LiquidationOutcome {
            account,
            transaction,
            replayed: false,
        })
    }
}

/// Re-reads the account and ledger row recorded under an idempotency key.
async fn replay(
    txn: &DatabaseTransaction,
    ids: &[Uuid],
) -> Result<LiquidationOutcome, RepositoryError> {
    let missing = || DbErr::RecordNotFound("idempotent liquidation".to_string());
    let (Some(account_id), Some(transaction_id)) = (ids.first(), ids.get(1)) else {
        return Err(missing().into());
    };

    let account = financial_accounts::Entity::find_by_id(*account_id)
        .one(txn)
        .await?
        .ok_or_else(missing)?;
    let transaction = bank_transactions::Entity::find_by_id(*transaction_id)
        .one(txn)
        .await?
        .ok_or_else(missing)?;

    Ok(LiquidationOutcome {
        account,
        transaction,
        replayed: true,
    })
}
