//! Sale-to-ledger bridge repository.
//!
//! Persists the obligations derived by `agencia_core::sale`: confirmation
//! accounts, one shadow financial account per payment plan, and supplier
//! commissions on plan liquidation. No bank balance moves here.

use agencia_core::ledger::{AccountSide, LedgerError};
use agencia_core::sale::{
    PlanSnapshot, PlanStatus, Receiver, SaleError, SaleSnapshot, SaleStatus, SellerCommission,
    ShadowState, ShadowSync, check_plan_liquidation, confirmation_accounts, plan_removal,
    shadow_account, supplier_commission, sync_shadow, validate_plan_amount,
};
use agencia_shared::types::{BankAccountId, PaymentPlanId, SaleId, UserId};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::{info, warn};
use uuid::Uuid;

use super::error::RepositoryError;
use super::financial_account::{insert_account, obligation_of, shadow_state};
use crate::entities::sea_orm_active_enums::{PlanStatusDb, SaleStatusDb};
use crate::entities::{
    bank_accounts, financial_accounts, payment_plans, sale_commissions, sale_sellers, sales,
};

/// Input for a new payment plan installment.
#[derive(Debug, Clone)]
pub struct NewPlanInput {
    /// Installment description.
    pub description: String,
    /// Installment amount.
    pub amount: Decimal,
    /// Due date.
    pub due_date: NaiveDate,
    /// Payment method label.
    pub payment_method: Option<String>,
    /// Payment condition label.
    pub payment_condition: Option<String>,
    /// Who receives the money.
    pub receiver: Receiver,
    /// Free reference to the payer.
    pub payer_reference: Option<String>,
}

/// Plan edit. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdatePlanInput {
    /// Installment description.
    pub description: Option<String>,
    /// Installment amount.
    pub amount: Option<Decimal>,
    /// Due date.
    pub due_date: Option<NaiveDate>,
    /// Payment method label.
    pub payment_method: Option<String>,
    /// Payment condition label.
    pub payment_condition: Option<String>,
    /// Who receives the money.
    pub receiver: Option<Receiver>,
    /// Free reference to the payer.
    pub payer_reference: Option<String>,
}

/// Input for liquidating a payment plan.
#[derive(Debug, Clone)]
pub struct PlanLiquidationInput {
    /// Bank account stamped on the plan.
    pub bank_account_id: Option<BankAccountId>,
    /// Liquidation date.
    pub liquidation_date: NaiveDate,
    /// Free notes.
    pub notes: Option<String>,
}

/// A confirmed sale with the obligations it raised.
#[derive(Debug, Clone)]
pub struct ConfirmationOutcome {
    /// Sale row after confirmation.
    pub sale: sales::Model,
    /// Receivable, supplier payable and seller commission payables.
    pub accounts: Vec<financial_accounts::Model>,
}

/// A payment plan with its shadow financial account.
#[derive(Debug, Clone)]
pub struct PlanWithShadow {
    /// Plan row.
    pub plan: payment_plans::Model,
    /// Shadow financial account.
    pub shadow: financial_accounts::Model,
}

/// Result of a plan liquidation.
#[derive(Debug, Clone)]
pub struct PlanLiquidationOutcome {
    /// Plan row after liquidation.
    pub plan: payment_plans::Model,
    /// Shadow financial account, created if it was missing.
    pub shadow: financial_accounts::Model,
    /// Supplier commission, for `FORNECEDOR` installments.
    pub commission: Option<sale_commissions::Model>,
}

fn plan_snapshot(model: &payment_plans::Model) -> PlanSnapshot {
    PlanSnapshot {
        id: PaymentPlanId::from_uuid(model.id),
        sale_id: SaleId::from_uuid(model.sale_id),
        description: model.description.clone(),
        amount: model.amount,
        due_date: model.due_date,
        receiver: model.receiver.into(),
        status: model.status.into(),
    }
}

/// Loads a sale with its sellers, optionally locking the sale row.
async fn load_sale<C: ConnectionTrait>(
    conn: &C,
    id: SaleId,
    lock: bool,
) -> Result<(sales::Model, SaleSnapshot), RepositoryError> {
    let mut query = sales::Entity::find_by_id(id.into_inner());
    if lock {
        query = query.lock_exclusive();
    }
    let sale = query.one(conn).await?.ok_or(SaleError::NotFound(id))?;

    let sellers = sale
        .find_related(sale_sellers::Entity)
        .all(conn)
        .await?
        .into_iter()
        .map(|seller| SellerCommission {
            user_id: UserId::from_uuid(seller.user_id),
            amount: seller.commission_amount,
        })
        .collect();

    let snapshot = SaleSnapshot {
        id,
        client_id: sale.client_id,
        supplier_id: sale.supplier_id,
        total_amount: sale.total_amount,
        total_cost: sale.total_cost,
        status: sale.status.into(),
        sellers,
    };
    Ok((sale, snapshot))
}

async fn lock_plan<C: ConnectionTrait>(
    conn: &C,
    id: PaymentPlanId,
) -> Result<payment_plans::Model, RepositoryError> {
    let plan = payment_plans::Entity::find_by_id(id.into_inner())
        .lock_exclusive()
        .one(conn)
        .await?
        .ok_or(SaleError::PlanNotFound(id))?;
    Ok(plan)
}

async fn find_shadow<C: ConnectionTrait>(
    conn: &C,
    plan_id: Uuid,
) -> Result<Option<financial_accounts::Model>, RepositoryError> {
    let shadow = financial_accounts::Entity::find()
        .filter(financial_accounts::Column::PaymentPlanId.eq(plan_id))
        .lock_exclusive()
        .one(conn)
        .await?;
    Ok(shadow)
}

/// Repository for the sale-to-ledger bridge.
#[derive(Debug, Clone)]
pub struct SaleBridgeRepository {
    db: DatabaseConnection,
}

impl SaleBridgeRepository {
    /// Creates a new bridge repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Confirms a quote as a sale and raises its obligations.
    ///
    /// # Errors
    ///
    /// Returns `SaleNotFound`, `SaleAlreadyConfirmed`, `SaleCancelled`,
    /// `InvalidSaleTotal` or a database error.
    pub async fn confirm(
        &self,
        sale_id: SaleId,
        due_date: NaiveDate,
    ) -> Result<ConfirmationOutcome, RepositoryError> {
        let txn = self.db.begin().await?;

        let (sale, snapshot) = load_sale(&txn, sale_id, true).await?;
        let new_accounts = match confirmation_accounts(&snapshot, due_date) {
            Ok(accounts) => accounts,
            Err(err) => {
                warn!(sale_id = %sale_id, error = %err, "Sale confirmation rejected");
                return Err(err.into());
            }
        };

        let mut active: sales::ActiveModel = sale.into();
        active.status = Set(SaleStatusDb::from(SaleStatus::Venda));
        active.updated_at = Set(Utc::now().into());
        let sale = active.update(&txn).await?;

        let mut accounts = Vec::with_capacity(new_accounts.len());
        for input in new_accounts {
            accounts.push(insert_account(&txn, input).await?);
        }

        txn.commit().await?;

        info!(sale_id = %sale_id, accounts = accounts.len(), "Sale confirmed");
        Ok(ConfirmationOutcome { sale, accounts })
    }

    /// Lists the payment plans of a sale by due date.
    ///
    /// # Errors
    ///
    /// Returns `SaleNotFound` or a database error.
    pub async fn list_plans(
        &self,
        sale_id: SaleId,
    ) -> Result<Vec<payment_plans::Model>, RepositoryError> {
        let (sale, _) = load_sale(&self.db, sale_id, false).await?;
        let plans = sale
            .find_related(payment_plans::Entity)
            .order_by_asc(payment_plans::Column::DueDate)
            .order_by_asc(payment_plans::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(plans)
    }

    /// Lists the commission records of a sale.
    ///
    /// # Errors
    ///
    /// Returns `SaleNotFound` or a database error.
    pub async fn list_commissions(
        &self,
        sale_id: SaleId,
    ) -> Result<Vec<sale_commissions::Model>, RepositoryError> {
        let (sale, _) = load_sale(&self.db, sale_id, false).await?;
        let commissions = sale
            .find_related(sale_commissions::Entity)
            .order_by_asc(sale_commissions::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(commissions)
    }

    /// Creates a plan installment together with its shadow account.
    ///
    /// # Errors
    ///
    /// Returns `SaleNotFound`, `InvalidAmount` or a database error.
    pub async fn create_plan(
        &self,
        sale_id: SaleId,
        input: NewPlanInput,
    ) -> Result<PlanWithShadow, RepositoryError> {
        let amount = validate_plan_amount(input.amount)?;
        let txn = self.db.begin().await?;
        let (_, sale) = load_sale(&txn, sale_id, false).await?;

        let now = Utc::now().into();
        let plan = payment_plans::ActiveModel {
            id: Set(Uuid::now_v7()),
            sale_id: Set(sale_id.into_inner()),
            description: Set(input.description),
            amount: Set(amount),
            due_date: Set(input.due_date),
            payment_method: Set(input.payment_method),
            payment_condition: Set(input.payment_condition),
            receiver: Set(input.receiver.into()),
            payer_reference: Set(input.payer_reference),
            status: Set(PlanStatusDb::from(PlanStatus::Pendente)),
            paid_amount: Set(Decimal::ZERO),
            open_amount: Set(amount),
            bank_account_id: Set(None),
            liquidation_date: Set(None),
            liquidation_notes: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let shadow = insert_account(&txn, shadow_account(&plan_snapshot(&plan), &sale)).await?;
        txn.commit().await?;

        info!(
            payment_plan_id = %plan.id,
            sale_id = %sale_id,
            amount = %plan.amount,
            financial_account_id = %shadow.id,
            "Payment plan created"
        );
        Ok(PlanWithShadow { plan, shadow })
    }

    /// Edits a plan and keeps its shadow account in step.
    ///
    /// # Errors
    ///
    /// Returns `PaymentPlanNotFound`, `PlanAlreadyLiquidated`,
    /// `ShadowAccountLiquidated`, `InvalidAmount` or a database error.
    pub async fn update_plan(
        &self,
        plan_id: PaymentPlanId,
        input: UpdatePlanInput,
    ) -> Result<PlanWithShadow, RepositoryError> {
        let txn = self.db.begin().await?;

        let plan = lock_plan(&txn, plan_id).await?;
        let (_, sale) = load_sale(&txn, SaleId::from_uuid(plan.sale_id), false).await?;
        let shadow = find_shadow(&txn, plan.id).await?;

        let current = plan_snapshot(&plan);
        let mut updated = current.clone();
        if let Some(description) = &input.description {
            updated.description.clone_from(description);
        }
        if let Some(amount) = input.amount {
            updated.amount = amount;
        }
        if let Some(due_date) = input.due_date {
            updated.due_date = due_date;
        }
        if let Some(receiver) = input.receiver {
            updated.receiver = receiver;
        }

        let state = shadow.as_ref().map(shadow_state);
        let sync = match sync_shadow(&current, &updated, &sale, state.as_ref()) {
            Ok(sync) => sync,
            Err(err) => {
                warn!(payment_plan_id = %plan_id, error = %err, "Payment plan update rejected");
                return Err(err.into());
            }
        };
        let amount = validate_plan_amount(updated.amount)?;

        let shadow = match sync {
            ShadowSync::Create(create) => insert_account(&txn, create).await?,
            ShadowSync::Recreate { remove, create } => {
                financial_accounts::Entity::delete_by_id(remove.into_inner())
                    .exec(&txn)
                    .await?;
                insert_account(&txn, create).await?
            }
            ShadowSync::Patch {
                id,
                obligation,
                due_date,
                description,
            } => {
                financial_accounts::ActiveModel {
                    id: Set(id.into_inner()),
                    total_amount: Set(obligation.total),
                    liquidated_amount: Set(obligation.liquidated),
                    open_amount: Set(obligation.open),
                    status: Set(obligation.status().into()),
                    due_date: Set(due_date),
                    description: Set(description),
                    updated_at: Set(Utc::now().into()),
                    ..Default::default()
                }
                .update(&txn)
                .await?
            }
        };

        let mut active: payment_plans::ActiveModel = plan.into();
        active.description = Set(updated.description);
        active.amount = Set(amount);
        active.open_amount = Set(amount);
        active.due_date = Set(updated.due_date);
        active.receiver = Set(updated.receiver.into());
        if let Some(method) = input.payment_method {
            active.payment_method = Set(Some(method));
        }
        if let Some(condition) = input.payment_condition {
            active.payment_condition = Set(Some(condition));
        }
        if let Some(reference) = input.payer_reference {
            active.payer_reference = Set(Some(reference));
        }
        active.updated_at = Set(Utc::now().into());
        let plan = active.update(&txn).await?;

        txn.commit().await?;

        info!(
            payment_plan_id = %plan_id,
            amount = %plan.amount,
            financial_account_id = %shadow.id,
            open = %obligation_of(&shadow).open,
            "Payment plan updated"
        );
        Ok(PlanWithShadow { plan, shadow })
    }

    /// Deletes a plan and its shadow account.
    ///
    /// # Errors
    ///
    /// Returns `PaymentPlanNotFound`, `PlanAlreadyLiquidated`,
    /// `ShadowAccountLiquidated` or a database error.
    pub async fn delete_plan(&self, plan_id: PaymentPlanId) -> Result<(), RepositoryError> {
        let txn = self.db.begin().await?;

        let plan = lock_plan(&txn, plan_id).await?;
        let shadow = find_shadow(&txn, plan.id).await?;
        let state: Option<ShadowState> = shadow.as_ref().map(shadow_state);

        if let Err(err) = plan_removal(&plan_snapshot(&plan), state.as_ref()) {
            warn!(payment_plan_id = %plan_id, error = %err, "Payment plan deletion rejected");
            return Err(err.into());
        }

        if let Some(shadow) = shadow {
            shadow.delete(&txn).await?;
        }
        plan.delete(&txn).await?;
        txn.commit().await?;

        info!(payment_plan_id = %plan_id, "Payment plan deleted");
        Ok(())
    }

    /// Marks a plan as liquidated, ensures its shadow account and records the
    /// supplier commission for `FORNECEDOR` installments.
    ///
    /// # Errors
    ///
    /// Returns `PaymentPlanNotFound`, `PlanAlreadyLiquidated`,
    /// `AccountNotFound` for an unknown bank account, or a database error.
    pub async fn liquidate_plan(
        &self,
        plan_id: PaymentPlanId,
        input: PlanLiquidationInput,
        acting_user: UserId,
    ) -> Result<PlanLiquidationOutcome, RepositoryError> {
        let txn = self.db.begin().await?;

        let plan = lock_plan(&txn, plan_id).await?;
        let snapshot = plan_snapshot(&plan);
        if let Err(err) = check_plan_liquidation(&snapshot) {
            warn!(payment_plan_id = %plan_id, error = %err, "Payment plan liquidation rejected");
            return Err(err.into());
        }

        if let Some(bank_account_id) = input.bank_account_id {
            bank_accounts::Entity::find_by_id(bank_account_id.into_inner())
                .one(&txn)
                .await?
                .ok_or(LedgerError::AccountNotFound {
                    account_id: bank_account_id,
                    side: AccountSide::Settlement,
                })?;
        }

        let (_, sale) = load_sale(&txn, snapshot.sale_id, false).await?;

        let shadow = match find_shadow(&txn, plan.id).await? {
            Some(shadow) => shadow,
            None => insert_account(&txn, shadow_account(&snapshot, &sale)).await?,
        };

        let amount = plan.amount;
        let mut active: payment_plans::ActiveModel = plan.into();
        active.status = Set(PlanStatusDb::from(PlanStatus::Liquidado));
        active.paid_amount = Set(amount);
        active.open_amount = Set(Decimal::ZERO);
        active.liquidation_date = Set(Some(input.liquidation_date));
        active.liquidation_notes = Set(input.notes);
        active.bank_account_id = Set(input.bank_account_id.map(BankAccountId::into_inner));
        active.updated_at = Set(Utc::now().into());
        let plan = active.update(&txn).await?;

        let commission = match supplier_commission(&sale, &snapshot, acting_user) {
            Some(new) => Some(
                sale_commissions::ActiveModel {
                    id: Set(Uuid::now_v7()),
                    sale_id: Set(new.sale_id.into_inner()),
                    payment_plan_id: Set(new.payment_plan_id.map(PaymentPlanId::into_inner)),
                    beneficiary_user_id: Set(new.beneficiary.into_inner()),
                    commission_type: Set(new.commission_type),
                    percentage: Set(new.percentage),
                    amount: Set(new.amount),
                    expected_date: Set(Some(new.expected_date)),
                    received_date: Set(None),
                    status: Set(new.status.into()),
                    created_at: Set(Utc::now().into()),
                }
                .insert(&txn)
                .await?,
            ),
            None => None,
        };

        txn.commit().await?;

        info!(
            payment_plan_id = %plan_id,
            amount = %amount,
            financial_account_id = %shadow.id,
            commission = ?commission.as_ref().map(|c| c.amount),
            "Payment plan liquidated"
        );
        Ok(PlanLiquidationOutcome {
            plan,
            shadow,
            commission,
        })
    }
}
