//! Direct ledger routes.

use agencia_core::ledger::Direction;
use agencia_db::entities::bank_transactions;
use agencia_db::entities::sea_orm_active_enums::TransactionDirection;
use agencia_db::repositories::{AppendEntryInput, LedgerRepository};
use agencia_shared::types::BankAccountId;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{post, put},
};
use chrono::{DateTime, FixedOffset, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::extractors::{ValidatedJson, money_scale};
use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Creates the bank transaction routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bank-transactions", post(append_transaction))
        .route("/bank-transactions/{id}/reconcile", put(reconcile_transaction))
}

/// Request body for a direct ledger append.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AppendTransactionRequest {
    /// Account to post to.
    pub conta_bancaria_id: BankAccountId,
    /// Row description.
    #[validate(length(min = 1, max = 255))]
    pub descricao: String,
    /// Positive amount.
    #[validate(custom(function = "money_scale"))]
    pub valor: Decimal,
    /// `entrada` or `saida`.
    pub tipo: Direction,
    /// Business date.
    pub data_transacao: NaiveDate,
    /// Linked financial account.
    pub conta_financeira_id: Option<Uuid>,
    /// Free notes.
    pub observacoes: Option<String>,
    /// Attachment references.
    #[serde(default)]
    pub anexos: Vec<String>,
}

/// Request body for the reconciled flag.
#[derive(Debug, Deserialize, Validate)]
pub struct ReconcileRequest {
    /// New flag value.
    pub conciliado: bool,
}

/// One ledger row.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BankTransactionResponse {
    /// Row ID.
    pub id: Uuid,
    /// Account the row belongs to.
    pub conta_bancaria_id: Uuid,
    /// Settled financial account, if any.
    pub conta_financeira_id: Option<Uuid>,
    /// Description.
    pub descricao: String,
    /// Positive amount.
    pub valor: Decimal,
    /// Direction.
    pub tipo: TransactionDirection,
    /// Business date.
    pub data_transacao: NaiveDate,
    /// Balance before the row.
    pub saldo_anterior: Decimal,
    /// Balance after the row.
    pub saldo_posterior: Decimal,
    /// Reconciled flag.
    pub conciliado: bool,
    /// Attachment references.
    pub anexos: serde_json::Value,
    /// Free notes.
    pub observacoes: Option<String>,
    /// Write timestamp.
    pub created_at: DateTime<FixedOffset>,
}

impl From<bank_transactions::Model> for BankTransactionResponse {
    fn from(model: bank_transactions::Model) -> Self {
        Self {
            id: model.id,
            conta_bancaria_id: model.bank_account_id,
            conta_financeira_id: model.financial_account_id,
            descricao: model.description,
            valor: model.amount,
            tipo: model.direction,
            data_transacao: model.transaction_date,
            saldo_anterior: model.balance_before,
            saldo_posterior: model.balance_after,
            conciliado: model.reconciled,
            anexos: model.attachments,
            observacoes: model.notes,
            created_at: model.created_at,
        }
    }
}

/// POST `/bank-transactions` - Append a movement to an account (admin).
async fn append_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    body: Result<ValidatedJson<AppendTransactionRequest>, ApiError>,
) -> Result<(StatusCode, Json<BankTransactionResponse>), ApiError> {
    auth.require_any_role(&state.ledger.elevated_roles)?;
    let ValidatedJson(req) = body?;

    let entry = LedgerRepository::new((*state.db).clone())
        .append(AppendEntryInput {
            bank_account_id: req.conta_bancaria_id,
            description: req.descricao,
            amount: req.valor,
            direction: req.tipo,
            transaction_date: req.data_transacao,
            financial_account_id: req.conta_financeira_id,
            notes: req.observacoes,
            attachments: req.anexos,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(entry.into())))
}

/// PUT `/bank-transactions/{id}/reconcile` - Set the reconciled flag.
async fn reconcile_transaction(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<ReconcileRequest>,
) -> Result<Json<BankTransactionResponse>, ApiError> {
    let entry = LedgerRepository::new((*state.db).clone())
        .set_reconciled(id, req.conciliado)
        .await?;
    Ok(Json(entry.into()))
}
