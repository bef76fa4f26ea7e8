//! Bank account routes: store, ledger listing, reconciliation and transfers.

use agencia_core::ledger::{BalanceReport, TransferRequest};
use agencia_db::entities::bank_accounts;
use agencia_db::repositories::{
    BankAccountRepository, CreateBankAccountInput, LedgerRepository, TransferRepository,
    UpdateBankAccountInput,
};
use agencia_shared::types::BankAccountId;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::{DateTime, FixedOffset, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::bank_transactions::BankTransactionResponse;
use crate::extractors::{IdempotencyKey, ValidatedJson, ValidatedQuery, money_scale};
use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Creates the bank account routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bank-accounts", get(list_accounts).post(create_account))
        .route("/bank-accounts/transfer", post(transfer))
        .route(
            "/bank-accounts/{id}",
            get(get_account).put(update_account).delete(deactivate_account),
        )
        .route("/bank-accounts/{id}/transactions", get(list_transactions))
        .route("/bank-accounts/{id}/recalculate", post(recalculate))
}

/// Request body for creating a bank account.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBankAccountRequest {
    /// Display name.
    #[validate(length(min = 1, max = 120))]
    pub nome: String,
    /// Bank name.
    #[validate(length(max = 120))]
    pub banco: Option<String>,
    /// Branch number.
    #[validate(length(max = 20))]
    pub agencia: Option<String>,
    /// Account number.
    #[validate(length(max = 30))]
    pub conta: Option<String>,
    /// Opening balance, zero when absent.
    #[validate(custom(function = "money_scale"))]
    pub saldo: Option<Decimal>,
    /// Active flag, true when absent.
    pub ativo: Option<bool>,
}

/// Request body for a metadata edit. The balance is not editable.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateBankAccountRequest {
    /// Display name.
    #[validate(length(min = 1, max = 120))]
    pub nome: Option<String>,
    /// Bank name.
    #[validate(length(max = 120))]
    pub banco: Option<String>,
    /// Branch number.
    #[validate(length(max = 20))]
    pub agencia: Option<String>,
    /// Account number.
    #[validate(length(max = 30))]
    pub conta: Option<String>,
    /// Active flag.
    pub ativo: Option<bool>,
}

/// Date bounds for the ledger listing.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TransactionsQuery {
    /// Inclusive lower bound.
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper bound.
    pub date_to: Option<NaiveDate>,
}

/// Reconciliation switch.
#[derive(Debug, Deserialize, Validate)]
pub struct RecalculateQuery {
    /// Overwrite a drifted stored balance with the computed one.
    #[serde(default)]
    pub apply: bool,
}

/// Request body for a transfer.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TransferBody {
    /// Account money leaves.
    pub conta_origem_id: BankAccountId,
    /// Account money arrives at.
    pub conta_destino_id: BankAccountId,
    /// Amount to move.
    #[validate(custom(function = "money_scale"))]
    pub valor: Decimal,
    /// Appended to both leg descriptions.
    #[validate(length(min = 1, max = 200))]
    pub descricao: String,
    /// Stored on both legs.
    pub observacoes: Option<String>,
    /// Business date, today when absent.
    pub data_transacao: Option<NaiveDate>,
}

/// Response for a bank account.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BankAccountResponse {
    /// Account ID.
    pub id: Uuid,
    /// Display name.
    pub nome: String,
    /// Bank name.
    pub banco: Option<String>,
    /// Branch number.
    pub agencia: Option<String>,
    /// Account number.
    pub conta: Option<String>,
    /// Opening balance.
    pub saldo_inicial: Decimal,
    /// Current balance.
    pub saldo: Decimal,
    /// Number of ledger rows posted so far.
    pub versao: i64,
    /// Active flag.
    pub ativo: bool,
    /// Creation timestamp.
    pub created_at: DateTime<FixedOffset>,
    /// Last update timestamp.
    pub updated_at: DateTime<FixedOffset>,
}

impl From<bank_accounts::Model> for BankAccountResponse {
    fn from(model: bank_accounts::Model) -> Self {
        Self {
            id: model.id,
            nome: model.name,
            banco: model.bank,
            agencia: model.branch,
            conta: model.account_number,
            saldo_inicial: model.opening_balance,
            saldo: model.balance,
            versao: model.version,
            ativo: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Both legs of a transfer and the resulting balances.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferResponse {
    /// `saida` leg on the source account.
    pub transacao_saida: BankTransactionResponse,
    /// `entrada` leg on the destination account.
    pub transacao_entrada: BankTransactionResponse,
    /// Source balance after the transfer.
    pub saldo_origem: Decimal,
    /// Destination balance after the transfer.
    pub saldo_destino: Decimal,
}

fn repository(state: &AppState) -> BankAccountRepository {
    BankAccountRepository::new((*state.db).clone())
}

/// GET `/bank-accounts` - Active accounts ordered by name.
async fn list_accounts(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<Vec<BankAccountResponse>>, ApiError> {
    let accounts = repository(&state).list_active().await?;
    Ok(Json(accounts.into_iter().map(Into::into).collect()))
}

/// POST `/bank-accounts` - Create an account (admin).
async fn create_account(
    State(state): State<AppState>,
    auth: AuthUser,
    body: Result<ValidatedJson<CreateBankAccountRequest>, ApiError>,
) -> Result<(StatusCode, Json<BankAccountResponse>), ApiError> {
    auth.require_any_role(&state.ledger.elevated_roles)?;
    let ValidatedJson(req) = body?;

    let account = repository(&state)
        .create(CreateBankAccountInput {
            name: req.nome,
            bank: req.banco,
            branch: req.agencia,
            account_number: req.conta,
            opening_balance: req.saldo,
            is_active: req.ativo,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(account.into())))
}

/// GET `/bank-accounts/{id}` - One account.
async fn get_account(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<BankAccountId>,
) -> Result<Json<BankAccountResponse>, ApiError> {
    let account = repository(&state).find(id).await?;
    Ok(Json(account.into()))
}

/// PUT `/bank-accounts/{id}` - Metadata edit (admin).
async fn update_account(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<BankAccountId>,
    body: Result<ValidatedJson<UpdateBankAccountRequest>, ApiError>,
) -> Result<Json<BankAccountResponse>, ApiError> {
    auth.require_any_role(&state.ledger.elevated_roles)?;
    let ValidatedJson(req) = body?;

    let account = repository(&state)
        .update(
            id,
            UpdateBankAccountInput {
                name: req.nome,
                bank: req.banco,
                branch: req.agencia,
                account_number: req.conta,
                is_active: req.ativo,
            },
        )
        .await?;
    Ok(Json(account.into()))
}

/// DELETE `/bank-accounts/{id}` - Deactivate (admin). Ledger rows are kept.
async fn deactivate_account(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<BankAccountId>,
) -> Result<Json<BankAccountResponse>, ApiError> {
    auth.require_any_role(&state.ledger.elevated_roles)?;

    let account = repository(&state).deactivate(id).await?;
    Ok(Json(account.into()))
}

/// GET `/bank-accounts/{id}/transactions` - Ledger rows, oldest first.
async fn list_transactions(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<BankAccountId>,
    ValidatedQuery(query): ValidatedQuery<TransactionsQuery>,
) -> Result<Json<Vec<BankTransactionResponse>>, ApiError> {
    let rows = LedgerRepository::new((*state.db).clone())
        .list(id, query.date_from, query.date_to)
        .await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// POST `/bank-accounts/{id}/recalculate` - Reconciliation report (admin).
async fn recalculate(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<BankAccountId>,
    query: Result<ValidatedQuery<RecalculateQuery>, ApiError>,
) -> Result<Json<BalanceReport>, ApiError> {
    auth.require_any_role(&state.ledger.elevated_roles)?;
    let ValidatedQuery(query) = query?;

    let report = repository(&state).recalculate(id, query.apply).await?;
    Ok(Json(report))
}

/// POST `/bank-accounts/transfer` - Move money between two accounts (admin).
///
/// Answers 201 for a new transfer and 200 when an idempotency key replays one.
/// The role is checked before the header and body are.
async fn transfer(
    State(state): State<AppState>,
    auth: AuthUser,
    key: Result<IdempotencyKey, ApiError>,
    body: Result<ValidatedJson<TransferBody>, ApiError>,
) -> Result<(StatusCode, Json<TransferResponse>), ApiError> {
    auth.require_any_role(&state.ledger.elevated_roles)?;
    let key = key?;
    let ValidatedJson(req) = body?;

    let request = TransferRequest {
        source: req.conta_origem_id,
        destination: req.conta_destino_id,
        amount: req.valor,
        description: req.descricao,
        notes: req.observacoes,
    };
    let date = req.data_transacao.unwrap_or_else(super::today);

    let outcome = TransferRepository::new((*state.db).clone())
        .transfer(&request, date, key.as_deref())
        .await?;

    let status = if outcome.replayed {
        info!(user_id = %auth.user_id(), "Transfer replayed for idempotency key");
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };

    Ok((
        status,
        Json(TransferResponse {
            transacao_saida: outcome.outgoing.into(),
            transacao_entrada: outcome.incoming.into(),
            saldo_origem: outcome.source_balance,
            saldo_destino: outcome.destination_balance,
        }),
    ))
}
