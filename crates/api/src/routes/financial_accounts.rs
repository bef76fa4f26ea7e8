//! Financial account routes: receivables, payables and their liquidation.

use agencia_core::financial::{
    Counterparties, FinancialDirection, FinancialStatus, NewFinancialAccount,
};
use agencia_db::entities::financial_accounts;
use agencia_db::entities::sea_orm_active_enums::{
    FinancialAccountDirection, FinancialAccountStatus,
};
use agencia_db::repositories::{
    FinancialAccountFilter, FinancialAccountRepository, LiquidationInput,
};
use agencia_shared::types::pagination::MAX_PER_PAGE;
use agencia_shared::types::{
    BankAccountId, FinancialAccountId, PageRequest, PageResponse, PaymentPlanId, SaleId, UserId,
};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
};
use chrono::{DateTime, FixedOffset, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::extractors::{IdempotencyKey, ValidatedJson, ValidatedQuery, money_scale};
use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Creates the financial account routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/financial-accounts",
            get(list_financial_accounts).post(create_financial_account),
        )
        .route("/financial-accounts/{id}", get(get_financial_account))
        .route("/financial-accounts/{id}/liquidate", put(liquidate))
}

/// Query parameters for listing financial accounts.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ListFinancialAccountsQuery {
    /// Only accounts spawned by this sale.
    pub venda_id: Option<SaleId>,
    /// `pendente`, `parcial` or `liquidado`.
    pub status: Option<FinancialStatus>,
    /// `pagar` or `receber`.
    pub tipo: Option<FinancialDirection>,
    /// Page number, from 1.
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    /// Page size.
    #[validate(range(min = 1, max = MAX_PER_PAGE))]
    pub limit: Option<u32>,
}

/// Request body for creating a financial account.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateFinancialAccountRequest {
    /// Description shown in listings.
    #[validate(length(min = 1, max = 255))]
    pub descricao: String,
    /// Amount owed.
    #[validate(custom(function = "money_scale"))]
    pub valor_total: Decimal,
    /// `pagar` or `receber`.
    pub tipo: FinancialDirection,
    /// Due date.
    pub data_vencimento: NaiveDate,
    /// Client owing a receivable.
    pub cliente_id: Option<Uuid>,
    /// Supplier owed a payable.
    pub fornecedor_id: Option<Uuid>,
    /// User owed a commission.
    pub usuario_id: Option<UserId>,
    /// Sale that spawned it.
    pub venda_id: Option<SaleId>,
    /// Payment plan it shadows.
    pub plano_pagamento_id: Option<PaymentPlanId>,
    /// Reporting category.
    pub categoria_id: Option<Uuid>,
}

/// Request body for a liquidation.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LiquidateRequest {
    /// Amount settled now.
    #[validate(custom(function = "money_scale"))]
    pub valor: Decimal,
    /// Bank account the money moves through.
    pub conta_bancaria_id: BankAccountId,
    /// Settlement date, today when absent.
    pub data_liquidacao: Option<NaiveDate>,
    /// Category to stamp on the account.
    pub categoria_id: Option<Uuid>,
    /// Attachment references.
    #[serde(default)]
    pub anexos: Vec<String>,
    /// Free notes for the ledger row.
    pub observacoes: Option<String>,
}

/// Response for a financial account.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialAccountResponse {
    /// Account ID.
    pub id: Uuid,
    /// Description.
    pub descricao: String,
    /// `pagar` or `receber`.
    pub tipo: FinancialAccountDirection,
    /// Amount owed.
    pub valor_total: Decimal,
    /// Amount settled so far.
    pub valor_liquidado: Decimal,
    /// Amount still open. Negative after an over-payment.
    pub valor_aberto: Decimal,
    /// Over-paid amount held as credit.
    pub credito: Decimal,
    /// Settlement status.
    pub status: FinancialAccountStatus,
    /// Due date.
    pub data_vencimento: NaiveDate,
    /// Date of the latest liquidation.
    pub data_liquidacao: Option<NaiveDate>,
    /// Bank account of the latest liquidation.
    pub conta_bancaria_id: Option<Uuid>,
    /// Sale that spawned it.
    pub venda_id: Option<Uuid>,
    /// Payment plan it shadows.
    pub plano_pagamento_id: Option<Uuid>,
    /// Reporting category.
    pub categoria_id: Option<Uuid>,
    /// Client.
    pub cliente_id: Option<Uuid>,
    /// Supplier.
    pub fornecedor_id: Option<Uuid>,
    /// Commissioned user.
    pub usuario_id: Option<Uuid>,
    /// Creation timestamp.
    pub created_at: DateTime<FixedOffset>,
    /// Last update timestamp.
    pub updated_at: DateTime<FixedOffset>,
}

impl From<financial_accounts::Model> for FinancialAccountResponse {
    fn from(model: financial_accounts::Model) -> Self {
        Self {
            id: model.id,
            descricao: model.description,
            tipo: model.direction,
            valor_total: model.total_amount,
            valor_liquidado: model.liquidated_amount,
            valor_aberto: model.open_amount,
            credito: (-model.open_amount).max(Decimal::ZERO),
            status: model.status,
            data_vencimento: model.due_date,
            data_liquidacao: model.liquidation_date,
            conta_bancaria_id: model.last_bank_account_id,
            venda_id: model.sale_id,
            plano_pagamento_id: model.payment_plan_id,
            categoria_id: model.category_id,
            cliente_id: model.client_id,
            fornecedor_id: model.supplier_id,
            usuario_id: model.user_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// A liquidated account, with the id of its settlement ledger row.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiquidationResponse {
    /// Financial account after the liquidation.
    #[serde(flatten)]
    pub conta_financeira: FinancialAccountResponse,
    /// Settlement row on the bank account.
    pub transacao_id: Uuid,
}

fn repository(state: &AppState) -> FinancialAccountRepository {
    FinancialAccountRepository::new((*state.db).clone())
}

/// GET `/financial-accounts` - Paginated list, by due date.
async fn list_financial_accounts(
    State(state): State<AppState>,
    _auth: AuthUser,
    ValidatedQuery(query): ValidatedQuery<ListFinancialAccountsQuery>,
) -> Result<Json<PageResponse<FinancialAccountResponse>>, ApiError> {
    let filter = FinancialAccountFilter {
        sale_id: query.venda_id,
        status: query.status,
        direction: query.tipo,
    };
    let page = repository(&state)
        .list(filter, PageRequest::new(query.page, query.limit))
        .await?;
    Ok(Json(page.map(Into::into)))
}

/// POST `/financial-accounts` - Create a receivable or payable.
async fn create_financial_account(
    State(state): State<AppState>,
    _auth: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateFinancialAccountRequest>,
) -> Result<(StatusCode, Json<FinancialAccountResponse>), ApiError> {
    let account = repository(&state)
        .create(NewFinancialAccount {
            description: req.descricao,
            total: req.valor_total,
            direction: req.tipo,
            due_date: req.data_vencimento,
            counterparties: Counterparties {
                client_id: req.cliente_id,
                supplier_id: req.fornecedor_id,
                user_id: req.usuario_id,
            },
            sale_id: req.venda_id,
            payment_plan_id: req.plano_pagamento_id,
            category_id: req.categoria_id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(account.into())))
}

/// GET `/financial-accounts/{id}` - One account.
async fn get_financial_account(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<FinancialAccountId>,
) -> Result<Json<FinancialAccountResponse>, ApiError> {
    let account = repository(&state).find(id).await?;
    Ok(Json(account.into()))
}

/// PUT `/financial-accounts/{id}/liquidate` - Settle part or all of the open amount.
async fn liquidate(
    State(state): State<AppState>,
    auth: AuthUser,
    key: IdempotencyKey,
    Path(id): Path<FinancialAccountId>,
    ValidatedJson(req): ValidatedJson<LiquidateRequest>,
) -> Result<Json<LiquidationResponse>, ApiError> {
    let outcome = repository(&state)
        .liquidate(
            id,
            LiquidationInput {
                amount: req.valor,
                bank_account_id: req.conta_bancaria_id,
                liquidation_date: req.data_liquidacao.unwrap_or_else(super::today),
                category_id: req.categoria_id,
                attachments: req.anexos,
                notes: req.observacoes,
            },
            state.ledger.overpayment_policy,
            key.as_deref(),
        )
        .await?;

    if outcome.replayed {
        info!(
            financial_account_id = %id,
            user_id = %auth.user_id(),
            "Liquidation replayed for idempotency key"
        );
    }

    Ok(Json(LiquidationResponse {
        conta_financeira: outcome.account.into(),
        transacao_id: outcome.transaction.id,
    }))
}
