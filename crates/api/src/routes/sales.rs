//! Sale bridge routes: confirmation, payment plans and commissions.

use agencia_core::sale::Receiver;
use agencia_db::entities::sales;
use agencia_db::entities::sea_orm_active_enums::SaleStatusDb;
use agencia_db::repositories::{NewPlanInput, SaleBridgeRepository};
use agencia_shared::types::SaleId;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::financial_accounts::FinancialAccountResponse;
use super::payment_plans::{CommissionResponse, PaymentPlanResponse, PlanWithShadowResponse};
use crate::extractors::{ValidatedJson, ValidatedQuery, money_scale};
use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Creates the sale bridge routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sales/{id}/confirm", post(confirm_sale))
        .route(
            "/sales/{id}/payment-plans",
            get(list_plans).post(create_plan),
        )
        .route("/sales/{id}/commissions", get(list_commissions))
}

/// Query parameters for a confirmation.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmQuery {
    /// Due date of the raised obligations, today when absent.
    pub data_vencimento: Option<NaiveDate>,
}

/// Request body for a new installment.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlanRequest {
    /// Installment description.
    #[validate(length(min = 1, max = 255))]
    pub descricao: String,
    /// Installment amount.
    #[validate(custom(function = "money_scale"))]
    pub valor: Decimal,
    /// Due date.
    pub data_vencimento: NaiveDate,
    /// Payment method label.
    pub forma_pagamento: Option<String>,
    /// Payment condition label.
    pub condicao_pagamento: Option<String>,
    /// `AGENCIA` or `FORNECEDOR`.
    pub quem_recebe: Receiver,
    /// Free reference to the payer.
    pub pagador: Option<String>,
}

/// Sale header as returned by the bridge.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleResponse {
    /// Sale ID.
    pub id: Uuid,
    /// Lifecycle status.
    pub status: SaleStatusDb,
    /// Amount charged to the client.
    pub valor_total: Decimal,
    /// Amount owed to the supplier.
    pub custo_total: Decimal,
    /// Client.
    pub cliente_id: Option<Uuid>,
    /// Supplier.
    pub fornecedor_id: Option<Uuid>,
}

impl From<sales::Model> for SaleResponse {
    fn from(model: sales::Model) -> Self {
        Self {
            id: model.id,
            status: model.status,
            valor_total: model.total_amount,
            custo_total: model.total_cost,
            cliente_id: model.client_id,
            fornecedor_id: model.supplier_id,
        }
    }
}

/// A confirmed sale with the obligations it raised.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationResponse {
    /// Sale after confirmation.
    pub venda: SaleResponse,
    /// Receivable, supplier payable and commission payables.
    pub contas_financeiras: Vec<FinancialAccountResponse>,
}

fn repository(state: &AppState) -> SaleBridgeRepository {
    SaleBridgeRepository::new((*state.db).clone())
}

/// POST `/sales/{id}/confirm` - Confirm a quote and raise its obligations.
async fn confirm_sale(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<SaleId>,
    ValidatedQuery(query): ValidatedQuery<ConfirmQuery>,
) -> Result<Json<ConfirmationResponse>, ApiError> {
    let due_date = query.data_vencimento.unwrap_or_else(super::today);
    let outcome = repository(&state).confirm(id, due_date).await?;
    Ok(Json(ConfirmationResponse {
        venda: outcome.sale.into(),
        contas_financeiras: outcome.accounts.into_iter().map(Into::into).collect(),
    }))
}

/// GET `/sales/{id}/payment-plans` - Installments of a sale, by due date.
async fn list_plans(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<SaleId>,
) -> Result<Json<Vec<PaymentPlanResponse>>, ApiError> {
    let plans = repository(&state).list_plans(id).await?;
    Ok(Json(plans.into_iter().map(Into::into).collect()))
}

/// POST `/sales/{id}/payment-plans` - Add an installment and its shadow account.
async fn create_plan(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<SaleId>,
    ValidatedJson(req): ValidatedJson<CreatePlanRequest>,
) -> Result<(StatusCode, Json<PlanWithShadowResponse>), ApiError> {
    let created = repository(&state)
        .create_plan(
            id,
            NewPlanInput {
                description: req.descricao,
                amount: req.valor,
                due_date: req.data_vencimento,
                payment_method: req.forma_pagamento,
                payment_condition: req.condicao_pagamento,
                receiver: req.quem_recebe,
                payer_reference: req.pagador,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// GET `/sales/{id}/commissions` - Commission records of a sale.
async fn list_commissions(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<SaleId>,
) -> Result<Json<Vec<CommissionResponse>>, ApiError> {
    let commissions = repository(&state).list_commissions(id).await?;
    Ok(Json(commissions.into_iter().map(Into::into).collect()))
}
