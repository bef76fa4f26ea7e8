//! Payment plan routes: edits, deletion and liquidation.
//!
//! Every plan carries one shadow financial account; these handlers return it
//! alongside the plan.

use agencia_core::sale::Receiver;
use agencia_db::entities::sea_orm_active_enums::{
    CommissionStatusDb, PlanReceiver, PlanStatusDb,
};
use agencia_db::entities::{payment_plans, sale_commissions};
use agencia_db::repositories::{
    PlanLiquidationInput, PlanWithShadow, SaleBridgeRepository, UpdatePlanInput,
};
use agencia_shared::types::{BankAccountId, PaymentPlanId};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::put,
};
use chrono::{DateTime, FixedOffset, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::financial_accounts::FinancialAccountResponse;
use crate::extractors::{ValidatedJson, money_scale};
use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Creates the payment plan routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/payment-plans/{id}",
            put(update_plan).delete(delete_plan),
        )
        .route("/payment-plans/{id}/liquidate", put(liquidate_plan))
}

/// Request body for a plan edit. Absent fields are left unchanged.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePlanRequest {
    /// Installment description.
    #[validate(length(min = 1, max = 255))]
    pub descricao: Option<String>,
    /// Installment amount.
    #[validate(custom(function = "money_scale"))]
    pub valor: Option<Decimal>,
    /// Due date.
    pub data_vencimento: Option<NaiveDate>,
    /// Payment method label.
    pub forma_pagamento: Option<String>,
    /// Payment condition label.
    pub condicao_pagamento: Option<String>,
    /// `AGENCIA` or `FORNECEDOR`.
    pub quem_recebe: Option<Receiver>,
    /// Free reference to the payer.
    pub pagador: Option<String>,
}

/// Request body for a plan liquidation.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LiquidatePlanRequest {
    /// Bank account stamped on the plan.
    pub conta_bancaria_id: Option<BankAccountId>,
    /// Liquidation date, today when absent.
    pub data_liquidacao: Option<NaiveDate>,
    /// Free notes.
    #[validate(length(max = 1000))]
    pub observacoes: Option<String>,
}

/// Response for a payment plan installment.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPlanResponse {
    /// Plan ID.
    pub id: Uuid,
    /// Sale the installment belongs to.
    pub venda_id: Uuid,
    /// Description.
    pub descricao: String,
    /// Installment amount.
    pub valor: Decimal,
    /// Due date.
    pub data_vencimento: NaiveDate,
    /// Payment method label.
    pub forma_pagamento: Option<String>,
    /// Payment condition label.
    pub condicao_pagamento: Option<String>,
    /// Who receives the money.
    pub quem_recebe: PlanReceiver,
    /// Free reference to the payer.
    pub pagador: Option<String>,
    /// `pendente` or `liquidado`.
    pub status: PlanStatusDb,
    /// Amount paid.
    pub valor_pago: Decimal,
    /// Amount still open.
    pub valor_aberto: Decimal,
    /// Bank account stamped on liquidation.
    pub conta_bancaria_id: Option<Uuid>,
    /// Liquidation date.
    pub data_liquidacao: Option<NaiveDate>,
    /// Liquidation notes.
    pub observacoes_liquidacao: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<FixedOffset>,
}

impl From<payment_plans::Model> for PaymentPlanResponse {
    fn from(model: payment_plans::Model) -> Self {
        Self {
            id: model.id,
            venda_id: model.sale_id,
            descricao: model.description,
            valor: model.amount,
            data_vencimento: model.due_date,
            forma_pagamento: model.payment_method,
            condicao_pagamento: model.payment_condition,
            quem_recebe: model.receiver,
            pagador: model.payer_reference,
            status: model.status,
            valor_pago: model.paid_amount,
            valor_aberto: model.open_amount,
            conta_bancaria_id: model.bank_account_id,
            data_liquidacao: model.liquidation_date,
            observacoes_liquidacao: model.liquidation_notes,
            created_at: model.created_at,
        }
    }
}

/// A plan with its shadow financial account.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanWithShadowResponse {
    /// Plan row.
    pub plano: PaymentPlanResponse,
    /// Shadow financial account.
    pub conta_financeira: FinancialAccountResponse,
}

impl From<PlanWithShadow> for PlanWithShadowResponse {
    fn from(value: PlanWithShadow) -> Self {
        Self {
            plano: value.plan.into(),
            conta_financeira: value.shadow.into(),
        }
    }
}

/// Response for a commission record.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionResponse {
    /// Commission ID.
    pub id: Uuid,
    /// Sale it belongs to.
    pub venda_id: Uuid,
    /// Installment that raised it.
    pub plano_pagamento_id: Option<Uuid>,
    /// Beneficiary.
    pub usuario_id: Uuid,
    /// Commission kind.
    pub tipo: String,
    /// Percentage applied.
    pub percentual: Decimal,
    /// Amount.
    pub valor: Decimal,
    /// Expected receipt date.
    pub data_prevista: Option<NaiveDate>,
    /// Actual receipt date.
    pub data_recebimento: Option<NaiveDate>,
    /// `a_receber` or `recebida`.
    pub status: CommissionStatusDb,
}

impl From<sale_commissions::Model> for CommissionResponse {
    fn from(model: sale_commissions::Model) -> Self {
        Self {
            id: model.id,
            venda_id: model.sale_id,
            plano_pagamento_id: model.payment_plan_id,
            usuario_id: model.beneficiary_user_id,
            tipo: model.commission_type,
            percentual: model.percentage,
            valor: model.amount,
            data_prevista: model.expected_date,
            data_recebimento: model.received_date,
            status: model.status,
        }
    }
}

/// A liquidated plan with its shadow account and supplier commission.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanLiquidationResponse {
    /// Plan after liquidation.
    pub plano: PaymentPlanResponse,
    /// Shadow financial account.
    pub conta_financeira: FinancialAccountResponse,
    /// Supplier commission, for `FORNECEDOR` installments.
    pub comissao: Option<CommissionResponse>,
}

fn repository(state: &AppState) -> SaleBridgeRepository {
    SaleBridgeRepository::new((*state.db).clone())
}

/// PUT `/payment-plans/{id}` - Edit a plan and sync its shadow account.
async fn update_plan(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<PaymentPlanId>,
    ValidatedJson(req): ValidatedJson<UpdatePlanRequest>,
) -> Result<Json<PlanWithShadowResponse>, ApiError> {
    let updated = repository(&state)
        .update_plan(
            id,
            UpdatePlanInput {
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
    Ok(Json(updated.into()))
}

/// DELETE `/payment-plans/{id}` - Delete a plan and its shadow account.
async fn delete_plan(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<PaymentPlanId>,
) -> Result<StatusCode, ApiError> {
    repository(&state).delete_plan(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT `/payment-plans/{id}/liquidate` - Mark a plan as paid.
///
/// No bank balance moves here.
async fn liquidate_plan(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<PaymentPlanId>,
    ValidatedJson(req): ValidatedJson<LiquidatePlanRequest>,
) -> Result<Json<PlanLiquidationResponse>, ApiError> {
    let outcome = repository(&state)
        .liquidate_plan(
            id,
            PlanLiquidationInput {
                bank_account_id: req.conta_bancaria_id,
                liquidation_date: req.data_liquidacao.unwrap_or_else(super::today),
                notes: req.observacoes,
            },
            auth.user_id(),
        )
        .await?;

    Ok(Json(PlanLiquidationResponse {
        plano: outcome.plan.into(),
        conta_financeira: outcome.shadow.into(),
        comissao: outcome.commission.map(Into::into),
    }))
}
