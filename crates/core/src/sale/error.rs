//! Sale bridge error types.

use agencia_shared::{
    AppError,
    types::{PaymentPlanId, SaleId},
};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::financial::FinancialError;

/// Errors raised while deriving obligations from sales and payment plans.
#[derive(Debug, Error)]
pub enum SaleError {
    /// Sale not found.
    #[error("Sale not found: {0}")]
    NotFound(SaleId),

    /// Sale is already confirmed.
    #[error("Sale {0} is already confirmed")]
    AlreadyConfirmed(SaleId),

    /// Cancelled sales cannot be confirmed.
    #[error("Sale {0} is cancelled")]
    Cancelled(SaleId),

    /// Sale total must be positive to raise a receivable.
    #[error("Sale total must be positive, got {0}")]
    InvalidSaleTotal(Decimal),

    /// Payment plan not found.
    #[error("Payment plan not found: {0}")]
    PlanNotFound(PaymentPlanId),

    /// Payment plan is already liquidated.
    #[error("Payment plan {0} is already liquidated")]
    PlanAlreadyLiquidated(PaymentPlanId),

    /// Payment plan amount must be positive and storable.
    #[error("Payment plan amount must be positive, within the storable range, with at most two decimal places, got {0}")]
    InvalidPlanAmount(Decimal),

    /// The shadow financial account has liquidations and cannot be replaced or removed.
    #[error("Financial account of payment plan {0} already has liquidations")]
    ShadowAccountLiquidated(PaymentPlanId),

    /// Financial account rule failed.
    #[error(transparent)]
    Financial(#[from] FinancialError),
}

impl SaleError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "SALE_NOT_FOUND",
            Self::AlreadyConfirmed(_) => "SALE_ALREADY_CONFIRMED",
            Self::Cancelled(_) => "SALE_CANCELLED",
            Self::InvalidSaleTotal(_) => "INVALID_SALE_TOTAL",
            Self::PlanNotFound(_) => "PAYMENT_PLAN_NOT_FOUND",
            Self::PlanAlreadyLiquidated(_) => "PLAN_ALREADY_LIQUIDATED",
            Self::InvalidPlanAmount(_) => "INVALID_AMOUNT",
            Self::ShadowAccountLiquidated(_) => "SHADOW_ACCOUNT_LIQUIDATED",
            Self::Financial(e) => e.error_code(),
        }
    }

    /// Returns the wire name of the offending request field.
    #[must_use]
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::AlreadyConfirmed(_) | Self::Cancelled(_) | Self::PlanAlreadyLiquidated(_) => {
                Some("status")
            }
            Self::InvalidSaleTotal(_) => Some("valorTotal"),
            Self::InvalidPlanAmount(_) => Some("valor"),
            Self::NotFound(_) | Self::PlanNotFound(_) | Self::ShadowAccountLiquidated(_) => None,
            Self::Financial(e) => e.field(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) | Self::PlanNotFound(_) => 404,
            Self::AlreadyConfirmed(_)
            | Self::Cancelled(_)
            | Self::InvalidSaleTotal(_)
            | Self::PlanAlreadyLiquidated(_)
            | Self::InvalidPlanAmount(_)
            | Self::ShadowAccountLiquidated(_) => 422,
            Self::Financial(e) => e.http_status_code(),
        }
    }
}

impl From<SaleError> for AppError {
    fn from(err: SaleError) -> Self {
        if let SaleError::Financial(inner) = err {
            return inner.into();
        }
        let code = err.error_code();
        match err.http_status_code() {
            404 => AppError::not_found(code, err.to_string()),
            _ => AppError::business_rule(code, err.field(), err.to_string()),
        }
    }
}
