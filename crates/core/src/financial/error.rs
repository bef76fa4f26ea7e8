//! Financial account error types.

use agencia_shared::{
    AppError,
    types::{FinancialAccountId, MAX_MONEY, PaymentPlanId},
};
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::ledger::LedgerError;

/// A record named in a request body that a financial account or ledger row
/// links to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference {
    /// The sale that spawned the account.
    Sale,
    /// The payment plan the account shadows.
    PaymentPlan,
    /// The financial account a ledger row settles.
    FinancialAccount,
}

impl Reference {
    /// Wire name of the request field carrying this reference.
    #[must_use]
    pub const fn field(self) -> &'static str {
        match self {
            Self::Sale => "vendaId",
            Self::PaymentPlan => "planoPagamentoId",
            Self::FinancialAccount => "contaFinanceiraId",
        }
    }

    const fn error_code(self) -> &'static str {
        match self {
            Self::Sale => "SALE_NOT_FOUND",
            Self::PaymentPlan => "PAYMENT_PLAN_NOT_FOUND",
            Self::FinancialAccount => "FINANCIAL_ACCOUNT_NOT_FOUND",
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::Sale => "Sale",
            Self::PaymentPlan => "Payment plan",
            Self::FinancialAccount => "Financial account",
        }
    }
}

/// Financial-account-related errors.
#[derive(Debug, Error)]
pub enum FinancialError {
    /// Financial account not found.
    #[error("Financial account not found: {0}")]
    NotFound(FinancialAccountId),

    /// Liquidation amount must be positive, storable, with at most two decimal places.
    #[error("Liquidation amount must be positive, within the storable range, with at most two decimal places, got {0}")]
    InvalidAmount(Decimal),

    /// Total amount must be positive, storable, with at most two decimal places.
    #[error("Total amount must be positive, at most {max}, with at most two decimal places, got {0}", max = MAX_MONEY)]
    InvalidTotal(Decimal),

    /// A referenced record does not exist.
    #[error("{} not found: {id}", .reference.label())]
    ReferenceNotFound {
        /// Which reference failed to resolve.
        reference: Reference,
        /// The id sent by the client.
        id: Uuid,
    },

    /// The payment plan already has its financial account.
    #[error("Payment plan {0} already has a financial account")]
    PlanAlreadyLinked(PaymentPlanId),

    /// Liquidation would exceed the open amount.
    #[error("Liquidation of {requested} exceeds the open amount of {open}")]
    OverLiquidation {
        /// Amount still open.
        open: Decimal,
        /// Amount requested.
        requested: Decimal,
    },

    /// Ledger rule failed while settling against a bank account.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl FinancialError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "FINANCIAL_ACCOUNT_NOT_FOUND",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::InvalidTotal(_) => "INVALID_TOTAL",
            Self::OverLiquidation { .. } => "OVER_LIQUIDATION",
            Self::ReferenceNotFound { reference, .. } => reference.error_code(),
            Self::PlanAlreadyLinked(_) => "PLAN_ALREADY_LINKED",
            Self::Ledger(e) => e.error_code(),
        }
    }

    /// Returns the wire name of the offending request field.
    #[must_use]
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::NotFound(_) => None,
            Self::InvalidAmount(_) | Self::OverLiquidation { .. } => Some("valor"),
            Self::InvalidTotal(_) => Some("valorTotal"),
            Self::ReferenceNotFound { reference, .. } => Some(reference.field()),
            Self::PlanAlreadyLinked(_) => Some("planoPagamentoId"),
            Self::Ledger(e) => e.field(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::InvalidAmount(_)
            | Self::InvalidTotal(_)
            | Self::OverLiquidation { .. }
            | Self::ReferenceNotFound { .. }
            | Self::PlanAlreadyLinked(_) => 422,
            Self::Ledger(e) => e.http_status_code(),
        }
    }
}

impl From<FinancialError> for AppError {
    fn from(err: FinancialError) -> Self {
        if let FinancialError::Ledger(inner) = err {
            return inner.into();
        }
        let code = err.error_code();
        match err.http_status_code() {
            404 => AppError::not_found(code, err.to_string()),
            _ => AppError::business_rule(code, err.field(), err.to_string()),
        }
    }
}
