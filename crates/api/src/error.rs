//! HTTP error responses.

use agencia_core::financial::FinancialError;
use agencia_core::ledger::LedgerError;
use agencia_core::sale::SaleError;
use agencia_db::RepositoryError;
use agencia_shared::AppError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

/// Error returned by handlers.
///
/// Infrastructure failures are logged here and answered with a generic body.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl ApiError {
    /// Returns the wrapped error.
    #[must_use]
    pub const fn inner(&self) -> &AppError {
        &self.0
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.0.is_server_error() {
            error!(error = %self.0, "Request failed");
        }
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.0.to_body())).into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        Self(err.into())
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        Self(err.into())
    }
}

impl From<FinancialError> for ApiError {
    fn from(err: FinancialError) -> Self {
        Self(err.into())
    }
}

impl From<SaleError> for ApiError {
    fn from(err: SaleError) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agencia_shared::types::BankAccountId;
    use http_body_util::BodyExt;
    use rust_decimal_macros::dec;

    async fn body(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_business_rule_body() {
        let err: ApiError = LedgerError::InsufficientFunds {
            account_id: BankAccountId::new(),
            available: dec!(100.00),
            requested: dec!(150.00),
        }
        .into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let json = body(response).await;
        assert_eq!(json["error"], "INSUFFICIENT_FUNDS");
        assert_eq!(json["field"], "valor");
    }

    #[tokio::test]
    async fn test_database_error_hides_details() {
        let err: ApiError = RepositoryError::Database(sea_orm::DbErr::Custom(
            "connection refused on 10.0.0.5".to_string(),
        ))
        .into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body(response).await;
        assert_eq!(json["message"], "An internal error occurred");
        assert!(!json.to_string().contains("10.0.0.5"));
    }
}
