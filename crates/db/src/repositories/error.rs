//! Repository error type.

use agencia_core::financial::FinancialError;
use agencia_core::ledger::LedgerError;
use agencia_core::sale::SaleError;
use agencia_shared::AppError;
use sea_orm::DbErr;
use thiserror::Error;

/// Errors returned by the ledger repositories.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Ledger rule rejected the operation.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Financial account rule rejected the operation.
    #[error(transparent)]
    Financial(#[from] FinancialError),

    /// Sale bridge rule rejected the operation.
    #[error(transparent)]
    Sale(#[from] SaleError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl RepositoryError {
    /// Returns true for business rule and not-found errors.
    #[must_use]
    pub fn is_rule_violation(&self) -> bool {
        !matches!(self, Self::Database(_))
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Ledger(e) => e.into(),
            RepositoryError::Financial(e) => e.into(),
            RepositoryError::Sale(e) => e.into(),
            RepositoryError::Database(e) => AppError::Database(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agencia_shared::types::BankAccountId;

    #[test]
    fn test_rule_violations_keep_status() {
        let err: RepositoryError = LedgerError::SameAccount(BankAccountId::new()).into();
        assert!(err.is_rule_violation());
        assert_eq!(AppError::from(err).status_code(), 422);
    }

    #[test]
    fn test_database_errors_are_500() {
        let err: RepositoryError = DbErr::Custom("connection reset".into()).into();
        assert!(!err.is_rule_violation());
        let app = AppError::from(err);
        assert_eq!(app.status_code(), 500);
        assert_eq!(app.to_body()["message"], "An internal error occurred");
    }
}
