//! Ledger error types for postings, transfers and reconciliation.

use agencia_shared::{
    AppError,
    types::{BankAccountId, MAX_MONEY},
};
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

/// Which reference to a bank account failed to resolve.
///
/// Transfers must tell the caller whether the source or the destination was
/// missing, so the side travels with the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountSide {
    /// The account named in the request path.
    Path,
    /// The account money leaves in a transfer.
    Source,
    /// The account money arrives at in a transfer.
    Destination,
    /// The bank account chosen to settle a liquidation or a direct posting.
    Settlement,
}

impl AccountSide {
    /// Wire name of the request field carrying this reference.
    #[must_use]
    pub const fn field(self) -> Option<&'static str> {
        match self {
            Self::Path => None,
            Self::Source => Some("contaOrigemId"),
            Self::Destination => Some("contaDestinoId"),
            Self::Settlement => Some("contaBancariaId"),
        }
    }
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Amount must be positive with at most two decimal places.
    #[error("Amount must be positive, at most {max}, with at most two decimal places, got {0}", max = MAX_MONEY)]
    InvalidAmount(Decimal),

    /// Opening balance cannot be negative.
    #[error("Opening balance cannot be negative, got {0}")]
    NegativeOpeningBalance(Decimal),

    /// Source and destination of a transfer are the same account.
    #[error("Cannot transfer from account {0} to itself")]
    SameAccount(BankAccountId),

    // ========== Account Errors ==========
    /// Bank account not found.
    #[error("Bank account not found: {account_id}")]
    AccountNotFound {
        /// The missing account.
        account_id: BankAccountId,
        /// Which reference pointed at it.
        side: AccountSide,
    },

    /// Source account cannot cover the transfer.
    #[error("Insufficient funds in account {account_id}: available {available}, requested {requested}")]
    InsufficientFunds {
        /// The account that would go negative.
        account_id: BankAccountId,
        /// Balance read under lock.
        available: Decimal,
        /// Requested amount.
        requested: Decimal,
    },

    /// Posting would move the balance outside the storable range.
    #[error("Posting {amount} to account {account_id} would move its balance of {balance} out of range")]
    BalanceOutOfRange {
        /// The account posted to.
        account_id: BankAccountId,
        /// Balance before the posting.
        balance: Decimal,
        /// Requested amount.
        amount: Decimal,
    },

    /// Ledger row not found.
    #[error("Bank transaction not found: {0}")]
    TransactionNotFound(Uuid),

    // ========== Idempotency Errors ==========
    /// Idempotency key already used by a different kind of operation.
    #[error("Idempotency key '{key}' was already used for a {scope}")]
    IdempotencyKeyReused {
        /// The client supplied key.
        key: String,
        /// Scope the key was first recorded under.
        scope: String,
    },

    /// Another request with the same idempotency key committed first.
    #[error("A request with idempotency key '{0}' is being processed, please retry")]
    IdempotencyInFlight(String),

    // ========== Database Errors ==========
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::NegativeOpeningBalance(_) => "NEGATIVE_OPENING_BALANCE",
            Self::SameAccount(_) => "SAME_ACCOUNT",
            Self::AccountNotFound { .. } => "ACCOUNT_NOT_FOUND",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::BalanceOutOfRange { .. } => "BALANCE_OUT_OF_RANGE",
            Self::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            Self::IdempotencyKeyReused { .. } => "IDEMPOTENCY_KEY_REUSED",
            Self::IdempotencyInFlight(_) => "IDEMPOTENCY_IN_FLIGHT",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the wire name of the request field that tripped the rule.
    #[must_use]
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::InvalidAmount(_)
            | Self::InsufficientFunds { .. }
            | Self::BalanceOutOfRange { .. } => Some("valor"),
            Self::NegativeOpeningBalance(_) => Some("saldo"),
            Self::SameAccount(_) => Some("contaDestinoId"),
            Self::AccountNotFound { side, .. } => side.field(),
            Self::IdempotencyKeyReused { .. } => Some("Idempotency-Key"),
            Self::TransactionNotFound(_) | Self::IdempotencyInFlight(_) | Self::Database(_) => {
                None
            }
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            // 404 Not Found - only for resources named in the path
            Self::AccountNotFound {
                side: AccountSide::Path,
                ..
            }
            | Self::TransactionNotFound(_) => 404,

            // 422 Unprocessable Entity - business rules
            Self::InvalidAmount(_)
            | Self::NegativeOpeningBalance(_)
            | Self::SameAccount(_)
            | Self::AccountNotFound { .. }
            | Self::InsufficientFunds { .. }
            | Self::BalanceOutOfRange { .. }
            | Self::IdempotencyKeyReused { .. } => 422,

            // 409 Conflict - concurrency
            Self::IdempotencyInFlight(_) => 409,

            // 500 Internal Server Error
            Self::Database(_) => 500,
        }
    }

    /// Returns true if the caller may retry the same request unchanged.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::IdempotencyInFlight(_) | Self::Database(_))
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let code = err.error_code();
        match err.http_status_code() {
            404 => AppError::not_found(code, err.to_string()),
            409 => AppError::Conflict(err.to_string()),
            422 => AppError::business_rule(code, err.field(), err.to_string()),
            _ => AppError::Database(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_codes() {
        assert_eq!(LedgerError::InvalidAmount(dec!(0)).error_code(), "INVALID_AMOUNT");
        assert_eq!(
            LedgerError::SameAccount(BankAccountId::new()).error_code(),
            "SAME_ACCOUNT"
        );
        assert_eq!(
            LedgerError::InsufficientFunds {
                account_id: BankAccountId::new(),
                available: dec!(100),
                requested: dec!(150),
            }
            .error_code(),
            "INSUFFICIENT_FUNDS"
        );
    }

    #[test]
    fn test_account_not_found_names_side() {
        let source = LedgerError::AccountNotFound {
            account_id: BankAccountId::new(),
            side: AccountSide::Source,
        };
        let destination = LedgerError::AccountNotFound {
            account_id: BankAccountId::new(),
            side: AccountSide::Destination,
        };
        let path = LedgerError::AccountNotFound {
            account_id: BankAccountId::new(),
            side: AccountSide::Path,
        };

        assert_eq!(source.field(), Some("contaOrigemId"));
        assert_eq!(destination.field(), Some("contaDestinoId"));
        assert_eq!(source.http_status_code(), 422);
        assert_eq!(path.http_status_code(), 404);
    }

    #[test]
    fn test_http_status_codes() {
        assert_eq!(LedgerError::InvalidAmount(dec!(-1)).http_status_code(), 422);
        assert_eq!(
            LedgerError::TransactionNotFound(Uuid::nil()).http_status_code(),
            404
        );
        assert_eq!(
            LedgerError::IdempotencyInFlight("k".into()).http_status_code(),
            409
        );
        assert_eq!(LedgerError::Database("x".into()).http_status_code(), 500);
    }

    #[test]
    fn test_into_app_error() {
        let app: AppError = LedgerError::InsufficientFunds {
            account_id: BankAccountId::new(),
            available: dec!(100.00),
            requested: dec!(150.00),
        }
        .into();
        assert_eq!(app.status_code(), 422);
        assert_eq!(app.error_code(), "INSUFFICIENT_FUNDS");
        assert_eq!(app.to_body()["field"], "valor");

        let app: AppError = LedgerError::Database("boom".into()).into();
        assert_eq!(app.status_code(), 500);
    }

    #[test]
    fn test_balance_out_of_range_is_rule_violation() {
        let err = LedgerError::BalanceOutOfRange {
            account_id: BankAccountId::new(),
            balance: dec!(9999999999999.00),
            amount: dec!(1.00),
        };
        assert_eq!(err.error_code(), "BALANCE_OUT_OF_RANGE");
        assert_eq!(err.field(), Some("valor"));
        assert_eq!(err.http_status_code(), 422);
    }

    #[test]
    fn test_error_display() {
        let err = LedgerError::InsufficientFunds {
            account_id: BankAccountId::from_uuid(Uuid::nil()),
            available: dec!(100.00),
            requested: dec!(150.00),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient funds in account 00000000-0000-0000-0000-000000000000: available 100.00, requested 150.00"
        );
    }
}
