//! Receivable and payable tracking.
//!
//! - Direction and status enums with the status derivation rule
//! - Liquidation arithmetic under the configured over-payment policy
//! - Error types for financial account operations

pub mod error;
pub mod obligation;
pub mod types;

#[cfg(test)]
mod obligation_props;

pub use error::{FinancialError, Reference};
pub use obligation::Obligation;
pub use types::{
    Counterparties, FinancialDirection, FinancialStatus, NewFinancialAccount,
    settlement_description, validate_total,
};
