//! Repository layer.
//!
//! Every operation that moves a bank balance runs in one database transaction
//! and holds `SELECT ... FOR UPDATE` locks on the touched account rows.

pub mod bank_account;
pub mod error;
pub mod financial_account;
mod idempotency;
pub mod ledger;
pub mod sale_bridge;
pub mod transfer;

pub use bank_account::{BankAccountRepository, CreateBankAccountInput, UpdateBankAccountInput};
pub use error::RepositoryError;
pub use financial_account::{
    FinancialAccountFilter, FinancialAccountRepository, LiquidationInput, LiquidationOutcome,
};
pub use ledger::{AppendEntryInput, EntryDetails, LedgerRepository};
pub use sale_bridge::{
    ConfirmationOutcome, NewPlanInput, PlanLiquidationInput, PlanLiquidationOutcome,
    PlanWithShadow, SaleBridgeRepository, UpdatePlanInput,
};
pub use transfer::{TransferOutcome, TransferRepository};
