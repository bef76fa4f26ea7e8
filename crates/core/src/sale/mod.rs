//! Sale-to-ledger bridge.
//!
//! Derives receivables, payables and commission records from confirmed sales
//! and from payment plan installments.

pub mod bridge;
pub mod error;
pub mod types;

pub use bridge::{
    SUPPLIER_COMMISSION_TYPE, ShadowState, ShadowSync, check_plan_liquidation,
    confirmation_accounts, plan_removal, shadow_account, supplier_commission, sync_shadow,
    validate_plan_amount,
};
pub use error::SaleError;
pub use types::{
    CommissionStatus, NewCommission, PlanSnapshot, PlanStatus, Receiver, SaleSnapshot,
    SaleStatus, SellerCommission,
};
