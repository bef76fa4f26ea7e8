//! Core business rules for the agency bank ledger.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! The database layer fetches and locks rows, asks these modules what to write,
//! and persists the answer inside one transaction.
//!
//! # Modules
//!
//! - `ledger` - Bank postings, transfers and balance reconciliation
//! - `financial` - Receivables/payables and partial liquidation
//! - `sale` - Obligations derived from confirmed sales and payment plans

pub mod financial;
pub mod ledger;
pub mod sale;
