//! Shared types, errors, and configuration for the agency ledger.
//!
//! This crate provides common types used across all other crates:
//! - Money rounding helpers with decimal precision
//! - Typed IDs for type-safe entity references
//! - Pagination types for list endpoints
//! - Application-wide error types
//! - Configuration management
//! - JWT claims and token validation

pub mod auth;
pub mod config;
pub mod error;
pub mod jwt;
pub mod types;

pub use auth::{Claims, ELEVATED_ROLES};
pub use config::{AppConfig, LedgerConfig, OverpaymentPolicy};
pub use error::{AppError, AppResult, FieldError};
pub use jwt::{JwtConfig, JwtError, JwtService};
