//! Common types used across the application.

pub mod id;
pub mod money;
pub mod pagination;

pub use id::*;
pub use money::{MAX_MONEY, MONEY_SCALE, is_money_range, is_money_scale, percentage_of, ratio_percent, round_money};
pub use pagination::{PageMeta, PageRequest, PageResponse};
