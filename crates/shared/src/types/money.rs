//! Money helpers with decimal precision.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! All amounts are `rust_decimal::Decimal` stored as NUMERIC(15, 2).

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of decimal places kept for every stored amount.
pub const MONEY_SCALE: u32 = 2;

/// Largest magnitude a NUMERIC(15, 2) column holds: 9 999 999 999 999.99.
pub const MAX_MONEY: Decimal = Decimal::from_parts(2_764_472_319, 232_830, 0, false, MONEY_SCALE);

/// Rounds an amount to cents, half away from zero, at scale 2.
#[must_use]
pub fn round_money(value: Decimal) -> Decimal {
    let mut rounded =
        value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(MONEY_SCALE);
    rounded
}

/// Returns true if the amount fits a stored money column.
#[must_use]
pub fn is_money_range(value: Decimal) -> bool {
    value.abs() <= MAX_MONEY
}

/// Returns true if the amount has no more than two decimal places.
#[must_use]
pub fn is_money_scale(value: Decimal) -> bool {
    value.normalize().scale() <= MONEY_SCALE
}

/// Applies a percentage (e.g. `12.5` for 12.5%) to `base`, rounded to cents.
#[must_use]
pub fn percentage_of(base: Decimal, percentage: Decimal) -> Decimal {
    round_money(base * percentage / Decimal::ONE_HUNDRED)
}

/// Returns `part / whole` as a percentage with two decimal places.
///
/// Returns zero when `whole` is zero.
#[must_use]
pub fn ratio_percent(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        return Decimal::ZERO;
    }
    round_money(part * Decimal::ONE_HUNDRED / whole)
}
