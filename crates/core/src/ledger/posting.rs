//! Posting rules for the bank transaction ledger.
//!
//! These functions are pure. The repository layer reads the account under a
//! row lock, asks for a [`Posting`], then writes the ledger row and the new
//! balance in the same database transaction.

use agencia_shared::types::{is_money_range, is_money_scale, round_money};
use rust_decimal::Decimal;

use super::error::LedgerError;
use super::types::{AccountState, BalanceSnapshot, Direction, Posting};

/// Checks that a movement amount is positive, storable and has at most two
/// decimal places.
///
/// Returns the amount at cent scale.
///
/// # Errors
///
/// Returns `LedgerError::InvalidAmount` otherwise.
pub fn validate_amount(amount: Decimal) -> Result<Decimal, LedgerError> {
    if amount <= Decimal::ZERO || !is_money_scale(amount) || !is_money_range(amount) {
        return Err(LedgerError::InvalidAmount(amount));
    }
    Ok(round_money(amount))
}

/// Checks a caller supplied opening balance. Missing means zero.
///
/// # Errors
///
/// Returns `LedgerError::NegativeOpeningBalance` for negative values and
/// `LedgerError::InvalidAmount` for sub-cent or unstorable values.
pub fn validate_opening_balance(amount: Option<Decimal>) -> Result<Decimal, LedgerError> {
    let amount = amount.unwrap_or(Decimal::ZERO);
    if amount < Decimal::ZERO {
        return Err(LedgerError::NegativeOpeningBalance(amount));
    }
    if !is_money_scale(amount) || !is_money_range(amount) {
        return Err(LedgerError::InvalidAmount(amount));
    }
    Ok(round_money(amount))
}

impl AccountState {
    /// Applies a movement to this account and returns the posting to persist.
    ///
    /// No sufficiency check happens here; callers that must not overdraw an
    /// account check before posting.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InvalidAmount` if the amount is not a positive
    /// cent value and `LedgerError::BalanceOutOfRange` if the new balance
    /// would not fit a money column. The state is left untouched on error.
    pub fn post(&mut self, direction: Direction, amount: Decimal) -> Result<Posting, LedgerError> {
        let amount = validate_amount(amount)?;
        let before = self.balance;
        let after = direction
            .apply(before, amount)
            .filter(|after| is_money_range(*after))
            .ok_or(LedgerError::BalanceOutOfRange {
                account_id: self.id,
                balance: before,
                amount,
            })?;

        self.balance = after;
        self.version += 1;

        Ok(Posting {
            account_id: self.id,
            direction,
            amount,
            snapshot: BalanceSnapshot { before, after },
            account_version: self.version,
        })
    }

    /// Returns true if the account can cover `amount` without going negative.
    #[must_use]
    pub fn can_cover(&self, amount: Decimal) -> bool {
        self.balance >= amount
    }
}
