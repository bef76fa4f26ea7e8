//! Ledger domain types.
//!
//! A bank account balance only moves through postings. Every posting carries a
//! before/after snapshot and bumps the account version, so the ledger rows of
//! an account form a chain that can be audited later.

use std::fmt;
use std::str::FromStr;

use agencia_shared::types::BankAccountId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Direction of a ledger movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Money coming into the bank account.
    Entrada,
    /// Money leaving the bank account.
    Saida,
}

impl Direction {
    /// Returns the amount with the sign this direction applies to a balance.
    #[must_use]
    pub fn signed(self, amount: Decimal) -> Decimal {
        match self {
            Self::Entrada => amount,
            Self::Saida => -amount,
        }
    }

    /// Returns the balance after moving `amount` in this direction, or `None`
    /// if the result does not fit a `Decimal`.
    #[must_use]
    pub fn apply(self, balance: Decimal, amount: Decimal) -> Option<Decimal> {
        match self {
            Self::Entrada => balance.checked_add(amount),
            Self::Saida => balance.checked_sub(amount),
        }
    }

    /// Returns the opposite direction.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Entrada => Self::Saida,
            Self::Saida => Self::Entrada,
        }
    }

    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Entrada => "entrada",
            Self::Saida => "saida",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "entrada" => Ok(Self::Entrada),
            "saida" => Ok(Self::Saida),
            other => Err(format!("unknown direction '{other}'")),
        }
    }
}

/// Balance of an account immediately before and after one posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    /// Balance before the posting.
    pub before: Decimal,
    /// Balance after the posting.
    pub after: Decimal,
}

impl BalanceSnapshot {
    /// Returns true if `after == before ± amount` for the given direction.
    #[must_use]
    pub fn is_consistent(&self, direction: Direction, amount: Decimal) -> bool {
        direction.apply(self.before, amount) == Some(self.after)
    }
}

/// A bank account as read under its row lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountState {
    /// Account id.
    pub id: BankAccountId,
    /// Display name, used in transfer descriptions.
    pub name: String,
    /// Current balance.
    pub balance: Decimal,
    /// Number of postings applied so far.
    pub version: i64,
}

/// The computed effect of one posting on one account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Posting {
    /// Account the posting applies to.
    pub account_id: BankAccountId,
    /// Direction of the movement.
    pub direction: Direction,
    /// Positive amount, two decimal places.
    pub amount: Decimal,
    /// Balance snapshot captured at write time.
    pub snapshot: BalanceSnapshot,
    /// Account version after this posting.
    pub account_version: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_direction_apply() {
        assert_eq!(Direction::Entrada.apply(dec!(100.00), dec!(25.50)), Some(dec!(125.50)));
        assert_eq!(Direction::Saida.apply(dec!(100.00), dec!(25.50)), Some(dec!(74.50)));
        assert_eq!(Direction::Saida.apply(dec!(10.00), dec!(25.00)), Some(dec!(-15.00)));
    }

    #[test]
    fn test_direction_apply_overflow() {
        assert_eq!(Direction::Entrada.apply(Decimal::MAX, dec!(1)), None);
        assert_eq!(Direction::Saida.apply(Decimal::MIN, dec!(1)), None);
    }

    #[test]
    fn test_direction_wire_names() {
        assert_eq!(Direction::Entrada.to_string(), "entrada");
        assert_eq!("saida".parse::<Direction>().unwrap(), Direction::Saida);
        assert!("credit".parse::<Direction>().is_err());
        assert_eq!(
            serde_json::to_string(&Direction::Saida).unwrap(),
            "\"saida\""
        );
        assert_eq!(Direction::Entrada.opposite(), Direction::Saida);
    }

    #[test]
    fn test_snapshot_consistency() {
        let snapshot = BalanceSnapshot {
            before: dec!(1000.00),
            after: dec!(750.00),
        };
        assert!(snapshot.is_consistent(Direction::Saida, dec!(250.00)));
        assert!(!snapshot.is_consistent(Direction::Entrada, dec!(250.00)));
    }
}
