//! Transfer planning between two bank accounts.
//!
//! A transfer always posts two independent legs: a `saida` on the source and
//! an `entrada` on the destination. Opposite transfers between the same pair
//! are never netted.

use agencia_shared::types::BankAccountId;
use rust_decimal::Decimal;

use super::error::{AccountSide, LedgerError};
use super::posting::validate_amount;
use super::types::{AccountState, Direction, Posting};

/// A request to move money between two bank accounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    /// Account money leaves.
    pub source: BankAccountId,
    /// Account money arrives at.
    pub destination: BankAccountId,
    /// Amount to move.
    pub amount: Decimal,
    /// Free text appended to both leg descriptions.
    pub description: String,
    /// Optional notes stored on both legs.
    pub notes: Option<String>,
}

impl TransferRequest {
    /// Checks the rules that need no database access, in order:
    /// positive amount, then distinct accounts.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` or `SameAccount`.
    pub fn validate(&self) -> Result<Decimal, LedgerError> {
        let amount = validate_amount(self.amount)?;
        if self.source == self.destination {
            return Err(LedgerError::SameAccount(self.source));
        }
        Ok(amount)
    }

    /// Returns both account ids in the order their rows must be locked.
    ///
    /// Every transfer locks the lower id first, so two transfers over the same
    /// pair in opposite directions queue instead of deadlocking.
    #[must_use]
    pub fn lock_order(&self) -> [BankAccountId; 2] {
        if self.source <= self.destination {
            [self.source, self.destination]
        } else {
            [self.destination, self.source]
        }
    }
}

/// One side of a planned transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferLeg {
    /// The posting to persist.
    pub posting: Posting,
    /// Ledger row description.
    pub description: String,
}

/// The two legs of a transfer plus the resulting balances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferPlan {
    /// `saida` on the source account.
    pub outgoing: TransferLeg,
    /// `entrada` on the destination account.
    pub incoming: TransferLeg,
    /// Source account state after the transfer.
    pub source: AccountState,
    /// Destination account state after the transfer.
    pub destination: AccountState,
}

/// Description of the outgoing leg.
#[must_use]
pub fn outgoing_description(destination_name: &str, description: &str) -> String {
    format!("Transfer to {destination_name}: {description}")
}

/// Description of the incoming leg.
#[must_use]
pub fn incoming_description(source_name: &str, description: &str) -> String {
    format!("Transfer received from {source_name}: {description}")
}

/// Plans a transfer against account states read under lock.
///
/// Preconditions are checked in order and the first failure wins:
/// 1. amount is positive
/// 2. source and destination differ
/// 3. both accounts exist, source checked first
/// 4. the source balance covers the amount
///
/// # Errors
///
/// Returns the `LedgerError` of the first failing precondition.
pub fn plan_transfer(
    request: &TransferRequest,
    source: Option<AccountState>,
    destination: Option<AccountState>,
) -> Result<TransferPlan, LedgerError> {
    let amount = request.validate()?;

    let mut source = source.ok_or(LedgerError::AccountNotFound {
        account_id: request.source,
        side: AccountSide::Source,
    })?;
    let mut destination = destination.ok_or(LedgerError::AccountNotFound {
        account_id: request.destination,
        side: AccountSide::Destination,
    })?;

    if !source.can_cover(amount) {
        return Err(LedgerError::InsufficientFunds {
            account_id: source.id,
            available: source.balance,
            requested: amount,
        });
    }

    let outgoing = TransferLeg {
        posting: source.post(Direction::Saida, amount)?,
        description: outgoing_description(&destination.name, &request.description),
    };
    let incoming = TransferLeg {
        posting: destination.post(Direction::Entrada, amount)?,
        description: incoming_description(&source.name, &request.description),
    };

    Ok(TransferPlan {
        outgoing,
        incoming,
        source,
        destination,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn state(id: u128, name: &str, balance: Decimal) -> AccountState {
        AccountState {
            id: BankAccountId::from_uuid(Uuid::from_u128(id)),
            name: name.to_string(),
            balance,
            version: 3,
        }
    }

    fn request(source: &AccountState, destination: &AccountState, amount: Decimal) -> TransferRequest {
        TransferRequest {
            source: source.id,
            destination: destination.id,
            amount,
            description: "float".to_string(),
            notes: None,
        }
    }

    #[test]
    fn test_caixa_to_banco_x() {
        let caixa = state(1, "Caixa", dec!(1000.00));
        let banco = state(2, "Banco X", dec!(0.00));
        let plan = plan_transfer(&request(&caixa, &banco, dec!(250.00)), Some(caixa), Some(banco)).unwrap();

        assert_eq!(plan.source.balance, dec!(750.00));
        assert_eq!(plan.destination.balance, dec!(250.00));
        assert_eq!(plan.outgoing.posting.direction, Direction::Saida);
        assert_eq!(plan.outgoing.posting.snapshot.before, dec!(1000.00));
        assert_eq!(plan.outgoing.posting.snapshot.after, dec!(750.00));
        assert_eq!(plan.incoming.posting.snapshot.before, dec!(0.00));
        assert_eq!(plan.incoming.posting.snapshot.after, dec!(250.00));
        assert_eq!(plan.outgoing.description, "Transfer to Banco X: float");
        assert_eq!(plan.incoming.description, "Transfer received from Caixa: float");
        assert_eq!(plan.source.version, 4);
    }

    #[test]
    fn test_insufficient_funds() {
        let source = state(1, "A", dec!(100.00));
        let destination = state(2, "B", dec!(0));
        let err = plan_transfer(&request(&source, &destination, dec!(150.00)), Some(source), Some(destination))
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientFunds { available, requested, .. }
                if available == dec!(100.00) && requested == dec!(150.00)
        ));
    }

    #[test]
    fn test_exact_balance_allowed() {
        let source = state(1, "A", dec!(100.00));
        let destination = state(2, "B", dec!(0));
        let plan = plan_transfer(&request(&source, &destination, dec!(100.00)), Some(source), Some(destination))
            .unwrap();
        assert_eq!(plan.source.balance, Decimal::ZERO);
    }

    #[test]
    fn test_amount_checked_before_same_account() {
        let a = state(1, "A", dec!(100));
        let err = plan_transfer(&request(&a, &a, dec!(0)), Some(a.clone()), Some(a)).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidAmount(_)));
    }

    #[test]
    fn test_same_account_checked_before_existence() {
        let a = state(1, "A", dec!(100));
        let err = plan_transfer(&request(&a, &a, dec!(10)), None, None).unwrap_err();
        assert!(matches!(err, LedgerError::SameAccount(_)));
    }

    #[test]
    fn test_missing_source_reported_first() {
        let a = state(1, "A", dec!(100));
        let b = state(2, "B", dec!(0));
        let err = plan_transfer(&request(&a, &b, dec!(10)), None, None).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::AccountNotFound { side: AccountSide::Source, .. }
        ));

        let err = plan_transfer(&request(&a, &b, dec!(10)), Some(a.clone()), None).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::AccountNotFound { side: AccountSide::Destination, .. }
        ));
    }

    #[test]
    fn test_lock_order_ascending() {
        let low = state(1, "A", dec!(0));
        let high = state(2, "B", dec!(0));
        assert_eq!(request(&high, &low, dec!(1)).lock_order(), [low.id, high.id]);
        assert_eq!(request(&low, &high, dec!(1)).lock_order(), [low.id, high.id]);
    }
}
