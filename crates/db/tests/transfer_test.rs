//! Integration tests for transfers, including concurrent opposite transfers
//! and idempotent retries.

mod common;

use agencia_core::financial::{Counterparties, FinancialDirection, NewFinancialAccount};
use agencia_core::ledger::{AccountSide, LedgerError, TransferRequest};
use agencia_db::entities::sea_orm_active_enums::TransactionDirection;
use agencia_db::repositories::{
    BankAccountRepository, CreateBankAccountInput, FinancialAccountRepository, LedgerRepository,
    LiquidationInput, RepositoryError, TransferRepository,
};
use agencia_shared::OverpaymentPolicy;
use agencia_shared::types::{BankAccountId, FinancialAccountId};
use futures::future::join_all;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use common::{bank_account, connect, date};

fn request(source: Uuid, destination: Uuid, amount: Decimal) -> TransferRequest {
    TransferRequest {
        source: BankAccountId::from_uuid(source),
        destination: BankAccountId::from_uuid(destination),
        amount,
        description: "cash deposit".to_string(),
        notes: None,
    }
}

#[tokio::test]
async fn test_transfer_moves_balance_with_two_legs() {
    let Some(db) = connect().await else { return };
    let caixa = bank_account(&db, "Caixa", dec!(1000.00)).await;
    let banco = bank_account(&db, "Banco X", dec!(0.00)).await;

    let outcome = TransferRepository::new(db.clone())
        .transfer(&request(caixa.id, banco.id, dec!(250.00)), date(2026, 3, 2), None)
        .await
        .unwrap();

    assert_eq!(outcome.source_balance, dec!(750.00));
    assert_eq!(outcome.destination_balance, dec!(250.00));
    assert!(!outcome.replayed);

    assert_eq!(outcome.outgoing.direction, TransactionDirection::Saida);
    assert_eq!(outcome.outgoing.balance_before, dec!(1000.00));
    assert_eq!(outcome.outgoing.balance_after, dec!(750.00));
    assert_eq!(
        outcome.outgoing.description,
        format!("Transfer to {}: cash deposit", banco.name)
    );

    assert_eq!(outcome.incoming.direction, TransactionDirection::Entrada);
    assert_eq!(outcome.incoming.balance_before, dec!(0.00));
    assert_eq!(outcome.incoming.balance_after, dec!(250.00));
    assert_eq!(
        outcome.incoming.description,
        format!("Transfer received from {}: cash deposit", caixa.name)
    );
    assert_eq!(outcome.outgoing.created_at, outcome.incoming.created_at);

    let accounts = BankAccountRepository::new(db);
    let caixa = accounts.find(BankAccountId::from_uuid(caixa.id)).await.unwrap();
    let banco = accounts.find(BankAccountId::from_uuid(banco.id)).await.unwrap();
    assert_eq!(caixa.balance, dec!(750.00));
    assert_eq!(banco.balance, dec!(250.00));
}

#[tokio::test]
async fn test_insufficient_funds_writes_nothing() {
    let Some(db) = connect().await else { return };
    let source = bank_account(&db, "Caixa", dec!(100.00)).await;
    let destination = bank_account(&db, "Banco X", dec!(0.00)).await;

    let err = TransferRepository::new(db.clone())
        .transfer(&request(source.id, destination.id, dec!(150.00)), date(2026, 3, 2), None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::Ledger(LedgerError::InsufficientFunds { .. })
    ));

    let ledger = LedgerRepository::new(db.clone());
    let source_id = BankAccountId::from_uuid(source.id);
    assert!(ledger.list(source_id, None, None).await.unwrap().is_empty());
    assert!(
        ledger
            .list(BankAccountId::from_uuid(destination.id), None, None)
            .await
            .unwrap()
            .is_empty()
    );
    let source = BankAccountRepository::new(db).find(source_id).await.unwrap();
    assert_eq!(source.balance, dec!(100.00));
}

#[tokio::test]
async fn test_precondition_order() {
    let Some(db) = connect().await else { return };
    let account = bank_account(&db, "Caixa", dec!(100.00)).await;
    let repo = TransferRepository::new(db);

    let err = repo
        .transfer(&request(account.id, account.id, dec!(0)), date(2026, 3, 2), None)
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Ledger(LedgerError::InvalidAmount(_))));

    let err = repo
        .transfer(&request(account.id, account.id, dec!(10.00)), date(2026, 3, 2), None)
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Ledger(LedgerError::SameAccount(_))));

    let err = repo
        .transfer(&request(Uuid::now_v7(), Uuid::now_v7(), dec!(10.00)), date(2026, 3, 2), None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::Ledger(LedgerError::AccountNotFound {
            side: AccountSide::Source,
            ..
        })
    ));

    let err = repo
        .transfer(&request(account.id, Uuid::now_v7(), dec!(10.00)), date(2026, 3, 2), None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::Ledger(LedgerError::AccountNotFound {
            side: AccountSide::Destination,
            ..
        })
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_opposite_transfers_conserve_money() {
    let Some(db) = connect().await else { return };
    let a = bank_account(&db, "Caixa", dec!(1000.00)).await;
    let b = bank_account(&db, "Banco X", dec!(1000.00)).await;

    const ROUNDS: usize = 10;
    let repo = TransferRepository::new(db.clone());
    let handles = (0..ROUNDS * 2).map(|i| {
        let repo = repo.clone();
        let req = if i % 2 == 0 {
            request(a.id, b.id, dec!(10.00))
        } else {
            request(b.id, a.id, dec!(5.00))
        };
        tokio::spawn(async move { repo.transfer(&req, date(2026, 3, 3), None).await })
    });

    for result in join_all(handles).await {
        result.expect("task should not panic").expect("transfer should commit");
    }

    let accounts = BankAccountRepository::new(db.clone());
    let a_id = BankAccountId::from_uuid(a.id);
    let b_id = BankAccountId::from_uuid(b.id);
    let a_after = accounts.find(a_id).await.unwrap();
    let b_after = accounts.find(b_id).await.unwrap();
    assert_eq!(a_after.balance, dec!(950.00));
    assert_eq!(b_after.balance, dec!(1050.00));
    assert_eq!(a_after.balance + b_after.balance, dec!(2000.00));

    // two independent legs per transfer, no netting
    let ledger = LedgerRepository::new(db);
    assert_eq!(ledger.list(a_id, None, None).await.unwrap().len(), ROUNDS * 2);
    assert_eq!(ledger.list(b_id, None, None).await.unwrap().len(), ROUNDS * 2);

    for id in [a_id, b_id] {
        let report = accounts.recalculate(id, false).await.unwrap();
        assert!(!report.has_drift());
        assert_eq!(report.broken_snapshots, 0);
    }
}

#[tokio::test]
async fn test_retried_transfer_is_replayed() {
    let Some(db) = connect().await else { return };
    let source = bank_account(&db, "Caixa", dec!(500.00)).await;
    let destination = bank_account(&db, "Banco X", dec!(0.00)).await;
    let repo = TransferRepository::new(db.clone());
    let key = format!("transfer-{}", Uuid::new_v4());
    let req = request(source.id, destination.id, dec!(200.00));

    let first = repo.transfer(&req, date(2026, 3, 4), Some(&key)).await.unwrap();
    let second = repo.transfer(&req, date(2026, 3, 4), Some(&key)).await.unwrap();

    assert!(!first.replayed);
    assert!(second.replayed);
    assert_eq!(first.outgoing.id, second.outgoing.id);
    assert_eq!(first.incoming.id, second.incoming.id);
    assert_eq!(second.source_balance, dec!(300.00));
    assert_eq!(second.destination_balance, dec!(200.00));

    let source_id = BankAccountId::from_uuid(source.id);
    let stored = BankAccountRepository::new(db.clone()).find(source_id).await.unwrap();
    assert_eq!(stored.balance, dec!(300.00));
    assert_eq!(
        LedgerRepository::new(db).list(source_id, None, None).await.unwrap().len(),
        1
    );
}

#[tokio::test]
async fn test_key_reused_for_other_operation() {
    let Some(db) = connect().await else { return };
    let source = bank_account(&db, "Caixa", dec!(500.00)).await;
    let destination = bank_account(&db, "Banco X", dec!(0.00)).await;
    let key = format!("shared-{}", Uuid::new_v4());

    TransferRepository::new(db.clone())
        .transfer(&request(source.id, destination.id, dec!(10.00)), date(2026, 3, 4), Some(&key))
        .await
        .unwrap();

    let financial = FinancialAccountRepository::new(db.clone());
    let receivable = financial
        .create(NewFinancialAccount {
            description: "Package tour".to_string(),
            total: dec!(100.00),
            direction: FinancialDirection::Receber,
            due_date: date(2026, 3, 10),
            counterparties: Counterparties::default(),
            sale_id: None,
            payment_plan_id: None,
            category_id: None,
        })
        .await
        .unwrap();

    let err = financial
        .liquidate(
            FinancialAccountId::from_uuid(receivable.id),
            LiquidationInput {
                amount: dec!(100.00),
                bank_account_id: BankAccountId::from_uuid(destination.id),
                liquidation_date: date(2026, 3, 10),
                category_id: None,
                attachments: Vec::new(),
                notes: None,
            },
            OverpaymentPolicy::Allow,
            Some(&key),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::Ledger(LedgerError::IdempotencyKeyReused { .. })
    ));

    let untouched = financial
        .find(FinancialAccountId::from_uuid(receivable.id))
        .await
        .unwrap();
    assert_eq!(untouched.liquidated_amount, Decimal::ZERO);
}

#[tokio::test]
async fn test_failed_incoming_leg_rolls_back_outgoing_leg() {
    let Some(db) = connect().await else { return };
    let accounts = BankAccountRepository::new(db.clone());
    // only the incoming description, which carries this name, overflows its column
    let source = accounts
        .create(CreateBankAccountInput {
            name: "S".repeat(255),
            opening_balance: Some(dec!(500.00)),
            ..CreateBankAccountInput::default()
        })
        .await
        .unwrap();
    let destination = bank_account(&db, "Banco X", dec!(0.00)).await;

    let mut req = request(source.id, destination.id, dec!(100.00));
    req.description = "d".repeat(230);
    let err = TransferRepository::new(db.clone())
        .transfer(&req, date(2026, 3, 5), None)
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Database(_)));

    let source_id = BankAccountId::from_uuid(source.id);
    let destination_id = BankAccountId::from_uuid(destination.id);
    let source = accounts.find(source_id).await.unwrap();
    assert_eq!(source.balance, dec!(500.00));
    assert_eq!(source.version, 0);
    let destination = accounts.find(destination_id).await.unwrap();
    assert_eq!(destination.balance, dec!(0.00));
    assert_eq!(destination.version, 0);

    let ledger = LedgerRepository::new(db);
    assert!(ledger.list(source_id, None, None).await.unwrap().is_empty());
    assert!(ledger.list(destination_id, None, None).await.unwrap().is_empty());
}
