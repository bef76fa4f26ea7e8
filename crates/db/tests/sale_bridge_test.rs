//! Integration tests for the sale-to-ledger bridge.

mod common;

use agencia_core::sale::{Receiver, SaleError};
use agencia_db::entities::sea_orm_active_enums::{
    CommissionStatusDb, FinancialAccountDirection, FinancialAccountStatus, PlanReceiver,
    PlanStatusDb, SaleStatusDb,
};
use agencia_db::entities::{financial_accounts, payment_plans};
use agencia_db::repositories::{
    BankAccountRepository, FinancialAccountRepository, LiquidationInput, NewPlanInput,
    PlanLiquidationInput, RepositoryError, SaleBridgeRepository, UpdatePlanInput,
};
use agencia_shared::OverpaymentPolicy;
use agencia_shared::types::{BankAccountId, FinancialAccountId, PaymentPlanId, SaleId, UserId};
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};
use uuid::Uuid;

use common::{bank_account, connect, date, quote};

fn installment(amount: Decimal, receiver: Receiver) -> NewPlanInput {
    NewPlanInput {
        description: "Installment 1/2".to_string(),
        amount,
        due_date: date(2026, 5, 10),
        payment_method: Some("pix".to_string()),
        payment_condition: None,
        receiver,
        payer_reference: None,
    }
}

async fn shadows_of(db: &DatabaseConnection, plan_id: Uuid) -> u64 {
    financial_accounts::Entity::find()
        .filter(financial_accounts::Column::PaymentPlanId.eq(plan_id))
        .count(db)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_confirm_raises_obligations() {
    let Some(db) = connect().await else { return };
    let sale = quote(&db, dec!(5000.00), dec!(4000.00), &[dec!(150.00), dec!(0)]).await;
    let sale_id = SaleId::from_uuid(sale.id);
    let bridge = SaleBridgeRepository::new(db);

    let outcome = bridge.confirm(sale_id, date(2026, 4, 1)).await.unwrap();
    assert_eq!(outcome.sale.status, SaleStatusDb::Venda);
    assert_eq!(outcome.accounts.len(), 3);

    let receivable = &outcome.accounts[0];
    assert_eq!(receivable.direction, FinancialAccountDirection::Receber);
    assert_eq!(receivable.total_amount, dec!(5000.00));
    assert_eq!(receivable.client_id, sale.client_id);
    assert_eq!(outcome.accounts[1].total_amount, dec!(4000.00));
    assert_eq!(outcome.accounts[1].supplier_id, sale.supplier_id);
    assert_eq!(outcome.accounts[2].total_amount, dec!(150.00));
    assert!(outcome.accounts.iter().all(|a| {
        a.status == FinancialAccountStatus::Pendente
            && a.open_amount == a.total_amount
            && a.sale_id == Some(sale.id)
    }));

    let err = bridge.confirm(sale_id, date(2026, 4, 1)).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Sale(SaleError::AlreadyConfirmed(_))));

    let err = bridge.confirm(SaleId::new(), date(2026, 4, 1)).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Sale(SaleError::NotFound(_))));
}

#[tokio::test]
async fn test_plan_keeps_one_shadow_account() {
    let Some(db) = connect().await else { return };
    let sale = quote(&db, dec!(5000.00), dec!(4000.00), &[]).await;
    let bridge = SaleBridgeRepository::new(db.clone());

    let created = bridge
        .create_plan(SaleId::from_uuid(sale.id), installment(dec!(1000.00), Receiver::Agencia))
        .await
        .unwrap();
    assert_eq!(created.shadow.direction, FinancialAccountDirection::Receber);
    assert_eq!(created.shadow.payment_plan_id, Some(created.plan.id));
    assert_eq!(created.shadow.client_id, sale.client_id);
    let plan_id = PaymentPlanId::from_uuid(created.plan.id);

    let patched = bridge
        .update_plan(
            plan_id,
            UpdatePlanInput {
                amount: Some(dec!(1200.00)),
                due_date: Some(date(2026, 6, 10)),
                ..UpdatePlanInput::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(patched.shadow.id, created.shadow.id);
    assert_eq!(patched.shadow.total_amount, dec!(1200.00));
    assert_eq!(patched.shadow.open_amount, dec!(1200.00));
    assert_eq!(patched.shadow.due_date, date(2026, 6, 10));
    assert_eq!(patched.plan.amount, dec!(1200.00));

    let recreated = bridge
        .update_plan(
            plan_id,
            UpdatePlanInput {
                receiver: Some(Receiver::Fornecedor),
                ..UpdatePlanInput::default()
            },
        )
        .await
        .unwrap();
    assert_ne!(recreated.shadow.id, created.shadow.id);
    assert_eq!(recreated.shadow.direction, FinancialAccountDirection::Pagar);
    assert_eq!(recreated.shadow.supplier_id, sale.supplier_id);
    assert_eq!(recreated.plan.receiver, PlanReceiver::Fornecedor);
    assert_eq!(shadows_of(&db, created.plan.id).await, 1);

    bridge.delete_plan(plan_id).await.unwrap();
    assert_eq!(shadows_of(&db, created.plan.id).await, 0);
    let err = bridge.delete_plan(plan_id).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Sale(SaleError::PlanNotFound(_))));
}

#[tokio::test]
async fn test_shadow_with_liquidations_is_protected() {
    let Some(db) = connect().await else { return };
    let bank = bank_account(&db, "Caixa", dec!(0.00)).await;
    let sale = quote(&db, dec!(2000.00), dec!(1500.00), &[]).await;
    let bridge = SaleBridgeRepository::new(db.clone());

    let created = bridge
        .create_plan(SaleId::from_uuid(sale.id), installment(dec!(800.00), Receiver::Agencia))
        .await
        .unwrap();
    FinancialAccountRepository::new(db)
        .liquidate(
            FinancialAccountId::from_uuid(created.shadow.id),
            LiquidationInput {
                amount: dec!(300.00),
                bank_account_id: BankAccountId::from_uuid(bank.id),
                liquidation_date: date(2026, 5, 1),
                category_id: None,
                attachments: Vec::new(),
                notes: None,
            },
            OverpaymentPolicy::Allow,
            None,
        )
        .await
        .unwrap();
    let plan_id = PaymentPlanId::from_uuid(created.plan.id);

    let err = bridge
        .update_plan(
            plan_id,
            UpdatePlanInput {
                receiver: Some(Receiver::Fornecedor),
                ..UpdatePlanInput::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Sale(SaleError::ShadowAccountLiquidated(_))));

    let err = bridge.delete_plan(plan_id).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Sale(SaleError::ShadowAccountLiquidated(_))));

    // same-direction edits keep what was already liquidated
    let patched = bridge
        .update_plan(
            plan_id,
            UpdatePlanInput {
                amount: Some(dec!(1000.00)),
                ..UpdatePlanInput::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(patched.shadow.liquidated_amount, dec!(300.00));
    assert_eq!(patched.shadow.open_amount, dec!(700.00));
    assert_eq!(patched.shadow.status, FinancialAccountStatus::Parcial);
}

#[tokio::test]
async fn test_supplier_plan_liquidation_records_commission() {
    let Some(db) = connect().await else { return };
    let bank = bank_account(&db, "Banco X", dec!(100.00)).await;
    let sale = quote(&db, dec!(5000.00), dec!(4000.00), &[]).await;
    let sale_id = SaleId::from_uuid(sale.id);
    let bridge = SaleBridgeRepository::new(db.clone());
    let agent = UserId::new();

    let created = bridge
        .create_plan(sale_id, installment(dec!(1000.00), Receiver::Fornecedor))
        .await
        .unwrap();
    let plan_id = PaymentPlanId::from_uuid(created.plan.id);

    let outcome = bridge
        .liquidate_plan(
            plan_id,
            PlanLiquidationInput {
                bank_account_id: Some(BankAccountId::from_uuid(bank.id)),
                liquidation_date: date(2026, 5, 12),
                notes: Some("paid at the counter".to_string()),
            },
            agent,
        )
        .await
        .unwrap();

    assert_eq!(outcome.plan.status, PlanStatusDb::Liquidado);
    assert_eq!(outcome.plan.paid_amount, dec!(1000.00));
    assert_eq!(outcome.plan.open_amount, Decimal::ZERO);
    assert_eq!(outcome.plan.bank_account_id, Some(bank.id));
    assert_eq!(outcome.shadow.id, created.shadow.id);

    let commission = outcome.commission.expect("supplier installments earn a commission");
    assert_eq!(commission.percentage, dec!(20.00));
    assert_eq!(commission.amount, dec!(200.00));
    assert_eq!(commission.beneficiary_user_id, agent.into_inner());
    assert_eq!(commission.status, CommissionStatusDb::AReceber);
    assert_eq!(commission.expected_date, Some(date(2026, 5, 10)));

    let commissions = bridge.list_commissions(sale_id).await.unwrap();
    assert_eq!(commissions.len(), 1);

    let err = bridge
        .liquidate_plan(
            plan_id,
            PlanLiquidationInput {
                bank_account_id: None,
                liquidation_date: date(2026, 5, 13),
                notes: None,
            },
            agent,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Sale(SaleError::PlanAlreadyLiquidated(_))));

    let err = bridge
        .update_plan(plan_id, UpdatePlanInput::default())
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Sale(SaleError::PlanAlreadyLiquidated(_))));

    // no bank balance moves on plan liquidation
    let bank = BankAccountRepository::new(db)
        .find(BankAccountId::from_uuid(bank.id))
        .await
        .unwrap();
    assert_eq!(bank.balance, dec!(100.00));
}

#[tokio::test]
async fn test_liquidation_creates_missing_shadow_once() {
    let Some(db) = connect().await else { return };
    let sale = quote(&db, dec!(3000.00), dec!(2000.00), &[]).await;

    // a plan written before shadow accounts were tracked
    let now = Utc::now().into();
    let plan = payment_plans::ActiveModel {
        id: Set(Uuid::now_v7()),
        sale_id: Set(sale.id),
        description: Set("Deposit".to_string()),
        amount: Set(dec!(500.00)),
        due_date: Set(date(2026, 5, 1)),
        receiver: Set(PlanReceiver::Agencia),
        status: Set(PlanStatusDb::Pendente),
        paid_amount: Set(Decimal::ZERO),
        open_amount: Set(dec!(500.00)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&db)
    .await
    .unwrap();

    let bridge = SaleBridgeRepository::new(db.clone());
    let outcome = bridge
        .liquidate_plan(
            PaymentPlanId::from_uuid(plan.id),
            PlanLiquidationInput {
                bank_account_id: None,
                liquidation_date: date(2026, 5, 2),
                notes: None,
            },
            UserId::new(),
        )
        .await
        .unwrap();

    assert_eq!(outcome.shadow.direction, FinancialAccountDirection::Receber);
    assert_eq!(outcome.shadow.total_amount, dec!(500.00));
    assert!(outcome.commission.is_none());
    assert_eq!(shadows_of(&db, plan.id).await, 1);

    let plans = bridge.list_plans(SaleId::from_uuid(sale.id)).await.unwrap();
    assert_eq!(plans.len(), 1);
}

#[tokio::test]
async fn test_create_plan_rejects_bad_amount() {
    let Some(db) = connect().await else { return };
    let sale = quote(&db, dec!(1000.00), dec!(800.00), &[]).await;

    let err = SaleBridgeRepository::new(db)
        .create_plan(SaleId::from_uuid(sale.id), installment(dec!(-1.00), Receiver::Agencia))
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Sale(SaleError::InvalidPlanAmount(_))));
}
