//! Ledger schema.
//!
//! Creates the enums, tables, CHECK constraints and indexes for bank accounts,
//! the bank transaction ledger, financial accounts, the sale bridge and
//! idempotency keys.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: BANK ACCOUNTS & SALES
        // ============================================================
        db.execute_unprepared(BANK_ACCOUNTS_SQL).await?;
        db.execute_unprepared(SALES_SQL).await?;
        db.execute_unprepared(SALE_SELLERS_SQL).await?;
        db.execute_unprepared(PAYMENT_PLANS_SQL).await?;

        // ============================================================
        // PART 3: OBLIGATIONS & LEDGER
        // ============================================================
        db.execute_unprepared(FINANCIAL_ACCOUNTS_SQL).await?;
        db.execute_unprepared(BANK_TRANSACTIONS_SQL).await?;
        db.execute_unprepared(SALE_COMMISSIONS_SQL).await?;

        // ============================================================
        // PART 4: IDEMPOTENCY
        // ============================================================
        db.execute_unprepared(IDEMPOTENCY_KEYS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
CREATE TYPE transaction_direction AS ENUM ('entrada', 'saida');
CREATE TYPE financial_direction AS ENUM ('pagar', 'receber');
CREATE TYPE financial_status AS ENUM ('pendente', 'parcial', 'liquidado');
CREATE TYPE sale_status AS ENUM ('orcamento', 'venda', 'cancelada');
CREATE TYPE plan_receiver AS ENUM ('AGENCIA', 'FORNECEDOR');
CREATE TYPE plan_status AS ENUM ('pendente', 'liquidado');
CREATE TYPE commission_status AS ENUM ('a_receber', 'recebida');
CREATE TYPE idempotency_scope AS ENUM ('transfer', 'liquidation');
";

const BANK_ACCOUNTS_SQL: &str = r"
CREATE TABLE bank_accounts (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    bank VARCHAR(255),
    branch VARCHAR(50),
    account_number VARCHAR(50),
    opening_balance NUMERIC(15, 2) NOT NULL DEFAULT 0,
    balance NUMERIC(15, 2) NOT NULL DEFAULT 0,
    version BIGINT NOT NULL DEFAULT 0,
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_opening_balance_non_negative CHECK (opening_balance >= 0),
    CONSTRAINT chk_version_non_negative CHECK (version >= 0)
);

CREATE INDEX idx_bank_accounts_active_name ON bank_accounts(is_active, name);
";

const SALES_SQL: &str = r"
CREATE TABLE sales (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    client_id UUID,
    supplier_id UUID,
    total_amount NUMERIC(15, 2) NOT NULL DEFAULT 0,
    total_cost NUMERIC(15, 2) NOT NULL DEFAULT 0,
    status sale_status NOT NULL DEFAULT 'orcamento',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const SALE_SELLERS_SQL: &str = r"
CREATE TABLE sale_sellers (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    sale_id UUID NOT NULL REFERENCES sales(id) ON DELETE CASCADE,
    user_id UUID NOT NULL,
    commission_amount NUMERIC(15, 2) NOT NULL DEFAULT 0
);

CREATE INDEX idx_sale_sellers_sale ON sale_sellers(sale_id);
";

const PAYMENT_PLANS_SQL: &str = r"
CREATE TABLE payment_plans (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    sale_id UUID NOT NULL REFERENCES sales(id) ON DELETE CASCADE,
    description VARCHAR(500) NOT NULL,
    amount NUMERIC(15, 2) NOT NULL,
    due_date DATE NOT NULL,
    payment_method VARCHAR(100),
    payment_condition VARCHAR(100),
    receiver plan_receiver NOT NULL,
    payer_reference VARCHAR(255),
    status plan_status NOT NULL DEFAULT 'pendente',
    paid_amount NUMERIC(15, 2) NOT NULL DEFAULT 0,
    open_amount NUMERIC(15, 2) NOT NULL,
    bank_account_id UUID REFERENCES bank_accounts(id),
    liquidation_date DATE,
    liquidation_notes TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_plan_amount_positive CHECK (amount > 0)
);

CREATE INDEX idx_payment_plans_sale ON payment_plans(sale_id, due_date);
";

const FINANCIAL_ACCOUNTS_SQL: &str = r"
CREATE TABLE financial_accounts (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    description VARCHAR(500) NOT NULL,
    sale_id UUID REFERENCES sales(id),
    payment_plan_id UUID REFERENCES payment_plans(id),
    direction financial_direction NOT NULL,
    total_amount NUMERIC(15, 2) NOT NULL,
    liquidated_amount NUMERIC(15, 2) NOT NULL DEFAULT 0,
    open_amount NUMERIC(15, 2) NOT NULL,
    due_date DATE NOT NULL,
    status financial_status NOT NULL DEFAULT 'pendente',
    category_id UUID,
    client_id UUID,
    supplier_id UUID,
    user_id UUID,
    liquidation_date DATE,
    last_bank_account_id UUID REFERENCES bank_accounts(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_total_positive CHECK (total_amount > 0),
    CONSTRAINT chk_total_equals_liquidated_plus_open CHECK (
        total_amount = liquidated_amount + open_amount
    ),
    CONSTRAINT chk_status_matches_amounts CHECK (
        (status = 'liquidado' AND open_amount <= 0)
        OR (status = 'parcial' AND open_amount > 0 AND liquidated_amount > 0)
        OR (status = 'pendente' AND open_amount > 0 AND liquidated_amount <= 0)
    )
);

CREATE UNIQUE INDEX idx_financial_accounts_plan ON financial_accounts(payment_plan_id)
    WHERE payment_plan_id IS NOT NULL;
CREATE INDEX idx_financial_accounts_sale ON financial_accounts(sale_id);
CREATE INDEX idx_financial_accounts_status ON financial_accounts(status, due_date);
";

const BANK_TRANSACTIONS_SQL: &str = r"
CREATE TABLE bank_transactions (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    bank_account_id UUID NOT NULL REFERENCES bank_accounts(id),
    financial_account_id UUID REFERENCES financial_accounts(id),
    description VARCHAR(500) NOT NULL,
    amount NUMERIC(15, 2) NOT NULL,
    direction transaction_direction NOT NULL,
    transaction_date DATE NOT NULL,
    balance_before NUMERIC(15, 2) NOT NULL,
    balance_after NUMERIC(15, 2) NOT NULL,
    account_version BIGINT NOT NULL,
    reconciled BOOLEAN NOT NULL DEFAULT false,
    attachments JSONB NOT NULL DEFAULT '[]'::jsonb,
    notes TEXT,
    idempotency_key VARCHAR(255),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_amount_positive CHECK (amount > 0),
    CONSTRAINT chk_snapshot_matches_direction CHECK (
        balance_after = balance_before
            + CASE direction WHEN 'entrada' THEN amount ELSE -amount END
    ),
    UNIQUE (bank_account_id, account_version)
);

CREATE INDEX idx_bank_transactions_account_date
    ON bank_transactions(bank_account_id, transaction_date, created_at);
CREATE INDEX idx_bank_transactions_financial_account ON bank_transactions(financial_account_id);
";

const SALE_COMMISSIONS_SQL: &str = r"
CREATE TABLE sale_commissions (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    sale_id UUID NOT NULL REFERENCES sales(id) ON DELETE CASCADE,
    payment_plan_id UUID REFERENCES payment_plans(id) ON DELETE SET NULL,
    beneficiary_user_id UUID NOT NULL,
    commission_type VARCHAR(50) NOT NULL,
    percentage NUMERIC(7, 2) NOT NULL,
    amount NUMERIC(15, 2) NOT NULL,
    expected_date DATE,
    received_date DATE,
    status commission_status NOT NULL DEFAULT 'a_receber',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_sale_commissions_sale ON sale_commissions(sale_id);
";

const IDEMPOTENCY_KEYS_SQL: &str = r"
CREATE TABLE idempotency_keys (
    key VARCHAR(255) PRIMARY KEY,
    scope idempotency_scope NOT NULL,
    resource_ids JSONB NOT NULL DEFAULT '[]'::jsonb,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS idempotency_keys;
DROP TABLE IF EXISTS sale_commissions;
DROP TABLE IF EXISTS bank_transactions;
DROP TABLE IF EXISTS financial_accounts;
DROP TABLE IF EXISTS payment_plans;
DROP TABLE IF EXISTS sale_sellers;
DROP TABLE IF EXISTS sales;
DROP TABLE IF EXISTS bank_accounts;

DROP TYPE IF EXISTS idempotency_scope;
DROP TYPE IF EXISTS commission_status;
DROP TYPE IF EXISTS plan_status;
DROP TYPE IF EXISTS plan_receiver;
DROP TYPE IF EXISTS sale_status;
DROP TYPE IF EXISTS financial_status;
DROP TYPE IF EXISTS financial_direction;
DROP TYPE IF EXISTS transaction_direction;
";
