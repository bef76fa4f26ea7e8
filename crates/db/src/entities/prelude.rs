//! Entity prelude.

pub use super::bank_accounts::Entity as BankAccounts;
pub use super::bank_transactions::Entity as BankTransactions;
pub use super::financial_accounts::Entity as FinancialAccounts;
pub use super::idempotency_keys::Entity as IdempotencyKeys;
pub use super::payment_plans::Entity as PaymentPlans;
pub use super::sale_commissions::Entity as SaleCommissions;
pub use super::sale_sellers::Entity as SaleSellers;
pub use super::sales::Entity as Sales;
