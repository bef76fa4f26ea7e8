//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::auth::auth_middleware};

pub mod bank_accounts;
pub mod bank_transactions;
pub mod financial_accounts;
pub mod health;
pub mod payment_plans;
pub mod sales;

/// Creates the `/api` router. Every route sits behind the auth middleware.
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(bank_accounts::routes())
        .merge(bank_transactions::routes())
        .merge(financial_accounts::routes())
        .merge(sales::routes())
        .merge(payment_plans::routes())
        .layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Today's date, used when a request leaves a business date out.
pub(crate) fn today() -> chrono::NaiveDate {
    chrono::Utc::now().date_naive()
}
