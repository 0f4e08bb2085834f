use axum::{routing::get, middleware, Router};
use crate::handlers::{bank_account, expense};
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/expenses", get(expense::list_expenses).post(expense::create_expense))
        .route(
            "/expenses/{id}",
            get(expense::get_expense).put(expense::update_expense).delete(expense::delete_expense),
        )
        .route(
            "/bank-accounts",
            get(bank_account::list_bank_accounts).post(bank_account::create_bank_account),
        )
        .route(
            "/bank-accounts/{id}",
            get(bank_account::get_bank_account)
                .put(bank_account::update_bank_account)
                .delete(bank_account::delete_bank_account),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
}
