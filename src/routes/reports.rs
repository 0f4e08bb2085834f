use axum::{routing::get, middleware, Router};
use crate::handlers::report::get_profit_report;
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/profit-reports", get(get_profit_report))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
}
