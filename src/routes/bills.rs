use axum::{routing::get, middleware, Router};
use crate::handlers::{bill, payment};
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/salesman-bills", get(bill::list_bills).post(bill::create_bill))
        .route(
            "/salesman-bills/{id}",
            get(bill::get_bill).put(bill::update_bill).delete(bill::delete_bill),
        )
        .route(
            "/salesman-bill-payments",
            get(payment::list_payments).post(payment::create_payment),
        )
        .route(
            "/salesman-bill-payments/{id}",
            get(payment::get_payment)
                .put(payment::update_payment)
                .delete(payment::delete_payment),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
}
