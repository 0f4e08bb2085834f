use axum::{routing::get, middleware, Router};
use crate::handlers::customer::{
    list_customers, get_customer, create_customer, update_customer, delete_customer,
    get_customer_ledger, get_customer_outstanding,
};
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/customers", get(list_customers).post(create_customer))
        .route(
            "/customers/{id}",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
        .route("/customers/{id}/ledger", get(get_customer_ledger))
        .route("/customers/{id}/outstanding", get(get_customer_outstanding))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
}
