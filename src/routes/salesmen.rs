use axum::{routing::get, middleware, Router};
use crate::handlers::salesman::{
    list_salesmen, get_salesman, create_salesman, update_salesman, deactivate_salesman,
};
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/salesmen", get(list_salesmen).post(create_salesman))
        .route(
            "/salesmen/{id}",
            get(get_salesman).put(update_salesman).delete(deactivate_salesman),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
}
