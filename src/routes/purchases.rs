use axum::{routing::get, middleware, Router};
use crate::handlers::purchase::{
    list_purchases, get_purchase, create_purchase, update_purchase, delete_purchase,
};
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/purchases", get(list_purchases).post(create_purchase))
        .route(
            "/purchases/{id}",
            get(get_purchase).put(update_purchase).delete(delete_purchase),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
}
