use axum::{
    routing::{get, post},
    middleware,
    Router,
};
use crate::handlers::accounting;
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/salesman-shift-accountings",
            get(accounting::list_accountings).post(accounting::create_accounting),
        )
        .route("/salesman-shift-accountings/preview", post(accounting::preview_accounting))
        .route(
            "/salesman-shift-accountings/shift/{shift_id}",
            get(accounting::get_accounting_by_shift),
        )
        .route(
            "/salesman-shift-accountings/shift/{shift_id}/system-totals",
            get(accounting::get_system_totals),
        )
        .route(
            "/salesman-shift-accountings/{id}",
            get(accounting::get_accounting)
                .put(accounting::update_accounting)
                .delete(accounting::delete_accounting),
        )
        .route("/salesman-shift-accountings/{id}/finalize", post(accounting::finalize_accounting))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
}
