use axum::{
    routing::{get, post},
    middleware,
    Router,
};
use crate::handlers::shift;
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/salesman-nozzle-shifts", get(shift::list_shifts).post(shift::open_shift))
        .route("/salesman-nozzle-shifts/open", get(shift::list_open_shifts))
        .route(
            "/salesman-nozzle-shifts/{id}",
            get(shift::get_shift).delete(shift::delete_shift),
        )
        .route("/salesman-nozzle-shifts/{id}/close", post(shift::close_shift))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
}
