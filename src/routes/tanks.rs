use axum::{routing::get, middleware, Router};
use crate::handlers::{nozzle, tank};
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/tanks", get(tank::list_tanks).post(tank::create_tank))
        .route(
            "/tanks/{id}",
            get(tank::get_tank).put(tank::update_tank).delete(tank::delete_tank),
        )
        .route("/tanks/{id}/balance", get(tank::get_tank_balance))
        .route("/nozzles", get(nozzle::list_nozzles).post(nozzle::create_nozzle))
        .route(
            "/nozzles/{id}",
            get(nozzle::get_nozzle).put(nozzle::update_nozzle).delete(nozzle::delete_nozzle),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
}
