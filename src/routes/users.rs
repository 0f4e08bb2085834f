use axum::{Router, routing::{post, get, put}, middleware};
use crate::state::AppState;
use crate::handlers::user::{register_pump_master, login_user, get_me, list_users, create_user, update_user};
use crate::middleware::auth::require_auth;

pub fn routes(state: &AppState) -> Router<AppState> {
    let open = Router::new()
        .route("/pump-masters/register", post(register_pump_master))
        .route("/users/login", post(login_user));

    let protected = Router::new()
        .route("/users/me", get(get_me))
        .route("/users", get(list_users).post(create_user))
        .route("/users/{id}", put(update_user))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    open.merge(protected)
}
