use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    middleware,
    Router,
};
use crate::handlers::file::{download_file, upload_file};
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/files",
            post(upload_file).layer(DefaultBodyLimit::max(state.config.max_upload_bytes)),
        )
        .route("/files/{id}", get(download_file))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
}
