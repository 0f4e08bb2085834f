use axum::{routing::get, middleware, Router};
use crate::handlers::{absence, payroll};
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/employee-salary-configs",
            get(payroll::list_salary_configs).post(payroll::create_salary_config),
        )
        .route("/employee-salary-configs/payroll", get(payroll::get_payroll))
        .route(
            "/employee-salary-configs/{id}",
            get(payroll::get_salary_config)
                .put(payroll::update_salary_config)
                .delete(payroll::delete_salary_config),
        )
        .route("/user-absences", get(absence::list_absences).post(absence::create_absence))
        .route(
            "/user-absences/{id}",
            get(absence::get_absence).put(absence::update_absence).delete(absence::delete_absence),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
}
