pub mod accountings;
pub mod bills;
pub mod customers;
pub mod expenses;
pub mod files;
pub mod payroll;
pub mod products;
pub mod purchases;
pub mod reports;
pub mod salesmen;
pub mod shifts;
pub mod suppliers;
pub mod tanks;
pub mod users;

use axum::{routing::get, Router};
use crate::state::AppState;

pub const API_PREFIX: &str = "/api/v1";

pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(health_check))
        .merge(users::routes(&state))
        .merge(salesmen::routes(&state))
        .merge(customers::routes(&state))
        .merge(suppliers::routes(&state))
        .merge(products::routes(&state))
        .merge(tanks::routes(&state))
        .merge(purchases::routes(&state))
        .merge(shifts::routes(&state))
        .merge(bills::routes(&state))
        .merge(expenses::routes(&state))
        .merge(payroll::routes(&state))
        .merge(accountings::routes(&state))
        .merge(reports::routes(&state))
        .merge(files::routes(&state));

    Router::new().nest(API_PREFIX, api).with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{sign_token, TokenSubject};
    use crate::config::Config;
    use crate::models::user::UserRole;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;
    use uuid::Uuid;

    const SECRET: &str = "router-test-secret";

    // The pool never connects; these requests are all answered before a query runs.
    fn app() -> Router {
        let config = Config::from_lookup(|key| match key {
            "DATABASE_URL" => Some("postgres://pumpdesk@localhost:1/unused".into()),
            "JWT_SECRET" => Some(SECRET.into()),
            _ => None,
        })
        .unwrap();
        let pool = PgPoolOptions::new().connect_lazy(&config.database_url).unwrap();
        create_router(AppState::new(pool, config))
    }

    fn token(role: UserRole) -> String {
        sign_token(
            &TokenSubject {
                user_id: Uuid::new_v4(),
                pump_master_id: Uuid::new_v4(),
                role,
                username: "ravi",
            },
            SECRET,
            1,
        )
        .unwrap()
    }

    async fn send(req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let res = app().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn health_is_open() {
        let res = app()
            .oneshot(Request::get("/api/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn protected_routes_need_a_token() {
        let (status, body) = send(Request::get("/api/v1/customers").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "unauthorized");
    }

    #[tokio::test]
    async fn tampered_token_is_rejected() {
        let mut bad = token(UserRole::Manager);
        bad.push('x');
        let (status, _) = send(
            Request::get("/api/v1/salesman-nozzle-shifts/open")
                .header(header::AUTHORIZATION, format!("Bearer {bad}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn non_bearer_scheme_is_rejected() {
        let (status, _) = send(
            Request::get("/api/v1/tanks")
                .header(header::AUTHORIZATION, "Basic cmF2aTpzZWNyZXQ=")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn salesman_cannot_create_products() {
        let (status, body) = send(
            Request::builder()
                .method(Method::POST)
                .uri("/api/v1/products")
                .header(header::AUTHORIZATION, format!("Bearer {}", token(UserRole::Salesman)))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{"productName":"Petrol","productType":"FUEL","salesUnit":"LITRE","salesRate":102.5}"#,
                ))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Only managers can create products");
    }

    #[tokio::test]
    async fn accounting_preview_rejects_negative_upi_before_touching_the_database() {
        let (status, body) = send(
            Request::builder()
                .method(Method::POST)
                .uri("/api/v1/salesman-shift-accountings/preview")
                .header(header::AUTHORIZATION, format!("Bearer {}", token(UserRole::Salesman)))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(format!(
                    r#"{{"salesmanNozzleShiftId":"{}","upiReceived":-5}}"#,
                    Uuid::new_v4()
                )))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "validation_error");
    }

    #[tokio::test]
    async fn profit_report_needs_both_dates() {
        let (status, _) = send(
            Request::get("/api/v1/profit-reports?from=2024-04-01")
                .header(header::AUTHORIZATION, format!("Bearer {}", token(UserRole::Admin)))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn payroll_rejects_a_multi_century_period() {
        let (status, body) = send(
            Request::get("/api/v1/employee-salary-configs/payroll?from=0001-01-01&to=9999-12-31")
                .header(header::AUTHORIZATION, format!("Bearer {}", token(UserRole::Manager)))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "validation_error");
    }

    #[tokio::test]
    async fn accounting_preview_rejects_counts_beyond_storage() {
        let (status, body) = send(
            Request::builder()
                .method(Method::POST)
                .uri("/api/v1/salesman-shift-accountings/preview")
                .header(header::AUTHORIZATION, format!("Bearer {}", token(UserRole::Salesman)))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(format!(
                    r#"{{"salesmanNozzleShiftId":"{}","denominations":{{"coins1":3000000000}}}}"#,
                    Uuid::new_v4()
                )))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "validation_error");
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let res = app()
            .oneshot(Request::get("/api/v1/no-such-resource").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}
