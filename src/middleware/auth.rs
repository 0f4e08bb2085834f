use axum::{response::{Response, IntoResponse}};
use axum::extract::{Request, State};
use axum::middleware::Next;
use uuid::Uuid;
use crate::auth::jwt::verify_token;
use crate::error::AppError;
use crate::models::user::UserRole;
use crate::state::AppState;

#[derive(Clone, Debug)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub pump_master_id: Uuid,
    pub role: UserRole,
    pub username: String,
}

impl AuthContext {
    pub fn is_manager(&self) -> bool {
        matches!(self.role, UserRole::Admin | UserRole::Manager)
    }

    /// Fails with 403 unless the caller is an ADMIN or MANAGER.
    pub fn require_manager(&self, action: &str) -> Result<(), AppError> {
        if self.is_manager() {
            Ok(())
        } else {
            Err(AppError::forbidden(format!("Only managers can {action}")))
        }
    }
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let auth_header = match req.headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok()) {
        Some(h) => h,
        None => return AppError::unauthorized("Missing Authorization header").into_response(),
    };

    // Expect "Bearer <token>"
    let token = match auth_header.strip_prefix("Bearer ") {
        Some(t) => t.trim(),
        None => return AppError::unauthorized("Invalid Authorization format").into_response(),
    };

    let claims = match verify_token(token, &state.config.jwt_secret) {
        Ok(c) => c,
        Err(e) => {
            tracing::debug!(error = %e, "Rejected bearer token");
            return e.into_response();
        }
    };

    // Attach context
    req.extensions_mut().insert(AuthContext {
        user_id: claims.sub,
        pump_master_id: claims.pump_master_id,
        role: claims.role,
        username: claims.username,
    });

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(role: UserRole) -> AuthContext {
        AuthContext {
            user_id: Uuid::new_v4(),
            pump_master_id: Uuid::new_v4(),
            role,
            username: "someone".into(),
        }
    }

    #[test]
    fn admins_and_managers_manage() {
        assert!(context(UserRole::Admin).require_manager("edit products").is_ok());
        assert!(context(UserRole::Manager).require_manager("edit products").is_ok());
    }

    #[test]
    fn salesmen_are_forbidden() {
        let err = context(UserRole::Salesman).require_manager("edit products").unwrap_err();
        assert!(matches!(err, AppError::Forbidden(ref m) if m == "Only managers can edit products"));
    }
}
