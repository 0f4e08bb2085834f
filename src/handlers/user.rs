use axum::{extract::{Path, State}, http::StatusCode, Extension, Json};
use bcrypt::{hash, verify, DEFAULT_COST};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::jwt::{sign_token, TokenSubject};
use crate::dtos::common::{clean, require_max_len, require_text};
use crate::dtos::user::{
    CreateUserRequest, LoginRequest, LoginResponse, RegisterPumpMasterRequest,
    RegisterPumpMasterResponse, UpdateUserRequest,
};
use crate::error::{map_constraint_violation, AppError};
use crate::middleware::auth::AuthContext;
use crate::models::user::{PumpMaster, User, UserRole, USER_COLUMNS};
use crate::state::AppState;

const MIN_PASSWORD_LEN: usize = 6;

pub(crate) fn validate_credentials(username: &str, password: &str) -> Result<(), AppError> {
    require_text(username, "Username")?;
    require_max_len(Some(username), 50, "Username")?;
    if password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::validation("Password too short"));
    }
    Ok(())
}

pub(crate) fn hash_password(password: &str) -> Result<String, AppError> {
    hash(password, DEFAULT_COST).map_err(|e| AppError::internal(format!("Hash error: {e}")))
}

// POST /pump-masters/register - creates the station and its first ADMIN
#[instrument(skip_all, fields(code = %payload.code))]
pub async fn register_pump_master(
    State(AppState { db_pool, .. }): State<AppState>,
    Json(payload): Json<RegisterPumpMasterRequest>,
) -> Result<(StatusCode, Json<RegisterPumpMasterResponse>), AppError> {
    require_text(&payload.name, "Pump name")?;
    require_text(&payload.code, "Pump code")?;
    require_max_len(Some(&payload.code), 20, "Pump code")?;
    require_text(&payload.admin_full_name, "Admin full name")?;
    validate_credentials(&payload.admin_username, &payload.admin_password)?;

    let password_hash = hash_password(&payload.admin_password)?;

    let mut tx = db_pool.begin().await?;

    let pump_master = sqlx::query_as::<_, PumpMaster>(
        "INSERT INTO pump_masters (name, code, address)
         VALUES ($1, $2, $3)
         RETURNING id, name, code, address, created_at",
    )
    .bind(payload.name.trim())
    .bind(payload.code.trim().to_uppercase())
    .bind(clean(payload.address))
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| map_constraint_violation(e, "Pump code already exists"))?;

    let admin = sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (pump_master_id, username, password_hash, full_name, mobile_number, role)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING {USER_COLUMNS}"
    ))
    .bind(pump_master.id)
    .bind(payload.admin_username.trim())
    .bind(&password_hash)
    .bind(payload.admin_full_name.trim())
    .bind(clean(payload.admin_mobile_number))
    .bind(UserRole::Admin)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| map_constraint_violation(e, "Username already exists"))?;

    tx.commit().await?;

    info!(pump_master_id = %pump_master.id, "Pump master registered");
    Ok((StatusCode::CREATED, Json(RegisterPumpMasterResponse { pump_master, admin })))
}

#[derive(sqlx::FromRow)]
struct LoginRow {
    id: Uuid,
    pump_master_id: Uuid,
    username: String,
    password_hash: String,
    role: UserRole,
    is_active: bool,
}

// POST /users/login
pub async fn login_user(
    State(AppState { db_pool, config }): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    if payload.username.trim().is_empty() {
        return Err(AppError::validation("Username required"));
    }
    if payload.password.is_empty() {
        return Err(AppError::validation("Password required"));
    }

    let user = sqlx::query_as::<_, LoginRow>(
        "SELECT id, pump_master_id, username, password_hash, role, is_active
         FROM users WHERE username = $1",
    )
    .bind(payload.username.trim())
    .fetch_optional(&db_pool)
    .await?
    .ok_or_else(|| AppError::unauthorized("Invalid credentials"))?;

    if !user.is_active {
        return Err(AppError::forbidden("User inactive"));
    }

    let ok = verify(&payload.password, &user.password_hash)
        .map_err(|e| AppError::internal(format!("Password verify error: {e}")))?;

    if !ok {
        return Err(AppError::unauthorized("Invalid credentials"));
    }

    let token = sign_token(
        &TokenSubject {
            user_id: user.id,
            pump_master_id: user.pump_master_id,
            role: user.role,
            username: &user.username,
        },
        &config.jwt_secret,
        config.jwt_ttl_hours,
    )?;

    info!(user_id = %user.id, "User logged in");
    Ok(Json(LoginResponse {
        access_token: token,
        token_type: "Bearer",
        expires_in_seconds: config.jwt_ttl_hours * 60 * 60,
        user_id: user.id,
        pump_master_id: user.pump_master_id,
        role: user.role,
    }))
}

// GET /users/me
pub async fn get_me(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<User>, AppError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND pump_master_id = $2"
    ))
    .bind(auth.user_id)
    .bind(auth.pump_master_id)
    .fetch_optional(&db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("User not found"))?;

    Ok(Json(user))
}

// GET /users
pub async fn list_users(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<User>>, AppError> {
    auth.require_manager("list users")?;

    let users = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE pump_master_id = $1 ORDER BY full_name"
    ))
    .bind(auth.pump_master_id)
    .fetch_all(&db_pool)
    .await?;

    Ok(Json(users))
}

// POST /users
#[instrument(skip_all, fields(pump_master_id = %auth.pump_master_id))]
pub async fn create_user(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    auth.require_manager("create users")?;
    if payload.role == UserRole::Admin && auth.role != UserRole::Admin {
        return Err(AppError::forbidden("Only admins can create admin users"));
    }
    let user = insert_user(&db_pool, auth.pump_master_id, payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub(crate) async fn insert_user(
    db_pool: &sqlx::PgPool,
    pump_master_id: Uuid,
    payload: CreateUserRequest,
) -> Result<User, AppError> {
    validate_credentials(&payload.username, &payload.password)?;
    require_text(&payload.full_name, "Full name")?;
    require_max_len(payload.mobile_number.as_deref(), 15, "Mobile number")?;

    let password_hash = hash_password(&payload.password)?;

    sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (pump_master_id, username, password_hash, full_name, mobile_number, role)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING {USER_COLUMNS}"
    ))
    .bind(pump_master_id)
    .bind(payload.username.trim())
    .bind(&password_hash)
    .bind(payload.full_name.trim())
    .bind(clean(payload.mobile_number))
    .bind(payload.role)
    .fetch_one(db_pool)
    .await
    .map_err(|e| map_constraint_violation(e, "Username already exists"))
}

// PUT /users/{id}
pub async fn update_user(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<User>, AppError> {
    if auth.user_id != id {
        auth.require_manager("update other users")?;
    }
    if payload.is_active.is_some() && !auth.is_manager() {
        return Err(AppError::forbidden("Only managers can activate or deactivate users"));
    }
    let user = apply_user_update(&db_pool, auth.pump_master_id, id, None, payload).await?;
    Ok(Json(user))
}

/// Shared by the user and salesman endpoints; `role` narrows which users match.
pub(crate) async fn apply_user_update(
    db_pool: &sqlx::PgPool,
    pump_master_id: Uuid,
    id: Uuid,
    role: Option<UserRole>,
    payload: UpdateUserRequest,
) -> Result<User, AppError> {
    require_max_len(payload.mobile_number.as_deref(), 15, "Mobile number")?;
    if let Some(name) = payload.full_name.as_deref() {
        require_text(name, "Full name")?;
    }
    let password_hash = match payload.password.as_deref() {
        Some(p) if p.len() < MIN_PASSWORD_LEN => {
            return Err(AppError::validation("Password too short"));
        }
        Some(p) => Some(hash_password(p)?),
        None => None,
    };

    sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET
            full_name = COALESCE($1, full_name),
            mobile_number = COALESCE($2, mobile_number),
            password_hash = COALESCE($3, password_hash),
            is_active = COALESCE($4, is_active)
         WHERE id = $5 AND pump_master_id = $6 AND ($7::user_role IS NULL OR role = $7)
         RETURNING {USER_COLUMNS}"
    ))
    .bind(payload.full_name.map(|n| n.trim().to_string()))
    .bind(clean(payload.mobile_number))
    .bind(password_hash)
    .bind(payload.is_active)
    .bind(id)
    .bind(pump_master_id)
    .bind(role)
    .fetch_optional(db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("User not found"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_need_username_and_six_char_password() {
        assert!(validate_credentials("ravi", "secret").is_ok());
        assert!(validate_credentials("  ", "secret").is_err());
        assert!(validate_credentials("ravi", "12345").is_err());
    }
}
