use axum::{extract::{Path, State}, http::StatusCode, Extension, Json};
use uuid::Uuid;

use crate::dtos::user::{CreateSalesmanRequest, UpdateUserRequest};
use crate::error::AppError;
use crate::handlers::user::{apply_user_update, insert_user};
use crate::middleware::auth::AuthContext;
use crate::models::user::{User, UserRole, USER_COLUMNS};
use crate::state::AppState;

// GET /salesmen
pub async fn list_salesmen(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<User>>, AppError> {
    let salesmen = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users
         WHERE pump_master_id = $1 AND role = $2
         ORDER BY is_active DESC, full_name"
    ))
    .bind(auth.pump_master_id)
    .bind(UserRole::Salesman)
    .fetch_all(&db_pool)
    .await?;

    Ok(Json(salesmen))
}

// GET /salesmen/{id}
pub async fn get_salesman(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, AppError> {
    let salesman = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND pump_master_id = $2 AND role = $3"
    ))
    .bind(id)
    .bind(auth.pump_master_id)
    .bind(UserRole::Salesman)
    .fetch_optional(&db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Salesman not found"))?;

    Ok(Json(salesman))
}

// POST /salesmen
pub async fn create_salesman(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<CreateSalesmanRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    auth.require_manager("create salesmen")?;
    let salesman = insert_user(&db_pool, auth.pump_master_id, payload.into()).await?;
    Ok((StatusCode::CREATED, Json(salesman)))
}

// PUT /salesmen/{id}
pub async fn update_salesman(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<User>, AppError> {
    auth.require_manager("update salesmen")?;
    let salesman =
        apply_user_update(&db_pool, auth.pump_master_id, id, Some(UserRole::Salesman), payload).await?;
    Ok(Json(salesman))
}

// DELETE /salesmen/{id} - deactivates; shift history keeps pointing at the user
pub async fn deactivate_salesman(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    auth.require_manager("deactivate salesmen")?;

    let running = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(
            SELECT 1 FROM salesman_nozzle_shifts
            WHERE salesman_id = $1 AND pump_master_id = $2 AND status <> 'CLOSED'
         )",
    )
    .bind(id)
    .bind(auth.pump_master_id)
    .fetch_one(&db_pool)
    .await?;
    if running {
        return Err(AppError::conflict("Salesman has a running shift"));
    }

    let result = sqlx::query(
        "UPDATE users SET is_active = FALSE WHERE id = $1 AND pump_master_id = $2 AND role = $3",
    )
    .bind(id)
    .bind(auth.pump_master_id)
    .bind(UserRole::Salesman)
    .execute(&db_pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Salesman not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}
