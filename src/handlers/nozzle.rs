use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::dtos::common::{require_max_len, require_non_negative, require_text};
use crate::dtos::tank::{CreateNozzleRequest, UpdateNozzleRequest};
use crate::error::{map_constraint_violation, map_still_referenced, AppError};
use crate::handlers::ensure_exists;
use crate::middleware::auth::AuthContext;
use crate::models::tank::{Nozzle, NOZZLE_SELECT};
use crate::state::AppState;

const DUPLICATE_NAME: &str = "Nozzle name already exists";

pub(crate) async fn fetch_nozzle(db_pool: &PgPool, pump_master_id: Uuid, id: Uuid) -> Result<Nozzle, AppError> {
    sqlx::query_as::<_, Nozzle>(&format!("{NOZZLE_SELECT} WHERE n.id = $1 AND n.pump_master_id = $2"))
        .bind(id)
        .bind(pump_master_id)
        .fetch_optional(db_pool)
        .await?
        .ok_or_else(|| AppError::not_found("Nozzle not found"))
}

pub async fn list_nozzles(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<Nozzle>>, AppError> {
    let nozzles = sqlx::query_as::<_, Nozzle>(&format!(
        "{NOZZLE_SELECT} WHERE n.pump_master_id = $1 ORDER BY n.nozzle_name"
    ))
    .bind(auth.pump_master_id)
    .fetch_all(&db_pool)
    .await?;

    Ok(Json(nozzles))
}

pub async fn get_nozzle(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Nozzle>, AppError> {
    Ok(Json(fetch_nozzle(&db_pool, auth.pump_master_id, id).await?))
}

pub async fn create_nozzle(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<CreateNozzleRequest>,
) -> Result<(StatusCode, Json<Nozzle>), AppError> {
    auth.require_manager("create nozzles")?;
    require_text(&payload.nozzle_name, "Nozzle name")?;
    require_max_len(Some(&payload.nozzle_name), 50, "Nozzle name")?;
    require_non_negative(payload.current_reading, "Current reading")?;
    ensure_exists(&db_pool, "tanks", payload.tank_id, auth.pump_master_id, "Tank").await?;

    let id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO nozzles (pump_master_id, nozzle_name, tank_id, current_reading)
         VALUES ($1, $2, $3, $4)
         RETURNING id",
    )
    .bind(auth.pump_master_id)
    .bind(payload.nozzle_name.trim())
    .bind(payload.tank_id)
    .bind(payload.current_reading)
    .fetch_one(&db_pool)
    .await
    .map_err(|e| map_constraint_violation(e, DUPLICATE_NAME))?;

    let nozzle = fetch_nozzle(&db_pool, auth.pump_master_id, id).await?;
    Ok((StatusCode::CREATED, Json(nozzle)))
}

pub async fn update_nozzle(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateNozzleRequest>,
) -> Result<Json<Nozzle>, AppError> {
    auth.require_manager("update nozzles")?;
    if let Some(name) = payload.nozzle_name.as_deref() {
        require_text(name, "Nozzle name")?;
        require_max_len(Some(name), 50, "Nozzle name")?;
    }
    if let Some(reading) = payload.current_reading {
        require_non_negative(reading, "Current reading")?;
    }
    if let Some(tank_id) = payload.tank_id {
        ensure_exists(&db_pool, "tanks", tank_id, auth.pump_master_id, "Tank").await?;
    }

    // Moving the meter under a running shift would break its opening reading
    if payload.current_reading.is_some() || payload.tank_id.is_some() {
        let running = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM salesman_nozzle_shifts
                            WHERE nozzle_id = $1 AND status <> 'CLOSED')",
        )
        .bind(id)
        .fetch_one(&db_pool)
        .await?;
        if running {
            return Err(AppError::conflict(
                "Nozzle has a running shift; close it before changing reading or tank",
            ));
        }
    }

    let result = sqlx::query(
        "UPDATE nozzles SET
            nozzle_name = COALESCE($1, nozzle_name),
            tank_id = COALESCE($2, tank_id),
            current_reading = COALESCE($3, current_reading),
            is_active = COALESCE($4, is_active)
         WHERE id = $5 AND pump_master_id = $6",
    )
    .bind(payload.nozzle_name.map(|n| n.trim().to_string()))
    .bind(payload.tank_id)
    .bind(payload.current_reading)
    .bind(payload.is_active)
    .bind(id)
    .bind(auth.pump_master_id)
    .execute(&db_pool)
    .await
    .map_err(|e| map_constraint_violation(e, DUPLICATE_NAME))?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Nozzle not found"));
    }

    Ok(Json(fetch_nozzle(&db_pool, auth.pump_master_id, id).await?))
}

pub async fn delete_nozzle(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    auth.require_manager("delete nozzles")?;

    let result = sqlx::query("DELETE FROM nozzles WHERE id = $1 AND pump_master_id = $2")
        .bind(id)
        .bind(auth.pump_master_id)
        .execute(&db_pool)
        .await
        .map_err(|e| map_still_referenced(e, "Nozzle has shift history; deactivate it instead"))?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Nozzle not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}
