use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use tracing::instrument;
use uuid::Uuid;

use crate::domain::tank::{tank_stock, TankMovements};
use crate::dtos::common::{require_max_len, require_non_negative, require_positive, require_text};
use crate::dtos::tank::{CreateTankRequest, TankBalanceResponse, UpdateTankRequest};
use crate::error::{map_constraint_violation, map_still_referenced, AppError};
use crate::handlers::ensure_exists;
use crate::middleware::auth::AuthContext;
use crate::models::tank::{Tank, TANK_SELECT};
use crate::state::AppState;

const DUPLICATE_NAME: &str = "Tank name already exists";

fn validate_levels(capacity: f64, opening_level: f64, low_level_alert: f64) -> Result<(), AppError> {
    require_positive(capacity, "Capacity")?;
    require_non_negative(opening_level, "Opening level")?;
    require_non_negative(low_level_alert, "Low level alert")?;
    if opening_level > capacity {
        return Err(AppError::validation("Opening level cannot exceed capacity"));
    }
    if low_level_alert > capacity {
        return Err(AppError::validation("Low level alert cannot exceed capacity"));
    }
    Ok(())
}

async fn fetch_tank(db_pool: &sqlx::PgPool, pump_master_id: Uuid, id: Uuid) -> Result<Tank, AppError> {
    sqlx::query_as::<_, Tank>(&format!("{TANK_SELECT} WHERE t.id = $1 AND t.pump_master_id = $2"))
        .bind(id)
        .bind(pump_master_id)
        .fetch_optional(db_pool)
        .await?
        .ok_or_else(|| AppError::not_found("Tank not found"))
}

pub async fn list_tanks(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<Tank>>, AppError> {
    let tanks = sqlx::query_as::<_, Tank>(&format!(
        "{TANK_SELECT} WHERE t.pump_master_id = $1 ORDER BY t.tank_name"
    ))
    .bind(auth.pump_master_id)
    .fetch_all(&db_pool)
    .await?;

    Ok(Json(tanks))
}

pub async fn get_tank(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Tank>, AppError> {
    Ok(Json(fetch_tank(&db_pool, auth.pump_master_id, id).await?))
}

pub async fn create_tank(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<CreateTankRequest>,
) -> Result<(StatusCode, Json<Tank>), AppError> {
    auth.require_manager("create tanks")?;
    require_text(&payload.tank_name, "Tank name")?;
    require_max_len(Some(&payload.tank_name), 50, "Tank name")?;
    validate_levels(payload.capacity, payload.opening_level, payload.low_level_alert)?;
    ensure_exists(&db_pool, "products", payload.product_id, auth.pump_master_id, "Product").await?;

    let id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO tanks
            (pump_master_id, tank_name, product_id, capacity, opening_level, opening_level_date, low_level_alert)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING id",
    )
    .bind(auth.pump_master_id)
    .bind(payload.tank_name.trim())
    .bind(payload.product_id)
    .bind(payload.capacity)
    .bind(payload.opening_level)
    .bind(payload.opening_level_date)
    .bind(payload.low_level_alert)
    .fetch_one(&db_pool)
    .await
    .map_err(|e| map_constraint_violation(e, DUPLICATE_NAME))?;

    let tank = fetch_tank(&db_pool, auth.pump_master_id, id).await?;
    Ok((StatusCode::CREATED, Json(tank)))
}

pub async fn update_tank(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTankRequest>,
) -> Result<Json<Tank>, AppError> {
    auth.require_manager("update tanks")?;
    if let Some(name) = payload.tank_name.as_deref() {
        require_text(name, "Tank name")?;
        require_max_len(Some(name), 50, "Tank name")?;
    }

    let current = fetch_tank(&db_pool, auth.pump_master_id, id).await?;
    let capacity = payload.capacity.unwrap_or(current.capacity);
    let opening_level = payload.opening_level.unwrap_or(current.opening_level);
    let low_level_alert = payload.low_level_alert.unwrap_or(current.low_level_alert);
    validate_levels(capacity, opening_level, low_level_alert)?;

    sqlx::query(
        "UPDATE tanks SET
            tank_name = COALESCE($1, tank_name),
            capacity = $2,
            opening_level = $3,
            opening_level_date = COALESCE($4, opening_level_date),
            low_level_alert = $5
         WHERE id = $6 AND pump_master_id = $7",
    )
    .bind(payload.tank_name.map(|n| n.trim().to_string()))
    .bind(capacity)
    .bind(opening_level)
    .bind(payload.opening_level_date)
    .bind(low_level_alert)
    .bind(id)
    .bind(auth.pump_master_id)
    .execute(&db_pool)
    .await
    .map_err(|e| map_constraint_violation(e, DUPLICATE_NAME))?;

    Ok(Json(fetch_tank(&db_pool, auth.pump_master_id, id).await?))
}

pub async fn delete_tank(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    auth.require_manager("delete tanks")?;

    let result = sqlx::query("DELETE FROM tanks WHERE id = $1 AND pump_master_id = $2")
        .bind(id)
        .bind(auth.pump_master_id)
        .execute(&db_pool)
        .await
        .map_err(|e| map_still_referenced(e, "Tank has nozzles or purchases and cannot be deleted"))?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Tank not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}

#[derive(sqlx::FromRow)]
struct TankMovementRow {
    received: f64,
    dispensed: f64,
}

// GET /tanks/{id}/balance
#[instrument(skip_all, fields(tank_id = %id))]
pub async fn get_tank_balance(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<TankBalanceResponse>, AppError> {
    let tank = fetch_tank(&db_pool, auth.pump_master_id, id).await?;

    // Movements count from the day the opening level was dipped
    let movements = sqlx::query_as::<_, TankMovementRow>(
        "SELECT
            COALESCE((SELECT SUM(pu.quantity) FROM purchases pu
                      WHERE pu.tank_id = $1 AND pu.purchase_date >= $2), 0)::FLOAT8 AS received,
            COALESCE((SELECT SUM(sh.closing_reading - sh.opening_reading)
                      FROM salesman_nozzle_shifts sh
                      JOIN nozzles n ON n.id = sh.nozzle_id
                      WHERE n.tank_id = $1
                        AND sh.status = 'CLOSED'
                        AND sh.start_datetime::DATE >= $2), 0)::FLOAT8 AS dispensed",
    )
    .bind(tank.id)
    .bind(tank.opening_level_date)
    .fetch_one(&db_pool)
    .await?;

    let stock = tank_stock(
        TankMovements {
            opening_level: tank.opening_level,
            received: movements.received,
            dispensed: movements.dispensed,
        },
        tank.capacity,
        tank.low_level_alert,
    );

    Ok(Json(TankBalanceResponse {
        tank_id: tank.id,
        tank_name: tank.tank_name,
        product_name: tank.product_name,
        capacity: tank.capacity,
        since: tank.opening_level_date,
        stock,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_checks() {
        assert!(validate_levels(10_000.0, 2_000.0, 500.0).is_ok());
        assert!(validate_levels(0.0, 0.0, 0.0).is_err());
        assert!(validate_levels(10_000.0, 12_000.0, 500.0).is_err());
        assert!(validate_levels(10_000.0, 2_000.0, 10_500.0).is_err());
        assert!(validate_levels(10_000.0, -1.0, 0.0).is_err());
    }
}
