use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::shift::{dispensed_quantity, ShiftStatus};
use crate::dtos::common::{require_non_negative, DateRangeQuery};
use crate::dtos::shift::{CloseShiftRequest, OpenShiftRequest, ShiftQuery, ShiftResponse};
use crate::error::{map_still_referenced, AppError};
use crate::middleware::auth::AuthContext;
use crate::models::shift::{SalesmanNozzleShift, SHIFT_SELECT};
use crate::state::AppState;

/// The columns other handlers need when they hang records off a shift.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ShiftHead {
    pub salesman_id: Uuid,
    pub nozzle_id: Uuid,
    pub product_id: Uuid,
    pub start_datetime: DateTime<Utc>,
    pub opening_reading: f64,
    pub closing_reading: Option<f64>,
    pub product_rate: f64,
    pub status: ShiftStatus,
    pub accounting_done: bool,
}

/// Loads and row-locks a shift for the rest of the transaction.
pub(crate) async fn lock_shift(
    conn: &mut PgConnection,
    pump_master_id: Uuid,
    id: Uuid,
) -> Result<ShiftHead, AppError> {
    sqlx::query_as::<_, ShiftHead>(
        "SELECT salesman_id, nozzle_id, product_id, start_datetime,
                opening_reading::FLOAT8 AS opening_reading,
                closing_reading::FLOAT8 AS closing_reading,
                product_rate::FLOAT8    AS product_rate,
                status, accounting_done
         FROM salesman_nozzle_shifts
         WHERE id = $1 AND pump_master_id = $2
         FOR UPDATE",
    )
    .bind(id)
    .bind(pump_master_id)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| AppError::not_found("Shift not found"))
}

/// Salesmen only touch their own shifts; managers touch any.
pub(crate) fn ensure_shift_access(auth: &AuthContext, salesman_id: Uuid) -> Result<(), AppError> {
    if auth.is_manager() || auth.user_id == salesman_id {
        Ok(())
    } else {
        Err(AppError::forbidden("Shift belongs to another salesman"))
    }
}

pub(crate) async fn fetch_shift(
    db_pool: &PgPool,
    pump_master_id: Uuid,
    id: Uuid,
) -> Result<SalesmanNozzleShift, AppError> {
    sqlx::query_as::<_, SalesmanNozzleShift>(&format!(
        "{SHIFT_SELECT} WHERE sh.id = $1 AND sh.pump_master_id = $2"
    ))
    .bind(id)
    .bind(pump_master_id)
    .fetch_optional(db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Shift not found"))
}

#[derive(sqlx::FromRow)]
struct NozzleForShift {
    is_active: bool,
    current_reading: f64,
    product_id: Uuid,
    sales_rate: f64,
}

// POST /salesman-nozzle-shifts
#[instrument(skip_all, fields(nozzle_id = %payload.nozzle_id))]
pub async fn open_shift(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<OpenShiftRequest>,
) -> Result<(StatusCode, Json<ShiftResponse>), AppError> {
    let salesman_id = payload.salesman_id.unwrap_or(auth.user_id);
    ensure_shift_access(&auth, salesman_id)?;

    let mut tx = db_pool.begin().await?;

    let salesman_active = sqlx::query_scalar::<_, bool>(
        "SELECT is_active FROM users WHERE id = $1 AND pump_master_id = $2",
    )
    .bind(salesman_id)
    .bind(auth.pump_master_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::validation("Salesman not found"))?;
    if !salesman_active {
        return Err(AppError::validation("Salesman is inactive"));
    }

    let nozzle = sqlx::query_as::<_, NozzleForShift>(
        "SELECT n.is_active,
                n.current_reading::FLOAT8 AS current_reading,
                t.product_id,
                p.sales_rate::FLOAT8      AS sales_rate
         FROM nozzles n
         JOIN tanks t ON t.id = n.tank_id
         JOIN products p ON p.id = t.product_id
         WHERE n.id = $1 AND n.pump_master_id = $2
         FOR UPDATE OF n",
    )
    .bind(payload.nozzle_id)
    .bind(auth.pump_master_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::validation("Nozzle not found"))?;
    if !nozzle.is_active {
        return Err(AppError::validation("Nozzle is inactive"));
    }

    let opening_reading = payload.opening_reading.unwrap_or(nozzle.current_reading);
    require_non_negative(opening_reading, "Opening reading")?;
    if opening_reading < nozzle.current_reading {
        return Err(AppError::validation(format!(
            "Opening reading cannot be below the nozzle's current reading ({})",
            nozzle.current_reading
        )));
    }

    let id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO salesman_nozzle_shifts
            (pump_master_id, salesman_id, nozzle_id, product_id, start_datetime,
             opening_reading, product_rate, status)
         VALUES ($1, $2, $3, $4, COALESCE($5, NOW()), $6, $7, 'OPEN')
         RETURNING id",
    )
    .bind(auth.pump_master_id)
    .bind(salesman_id)
    .bind(payload.nozzle_id)
    .bind(nozzle.product_id)
    .bind(payload.start_datetime)
    .bind(opening_reading)
    .bind(nozzle.sales_rate)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| match e.as_database_error() {
        Some(db) if db.constraint() == Some("uq_running_shift_per_nozzle") => {
            AppError::conflict("Nozzle already has a running shift")
        }
        _ => AppError::db(e),
    })?;

    tx.commit().await?;

    info!(shift_id = %id, %salesman_id, opening_reading, "Shift opened");

    let shift = fetch_shift(&db_pool, auth.pump_master_id, id).await?;
    Ok((StatusCode::CREATED, Json(shift.into())))
}

// POST /salesman-nozzle-shifts/{id}/close
#[instrument(skip_all, fields(shift_id = %id))]
pub async fn close_shift(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CloseShiftRequest>,
) -> Result<Json<ShiftResponse>, AppError> {
    let mut tx = db_pool.begin().await?;

    let shift = lock_shift(&mut tx, auth.pump_master_id, id).await?;
    ensure_shift_access(&auth, shift.salesman_id)?;
    if !shift.status.is_running() {
        return Err(AppError::conflict("Shift is already closed"));
    }

    let dispensed = dispensed_quantity(shift.opening_reading, payload.closing_reading)
        .map_err(|e| AppError::validation(e.to_string()))?;

    let end_datetime = payload.end_datetime.unwrap_or_else(Utc::now);
    if end_datetime < shift.start_datetime {
        return Err(AppError::validation("End time cannot be before the shift start"));
    }

    sqlx::query(
        "UPDATE salesman_nozzle_shifts
         SET closing_reading = $1, end_datetime = $2, status = 'CLOSED'
         WHERE id = $3",
    )
    .bind(payload.closing_reading)
    .bind(end_datetime)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    sqlx::query("UPDATE nozzles SET current_reading = $1 WHERE id = $2")
        .bind(payload.closing_reading)
        .bind(shift.nozzle_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    info!(dispensed, closing_reading = payload.closing_reading, "Shift closed");

    let shift = fetch_shift(&db_pool, auth.pump_master_id, id).await?;
    Ok(Json(shift.into()))
}

// GET /salesman-nozzle-shifts?from&to&salesmanId&status
pub async fn list_shifts(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ShiftQuery>,
) -> Result<Json<Vec<ShiftResponse>>, AppError> {
    DateRangeQuery { from: query.from, to: query.to }.validate()?;

    let shifts = sqlx::query_as::<_, SalesmanNozzleShift>(&format!(
        "{SHIFT_SELECT}
         WHERE sh.pump_master_id = $1
           AND ($2::DATE IS NULL OR sh.start_datetime::DATE >= $2)
           AND ($3::DATE IS NULL OR sh.start_datetime::DATE <= $3)
           AND ($4::UUID IS NULL OR sh.salesman_id = $4)
           AND ($5::shift_status IS NULL OR sh.status = $5)
         ORDER BY sh.start_datetime DESC"
    ))
    .bind(auth.pump_master_id)
    .bind(query.from)
    .bind(query.to)
    .bind(query.salesman_id)
    .bind(query.status)
    .fetch_all(&db_pool)
    .await?;

    Ok(Json(shifts.into_iter().map(ShiftResponse::from).collect()))
}

// GET /salesman-nozzle-shifts/open
pub async fn list_open_shifts(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<ShiftResponse>>, AppError> {
    let shifts = sqlx::query_as::<_, SalesmanNozzleShift>(&format!(
        "{SHIFT_SELECT}
         WHERE sh.pump_master_id = $1 AND sh.status <> 'CLOSED'
         ORDER BY n.nozzle_name"
    ))
    .bind(auth.pump_master_id)
    .fetch_all(&db_pool)
    .await?;

    Ok(Json(shifts.into_iter().map(ShiftResponse::from).collect()))
}

// GET /salesman-nozzle-shifts/{id}
pub async fn get_shift(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<ShiftResponse>, AppError> {
    let shift = fetch_shift(&db_pool, auth.pump_master_id, id).await?;
    Ok(Json(shift.into()))
}

// DELETE /salesman-nozzle-shifts/{id}
pub async fn delete_shift(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    auth.require_manager("delete shifts")?;

    let mut tx = db_pool.begin().await?;
    let shift = lock_shift(&mut tx, auth.pump_master_id, id).await?;

    sqlx::query("DELETE FROM salesman_nozzle_shifts WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            map_still_referenced(e, "Shift has bills, payments, expenses or accounting and cannot be deleted")
        })?;

    // A closed shift already advanced the meter; wind it back if nothing ran since
    if let Some(closing) = shift.closing_reading {
        sqlx::query(
            "UPDATE nozzles SET current_reading = $1
             WHERE id = $2 AND current_reading = $3",
        )
        .bind(shift.opening_reading)
        .bind(shift.nozzle_id)
        .bind(closing)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    info!(shift_id = %id, product_id = %shift.product_id, "Shift deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::UserRole;

    fn auth(role: UserRole) -> AuthContext {
        AuthContext {
            user_id: Uuid::new_v4(),
            pump_master_id: Uuid::new_v4(),
            role,
            username: "ravi".into(),
        }
    }

    #[test]
    fn salesman_reaches_only_own_shift() {
        let me = auth(UserRole::Salesman);
        assert!(ensure_shift_access(&me, me.user_id).is_ok());
        assert!(matches!(
            ensure_shift_access(&me, Uuid::new_v4()),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn manager_reaches_any_shift() {
        let manager = auth(UserRole::Manager);
        assert!(ensure_shift_access(&manager, Uuid::new_v4()).is_ok());
    }
}
