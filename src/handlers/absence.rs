use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::dtos::common::{clean, require_max_len, DateRangeQuery};
use crate::dtos::payroll::{AbsenceQuery, CreateAbsenceRequest, UpdateAbsenceRequest};
use crate::error::{map_constraint_violation, AppError};
use crate::handlers::ensure_exists;
use crate::middleware::auth::AuthContext;
use crate::models::payroll::{UserAbsence, ABSENCE_SELECT};
use crate::state::AppState;

async fn fetch_absence(db_pool: &PgPool, pump_master_id: Uuid, id: Uuid) -> Result<UserAbsence, AppError> {
    sqlx::query_as::<_, UserAbsence>(&format!(
        "{ABSENCE_SELECT} WHERE a.id = $1 AND a.pump_master_id = $2"
    ))
    .bind(id)
    .bind(pump_master_id)
    .fetch_optional(db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Absence not found"))
}

// GET /user-absences?userId&from&to
pub async fn list_absences(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<AbsenceQuery>,
) -> Result<Json<Vec<UserAbsence>>, AppError> {
    DateRangeQuery { from: query.from, to: query.to }.validate()?;

    let absences = sqlx::query_as::<_, UserAbsence>(&format!(
        "{ABSENCE_SELECT}
         WHERE a.pump_master_id = $1
           AND ($2::UUID IS NULL OR a.user_id = $2)
           AND ($3::DATE IS NULL OR a.absence_date >= $3)
           AND ($4::DATE IS NULL OR a.absence_date <= $4)
         ORDER BY a.absence_date DESC, u.full_name"
    ))
    .bind(auth.pump_master_id)
    .bind(query.user_id)
    .bind(query.from)
    .bind(query.to)
    .fetch_all(&db_pool)
    .await?;

    Ok(Json(absences))
}

pub async fn get_absence(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserAbsence>, AppError> {
    Ok(Json(fetch_absence(&db_pool, auth.pump_master_id, id).await?))
}

pub async fn create_absence(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<CreateAbsenceRequest>,
) -> Result<(StatusCode, Json<UserAbsence>), AppError> {
    auth.require_manager("record absences")?;
    require_max_len(payload.reason.as_deref(), 255, "Reason")?;
    ensure_exists(&db_pool, "users", payload.user_id, auth.pump_master_id, "Employee").await?;

    let id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO user_absences
            (pump_master_id, user_id, absence_date, absence_type, reason, is_approved)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING id",
    )
    .bind(auth.pump_master_id)
    .bind(payload.user_id)
    .bind(payload.absence_date)
    .bind(payload.absence_type)
    .bind(clean(payload.reason))
    .bind(payload.is_approved)
    .fetch_one(&db_pool)
    .await
    .map_err(|e| map_constraint_violation(e, "Absence already recorded for that day"))?;

    let absence = fetch_absence(&db_pool, auth.pump_master_id, id).await?;
    Ok((StatusCode::CREATED, Json(absence)))
}

// PUT /user-absences/{id} - also how an absence gets approved
pub async fn update_absence(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAbsenceRequest>,
) -> Result<Json<UserAbsence>, AppError> {
    auth.require_manager("update absences")?;
    require_max_len(payload.reason.as_deref(), 255, "Reason")?;

    let result = sqlx::query(
        "UPDATE user_absences SET
            absence_type = COALESCE($1, absence_type),
            reason = COALESCE($2, reason),
            is_approved = COALESCE($3, is_approved)
         WHERE id = $4 AND pump_master_id = $5",
    )
    .bind(payload.absence_type)
    .bind(clean(payload.reason))
    .bind(payload.is_approved)
    .bind(id)
    .bind(auth.pump_master_id)
    .execute(&db_pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Absence not found"));
    }

    Ok(Json(fetch_absence(&db_pool, auth.pump_master_id, id).await?))
}

pub async fn delete_absence(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    auth.require_manager("delete absences")?;

    let result = sqlx::query("DELETE FROM user_absences WHERE id = $1 AND pump_master_id = $2")
        .bind(id)
        .bind(auth.pump_master_id)
        .execute(&db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Absence not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}
