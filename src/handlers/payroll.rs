use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::NaiveDate;
use sqlx::{PgConnection, PgPool};
use tracing::instrument;
use uuid::Uuid;

use crate::domain::payroll::{compute_payroll, windows_overlap, Absence, AbsenceType, SalaryTerms};
use crate::domain::round2;
use crate::dtos::common::{clean, require_positive, DateRangeQuery};
use crate::dtos::payroll::{
    CreateSalaryConfigRequest, PayrollEntry, PayrollQuery, PayrollResponse, UpdateSalaryConfigRequest,
};
use crate::error::AppError;
use crate::middleware::auth::AuthContext;
use crate::models::payroll::{EmployeeSalaryConfig, SALARY_CONFIG_SELECT};
use crate::state::AppState;

/// Longest period one payroll run may cover.
const MAX_PAYROLL_DAYS: i64 = 366;

fn payroll_period(query: &PayrollQuery) -> Result<(NaiveDate, NaiveDate), AppError> {
    let (from, to) = DateRangeQuery { from: query.from, to: query.to }.require_both()?;
    if (to - from).num_days() >= MAX_PAYROLL_DAYS {
        return Err(AppError::validation(format!(
            "Payroll period cannot be longer than {MAX_PAYROLL_DAYS} days"
        )));
    }
    Ok((from, to))
}

fn validate_window(from: NaiveDate, to: Option<NaiveDate>) -> Result<(), AppError> {
    match to {
        Some(to) if to < from => Err(AppError::validation(
            "Effective to date cannot be before effective from date",
        )),
        _ => Ok(()),
    }
}

#[derive(sqlx::FromRow)]
struct ConfigWindow {
    effective_from: NaiveDate,
    effective_to: Option<NaiveDate>,
}

/// Locks the employee row so concurrent config writes for one user run in turn,
/// then refuses a window that overlaps another active config of theirs.
async fn ensure_no_overlap(
    conn: &mut PgConnection,
    pump_master_id: Uuid,
    user_id: Uuid,
    effective_from: NaiveDate,
    effective_to: Option<NaiveDate>,
    exclude_id: Option<Uuid>,
) -> Result<(), AppError> {
    sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE id = $1 AND pump_master_id = $2 FOR UPDATE")
        .bind(user_id)
        .bind(pump_master_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::validation("Employee not found"))?;

    let others = sqlx::query_as::<_, ConfigWindow>(
        "SELECT effective_from, effective_to
         FROM employee_salary_configs
         WHERE pump_master_id = $1 AND user_id = $2 AND is_active
           AND ($3::UUID IS NULL OR id <> $3)",
    )
    .bind(pump_master_id)
    .bind(user_id)
    .bind(exclude_id)
    .fetch_all(&mut *conn)
    .await?;

    match others
        .iter()
        .find(|w| windows_overlap(effective_from, effective_to, w.effective_from, w.effective_to))
    {
        Some(w) => Err(AppError::conflict(format!(
            "Employee already has an active salary config from {} overlapping this period",
            w.effective_from
        ))),
        None => Ok(()),
    }
}

async fn fetch_config(
    db_pool: &PgPool,
    pump_master_id: Uuid,
    id: Uuid,
) -> Result<EmployeeSalaryConfig, AppError> {
    sqlx::query_as::<_, EmployeeSalaryConfig>(&format!(
        "{SALARY_CONFIG_SELECT} WHERE sc.id = $1 AND sc.pump_master_id = $2"
    ))
    .bind(id)
    .bind(pump_master_id)
    .fetch_optional(db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Salary config not found"))
}

pub async fn list_salary_configs(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<EmployeeSalaryConfig>>, AppError> {
    auth.require_manager("view salary configs")?;

    let configs = sqlx::query_as::<_, EmployeeSalaryConfig>(&format!(
        "{SALARY_CONFIG_SELECT} WHERE sc.pump_master_id = $1 ORDER BY u.full_name, sc.effective_from DESC"
    ))
    .bind(auth.pump_master_id)
    .fetch_all(&db_pool)
    .await?;

    Ok(Json(configs))
}

pub async fn get_salary_config(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<EmployeeSalaryConfig>, AppError> {
    auth.require_manager("view salary configs")?;
    Ok(Json(fetch_config(&db_pool, auth.pump_master_id, id).await?))
}

pub async fn create_salary_config(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<CreateSalaryConfigRequest>,
) -> Result<(StatusCode, Json<EmployeeSalaryConfig>), AppError> {
    auth.require_manager("create salary configs")?;
    require_positive(payload.base_salary, "Base salary")?;
    validate_window(payload.effective_from, payload.effective_to)?;

    let mut tx = db_pool.begin().await?;
    ensure_no_overlap(
        &mut tx,
        auth.pump_master_id,
        payload.user_id,
        payload.effective_from,
        payload.effective_to,
        None,
    )
    .await?;

    let id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO employee_salary_configs
            (pump_master_id, user_id, salary_type, base_salary, effective_from, effective_to, notes)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING id",
    )
    .bind(auth.pump_master_id)
    .bind(payload.user_id)
    .bind(payload.salary_type)
    .bind(payload.base_salary)
    .bind(payload.effective_from)
    .bind(payload.effective_to)
    .bind(clean(payload.notes))
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    let config = fetch_config(&db_pool, auth.pump_master_id, id).await?;
    Ok((StatusCode::CREATED, Json(config)))
}

pub async fn update_salary_config(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSalaryConfigRequest>,
) -> Result<Json<EmployeeSalaryConfig>, AppError> {
    auth.require_manager("update salary configs")?;
    if let Some(base) = payload.base_salary {
        require_positive(base, "Base salary")?;
    }

    let current = fetch_config(&db_pool, auth.pump_master_id, id).await?;
    let effective_from = payload.effective_from.unwrap_or(current.effective_from);
    let effective_to = payload.effective_to.or(current.effective_to);
    validate_window(effective_from, effective_to)?;

    let mut tx = db_pool.begin().await?;
    if payload.is_active.unwrap_or(current.is_active) {
        ensure_no_overlap(
            &mut tx,
            auth.pump_master_id,
            current.user_id,
            effective_from,
            effective_to,
            Some(id),
        )
        .await?;
    }

    sqlx::query(
        "UPDATE employee_salary_configs SET
            salary_type = COALESCE($1, salary_type),
            base_salary = COALESCE($2, base_salary),
            effective_from = $3,
            effective_to = $4,
            is_active = COALESCE($5, is_active),
            notes = COALESCE($6, notes)
         WHERE id = $7 AND pump_master_id = $8",
    )
    .bind(payload.salary_type)
    .bind(payload.base_salary)
    .bind(effective_from)
    .bind(effective_to)
    .bind(payload.is_active)
    .bind(clean(payload.notes))
    .bind(id)
    .bind(auth.pump_master_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(Json(fetch_config(&db_pool, auth.pump_master_id, id).await?))
}

pub async fn delete_salary_config(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    auth.require_manager("delete salary configs")?;

    let result = sqlx::query("DELETE FROM employee_salary_configs WHERE id = $1 AND pump_master_id = $2")
        .bind(id)
        .bind(auth.pump_master_id)
        .execute(&db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Salary config not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}

#[derive(sqlx::FromRow)]
struct AbsenceRow {
    user_id: Uuid,
    absence_date: NaiveDate,
    absence_type: AbsenceType,
    is_approved: bool,
}

// GET /employee-salary-configs/payroll?from&to&userId
#[instrument(skip_all)]
pub async fn get_payroll(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<PayrollQuery>,
) -> Result<Json<PayrollResponse>, AppError> {
    auth.require_manager("view payroll")?;
    let (from, to) = payroll_period(&query)?;

    let configs = sqlx::query_as::<_, EmployeeSalaryConfig>(&format!(
        "{SALARY_CONFIG_SELECT}
         WHERE sc.pump_master_id = $1
           AND sc.is_active
           AND sc.effective_from <= $3
           AND (sc.effective_to IS NULL OR sc.effective_to >= $2)
           AND ($4::UUID IS NULL OR sc.user_id = $4)
         ORDER BY u.full_name, sc.effective_from"
    ))
    .bind(auth.pump_master_id)
    .bind(from)
    .bind(to)
    .bind(query.user_id)
    .fetch_all(&db_pool)
    .await?;

    let absence_rows = sqlx::query_as::<_, AbsenceRow>(
        "SELECT user_id, absence_date, absence_type, is_approved
         FROM user_absences
         WHERE pump_master_id = $1
           AND absence_date BETWEEN $2 AND $3
           AND ($4::UUID IS NULL OR user_id = $4)",
    )
    .bind(auth.pump_master_id)
    .bind(from)
    .bind(to)
    .bind(query.user_id)
    .fetch_all(&db_pool)
    .await?;

    let mut absences: HashMap<Uuid, Vec<Absence>> = HashMap::new();
    for row in absence_rows {
        absences.entry(row.user_id).or_default().push(Absence {
            date: row.absence_date,
            absence_type: row.absence_type,
            approved: row.is_approved,
        });
    }

    let entries: Vec<PayrollEntry> = configs
        .into_iter()
        .filter_map(|config| {
            let terms = SalaryTerms {
                salary_type: config.salary_type,
                base_salary: config.base_salary,
                effective_from: config.effective_from,
                effective_to: config.effective_to,
            };
            let user_absences = absences.get(&config.user_id).map(Vec::as_slice).unwrap_or(&[]);
            compute_payroll(&terms, from, to, user_absences).map(|line| PayrollEntry {
                user_id: config.user_id,
                user_full_name: config.user_full_name,
                salary_config_id: config.id,
                salary_type: config.salary_type,
                base_salary: config.base_salary,
                line,
            })
        })
        .collect();

    let total_gross = round2(entries.iter().map(|e| e.line.gross_salary).sum());
    let total_deductions = round2(entries.iter().map(|e| e.line.deductions).sum());
    let total_net = round2(entries.iter().map(|e| e.line.net_salary).sum());

    Ok(Json(PayrollResponse {
        from,
        to,
        entries,
        total_gross,
        total_deductions,
        total_net,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_window_must_not_invert() {
        let from = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        assert!(validate_window(from, None).is_ok());
        assert!(validate_window(from, Some(from)).is_ok());
        assert!(validate_window(from, NaiveDate::from_ymd_opt(2024, 3, 31)).is_err());
    }

    #[test]
    fn payroll_period_is_capped_at_a_leap_year() {
        let query = |from: (i32, u32, u32), to: (i32, u32, u32)| PayrollQuery {
            from: NaiveDate::from_ymd_opt(from.0, from.1, from.2),
            to: NaiveDate::from_ymd_opt(to.0, to.1, to.2),
            user_id: None,
        };
        assert!(payroll_period(&query((2024, 1, 1), (2024, 12, 31))).is_ok());
        assert!(matches!(
            payroll_period(&query((2024, 1, 1), (2025, 1, 1))),
            Err(AppError::ValidationError(_))
        ));
        assert!(matches!(
            payroll_period(&query((1, 1, 1), (9999, 12, 31))),
            Err(AppError::ValidationError(_))
        ));
    }
}
