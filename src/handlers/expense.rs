use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Local;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::dtos::common::{clean, require_max_len, require_positive, require_text, DateRangeQuery};
use crate::dtos::expense::{CreateExpenseRequest, ExpenseQuery, UpdateExpenseRequest};
use crate::error::AppError;
use crate::handlers::ensure_exists;
use crate::handlers::shift::{ensure_shift_access, lock_shift};
use crate::middleware::auth::AuthContext;
use crate::models::bill::PaymentMethod;
use crate::models::expense::{Expense, EXPENSE_COLUMNS};
use crate::state::AppState;

async fn check_references(
    conn: &mut PgConnection,
    pump_master_id: Uuid,
    bank_account_id: Option<Uuid>,
    receipt_file_id: Option<Uuid>,
) -> Result<(), AppError> {
    if let Some(id) = bank_account_id {
        ensure_exists(&mut *conn, "bank_accounts", id, pump_master_id, "Bank account").await?;
    }
    if let Some(id) = receipt_file_id {
        ensure_exists(&mut *conn, "file_storage", id, pump_master_id, "Receipt file").await?;
    }
    Ok(())
}

/// Shift expenses feed the accounting; they freeze once the shift is accounted.
async fn check_shift_writable(
    conn: &mut PgConnection,
    auth: &AuthContext,
    shift_id: Option<Uuid>,
) -> Result<(), AppError> {
    match shift_id {
        Some(shift_id) => {
            let shift = lock_shift(conn, auth.pump_master_id, shift_id).await?;
            ensure_shift_access(auth, shift.salesman_id)?;
            if shift.accounting_done {
                return Err(AppError::conflict("Shift is already accounted"));
            }
            Ok(())
        }
        None => auth.require_manager("record expenses outside a shift"),
    }
}

// GET /expenses?from&to&shiftId
pub async fn list_expenses(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ExpenseQuery>,
) -> Result<Json<Vec<Expense>>, AppError> {
    DateRangeQuery { from: query.from, to: query.to }.validate()?;

    let expenses = sqlx::query_as::<_, Expense>(&format!(
        "SELECT {EXPENSE_COLUMNS} FROM expenses
         WHERE pump_master_id = $1
           AND ($2::DATE IS NULL OR expense_date >= $2)
           AND ($3::DATE IS NULL OR expense_date <= $3)
           AND ($4::UUID IS NULL OR salesman_nozzle_shift_id = $4)
         ORDER BY expense_date DESC, created_at DESC"
    ))
    .bind(auth.pump_master_id)
    .bind(query.from)
    .bind(query.to)
    .bind(query.shift_id)
    .fetch_all(&db_pool)
    .await?;

    Ok(Json(expenses))
}

pub async fn get_expense(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Expense>, AppError> {
    let expense = sqlx::query_as::<_, Expense>(&format!(
        "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE id = $1 AND pump_master_id = $2"
    ))
    .bind(id)
    .bind(auth.pump_master_id)
    .fetch_optional(&db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Expense not found"))?;

    Ok(Json(expense))
}

pub async fn create_expense(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<CreateExpenseRequest>,
) -> Result<(StatusCode, Json<Expense>), AppError> {
    require_text(&payload.expense_category, "Expense category")?;
    require_max_len(Some(&payload.expense_category), 50, "Expense category")?;
    require_positive(payload.amount, "Amount")?;

    let mut tx = db_pool.begin().await?;

    check_shift_writable(&mut tx, &auth, payload.salesman_nozzle_shift_id).await?;
    check_references(&mut tx, auth.pump_master_id, payload.bank_account_id, payload.receipt_file_id).await?;

    let expense = sqlx::query_as::<_, Expense>(&format!(
        "INSERT INTO expenses
            (pump_master_id, expense_date, expense_category, amount, description,
             salesman_nozzle_shift_id, bank_account_id, payment_method, receipt_file_id, created_by)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
         RETURNING {EXPENSE_COLUMNS}"
    ))
    .bind(auth.pump_master_id)
    .bind(payload.expense_date.unwrap_or_else(|| Local::now().date_naive()))
    .bind(payload.expense_category.trim())
    .bind(payload.amount)
    .bind(clean(payload.description))
    .bind(payload.salesman_nozzle_shift_id)
    .bind(payload.bank_account_id)
    .bind(payload.payment_method.unwrap_or(PaymentMethod::Cash))
    .bind(payload.receipt_file_id)
    .bind(auth.user_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(expense)))
}

pub async fn update_expense(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateExpenseRequest>,
) -> Result<Json<Expense>, AppError> {
    if let Some(category) = payload.expense_category.as_deref() {
        require_text(category, "Expense category")?;
        require_max_len(Some(category), 50, "Expense category")?;
    }
    if let Some(amount) = payload.amount {
        require_positive(amount, "Amount")?;
    }

    let mut tx = db_pool.begin().await?;

    let shift_id = sqlx::query_scalar::<_, Option<Uuid>>(
        "SELECT salesman_nozzle_shift_id FROM expenses WHERE id = $1 AND pump_master_id = $2",
    )
    .bind(id)
    .bind(auth.pump_master_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::not_found("Expense not found"))?;

    check_shift_writable(&mut tx, &auth, shift_id).await?;
    check_references(&mut tx, auth.pump_master_id, payload.bank_account_id, payload.receipt_file_id).await?;

    let expense = sqlx::query_as::<_, Expense>(&format!(
        "UPDATE expenses SET
            expense_date = COALESCE($1, expense_date),
            expense_category = COALESCE($2, expense_category),
            amount = COALESCE($3, amount),
            description = COALESCE($4, description),
            bank_account_id = COALESCE($5, bank_account_id),
            payment_method = COALESCE($6, payment_method),
            receipt_file_id = COALESCE($7, receipt_file_id)
         WHERE id = $8
         RETURNING {EXPENSE_COLUMNS}"
    ))
    .bind(payload.expense_date)
    .bind(payload.expense_category.map(|c| c.trim().to_string()))
    .bind(payload.amount)
    .bind(clean(payload.description))
    .bind(payload.bank_account_id)
    .bind(payload.payment_method)
    .bind(payload.receipt_file_id)
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(Json(expense))
}

pub async fn delete_expense(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    auth.require_manager("delete expenses")?;

    let mut tx = db_pool.begin().await?;

    let shift_id = sqlx::query_scalar::<_, Option<Uuid>>(
        "SELECT salesman_nozzle_shift_id FROM expenses WHERE id = $1 AND pump_master_id = $2",
    )
    .bind(id)
    .bind(auth.pump_master_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::not_found("Expense not found"))?;

    check_shift_writable(&mut tx, &auth, shift_id).await?;

    sqlx::query("DELETE FROM expenses WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}
