use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Local;
use sqlx::{PgConnection, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::dtos::bill::{BillQuery, CreatePaymentRequest, UpdatePaymentRequest};
use crate::dtos::common::{clean, require_max_len, require_positive, DateRangeQuery};
use crate::error::AppError;
use crate::handlers::ensure_exists;
use crate::handlers::shift::{ensure_shift_access, lock_shift};
use crate::middleware::auth::AuthContext;
use crate::models::bill::{SalesmanBillPayment, PAYMENT_SELECT};
use crate::state::AppState;

async fn fetch_payment(
    db_pool: &PgPool,
    pump_master_id: Uuid,
    id: Uuid,
) -> Result<SalesmanBillPayment, AppError> {
    sqlx::query_as::<_, SalesmanBillPayment>(&format!(
        "{PAYMENT_SELECT} WHERE sp.id = $1 AND sp.pump_master_id = $2"
    ))
    .bind(id)
    .bind(pump_master_id)
    .fetch_optional(db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Payment not found"))
}

/// Payments taken on a shift count toward its accounting, so the shift must
/// still be open for changes.
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
        None => auth.require_manager("record payments outside a shift"),
    }
}

// POST /salesman-bill-payments
pub async fn create_payment(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<CreatePaymentRequest>,
) -> Result<(StatusCode, Json<SalesmanBillPayment>), AppError> {
    require_positive(payload.amount, "Amount")?;
    require_max_len(payload.reference_number.as_deref(), 50, "Reference number")?;

    let mut tx = db_pool.begin().await?;

    check_shift_writable(&mut tx, &auth, payload.salesman_nozzle_shift_id).await?;
    ensure_exists(&mut *tx, "customers", payload.customer_id, auth.pump_master_id, "Customer").await?;
    if let Some(bank_account_id) = payload.bank_account_id {
        ensure_exists(&mut *tx, "bank_accounts", bank_account_id, auth.pump_master_id, "Bank account").await?;
    }

    let id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO salesman_bill_payments
            (pump_master_id, customer_id, salesman_nozzle_shift_id, bank_account_id, payment_date,
             amount, payment_method, reference_number, remarks, created_by)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
         RETURNING id",
    )
    .bind(auth.pump_master_id)
    .bind(payload.customer_id)
    .bind(payload.salesman_nozzle_shift_id)
    .bind(payload.bank_account_id)
    .bind(payload.payment_date.unwrap_or_else(|| Local::now().date_naive()))
    .bind(payload.amount)
    .bind(payload.payment_method)
    .bind(clean(payload.reference_number))
    .bind(clean(payload.remarks))
    .bind(auth.user_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    info!(payment_id = %id, amount = payload.amount, "Payment received");

    let payment = fetch_payment(&db_pool, auth.pump_master_id, id).await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

// GET /salesman-bill-payments?from&to&customerId&shiftId
pub async fn list_payments(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<BillQuery>,
) -> Result<Json<Vec<SalesmanBillPayment>>, AppError> {
    DateRangeQuery { from: query.from, to: query.to }.validate()?;

    let payments = sqlx::query_as::<_, SalesmanBillPayment>(&format!(
        "{PAYMENT_SELECT}
         WHERE sp.pump_master_id = $1
           AND ($2::DATE IS NULL OR sp.payment_date >= $2)
           AND ($3::DATE IS NULL OR sp.payment_date <= $3)
           AND ($4::UUID IS NULL OR sp.customer_id = $4)
           AND ($5::UUID IS NULL OR sp.salesman_nozzle_shift_id = $5)
         ORDER BY sp.payment_date DESC, sp.created_at DESC"
    ))
    .bind(auth.pump_master_id)
    .bind(query.from)
    .bind(query.to)
    .bind(query.customer_id)
    .bind(query.shift_id)
    .fetch_all(&db_pool)
    .await?;

    Ok(Json(payments))
}

pub async fn get_payment(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<SalesmanBillPayment>, AppError> {
    Ok(Json(fetch_payment(&db_pool, auth.pump_master_id, id).await?))
}

pub async fn update_payment(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePaymentRequest>,
) -> Result<Json<SalesmanBillPayment>, AppError> {
    if let Some(amount) = payload.amount {
        require_positive(amount, "Amount")?;
    }
    require_max_len(payload.reference_number.as_deref(), 50, "Reference number")?;

    let mut tx = db_pool.begin().await?;

    let shift_id = sqlx::query_scalar::<_, Option<Uuid>>(
        "SELECT salesman_nozzle_shift_id FROM salesman_bill_payments
         WHERE id = $1 AND pump_master_id = $2",
    )
    .bind(id)
    .bind(auth.pump_master_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::not_found("Payment not found"))?;

    check_shift_writable(&mut tx, &auth, shift_id).await?;
    if let Some(bank_account_id) = payload.bank_account_id {
        ensure_exists(&mut *tx, "bank_accounts", bank_account_id, auth.pump_master_id, "Bank account").await?;
    }

    sqlx::query(
        "UPDATE salesman_bill_payments SET
            bank_account_id = COALESCE($1, bank_account_id),
            payment_date = COALESCE($2, payment_date),
            amount = COALESCE($3, amount),
            payment_method = COALESCE($4, payment_method),
            reference_number = COALESCE($5, reference_number),
            remarks = COALESCE($6, remarks)
         WHERE id = $7",
    )
    .bind(payload.bank_account_id)
    .bind(payload.payment_date)
    .bind(payload.amount)
    .bind(payload.payment_method)
    .bind(clean(payload.reference_number))
    .bind(clean(payload.remarks))
    .bind(id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(Json(fetch_payment(&db_pool, auth.pump_master_id, id).await?))
}

pub async fn delete_payment(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    auth.require_manager("delete payments")?;

    let mut tx = db_pool.begin().await?;

    let shift_id = sqlx::query_scalar::<_, Option<Uuid>>(
        "SELECT salesman_nozzle_shift_id FROM salesman_bill_payments
         WHERE id = $1 AND pump_master_id = $2",
    )
    .bind(id)
    .bind(auth.pump_master_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::not_found("Payment not found"))?;

    check_shift_writable(&mut tx, &auth, shift_id).await?;

    sqlx::query("DELETE FROM salesman_bill_payments WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}
