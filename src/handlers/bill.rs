use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Local;
use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::ledger::within_credit_limit;
use crate::dtos::bill::{resolve_quantity_and_amount, BillQuery, CreateBillRequest, UpdateBillRequest};
use crate::dtos::common::{clean, require_max_len, DateRangeQuery};
use crate::error::AppError;
use crate::handlers::customer::load_customer_balance;
use crate::handlers::ensure_exists;
use crate::handlers::shift::{ensure_shift_access, lock_shift};
use crate::middleware::auth::AuthContext;
use crate::models::bill::{SalesmanBill, BILL_SELECT};
use crate::state::AppState;

async fn fetch_bill(db_pool: &PgPool, pump_master_id: Uuid, id: Uuid) -> Result<SalesmanBill, AppError> {
    sqlx::query_as::<_, SalesmanBill>(&format!("{BILL_SELECT} WHERE b.id = $1 AND b.pump_master_id = $2"))
        .bind(id)
        .bind(pump_master_id)
        .fetch_optional(db_pool)
        .await?
        .ok_or_else(|| AppError::not_found("Bill not found"))
}

/// Next bill number for the pump master. The upsert holds the counter row
/// lock until the surrounding transaction ends, so numbers never repeat.
async fn next_bill_no(conn: &mut PgConnection, pump_master_id: Uuid) -> Result<i64, AppError> {
    let bill_no = sqlx::query_scalar::<_, i64>(
        "INSERT INTO bill_sequences (pump_master_id, last_bill_no)
         VALUES ($1, 1)
         ON CONFLICT (pump_master_id)
         DO UPDATE SET last_bill_no = bill_sequences.last_bill_no + 1
         RETURNING last_bill_no",
    )
    .bind(pump_master_id)
    .fetch_one(conn)
    .await?;
    Ok(bill_no)
}

async fn check_images(
    conn: &mut PgConnection,
    pump_master_id: Uuid,
    meter_image_id: Option<Uuid>,
    vehicle_image_id: Option<Uuid>,
) -> Result<(), AppError> {
    for file_id in [meter_image_id, vehicle_image_id].into_iter().flatten() {
        ensure_exists(&mut *conn, "file_storage", file_id, pump_master_id, "Image").await?;
    }
    Ok(())
}

fn validate_vehicle(vehicle_no: Option<&str>, driver_name: Option<&str>) -> Result<(), AppError> {
    require_max_len(vehicle_no, 20, "Vehicle number")?;
    require_max_len(driver_name, 100, "Driver name")?;
    Ok(())
}

// POST /salesman-bills
#[instrument(skip_all, fields(customer_id = %payload.customer_id, shift_id = %payload.salesman_nozzle_shift_id))]
pub async fn create_bill(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<CreateBillRequest>,
) -> Result<(StatusCode, Json<SalesmanBill>), AppError> {
    validate_vehicle(payload.vehicle_no.as_deref(), payload.driver_name.as_deref())?;

    let mut tx = db_pool.begin().await?;

    let shift = lock_shift(&mut tx, auth.pump_master_id, payload.salesman_nozzle_shift_id).await?;
    ensure_shift_access(&auth, shift.salesman_id)?;
    if !shift.status.is_running() {
        return Err(AppError::conflict("Bills can only be raised on a running shift"));
    }

    let (quantity, amount) = resolve_quantity_and_amount(payload.quantity, payload.amount, shift.product_rate)
        .map_err(AppError::validation)?;

    // Serialises concurrent bills for one customer so the limit check holds
    sqlx::query("SELECT 1 FROM customers WHERE id = $1 AND pump_master_id = $2 FOR UPDATE")
        .bind(payload.customer_id)
        .bind(auth.pump_master_id)
        .execute(&mut *tx)
        .await?;

    let balance = load_customer_balance(&mut *tx, auth.pump_master_id, payload.customer_id).await?;
    if !balance.is_active {
        return Err(AppError::validation("Customer is inactive"));
    }
    let outstanding = balance.outstanding();
    if !within_credit_limit(balance.credit_limit, outstanding, amount) {
        warn!(outstanding, amount, credit_limit = balance.credit_limit, "Credit limit exceeded");
        return Err(AppError::validation(format!(
            "Credit limit exceeded for {}: outstanding {:.2}, bill {:.2}, limit {:.2}",
            balance.customer_name, outstanding, amount, balance.credit_limit
        )));
    }

    check_images(&mut tx, auth.pump_master_id, payload.meter_image_id, payload.vehicle_image_id).await?;

    let bill_no = next_bill_no(&mut tx, auth.pump_master_id).await?;

    let id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO salesman_bills
            (pump_master_id, bill_no, bill_date, customer_id, product_id, salesman_nozzle_shift_id,
             quantity, rate, amount, vehicle_no, driver_name, meter_image_id, vehicle_image_id,
             remarks, created_by)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
         RETURNING id",
    )
    .bind(auth.pump_master_id)
    .bind(bill_no)
    .bind(payload.bill_date.unwrap_or_else(|| Local::now().date_naive()))
    .bind(payload.customer_id)
    .bind(shift.product_id)
    .bind(payload.salesman_nozzle_shift_id)
    .bind(quantity)
    .bind(shift.product_rate)
    .bind(amount)
    .bind(clean(payload.vehicle_no).map(|v| v.to_uppercase()))
    .bind(clean(payload.driver_name))
    .bind(payload.meter_image_id)
    .bind(payload.vehicle_image_id)
    .bind(clean(payload.remarks))
    .bind(auth.user_id)
    .fetch_one(&mut *tx)
    .await?;

    // First sale moves the shift from OPEN to ACTIVE
    sqlx::query("UPDATE salesman_nozzle_shifts SET status = 'ACTIVE' WHERE id = $1 AND status = 'OPEN'")
        .bind(payload.salesman_nozzle_shift_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    info!(bill_no, amount, "Bill raised");

    let bill = fetch_bill(&db_pool, auth.pump_master_id, id).await?;
    Ok((StatusCode::CREATED, Json(bill)))
}

// GET /salesman-bills?from&to&customerId&shiftId
pub async fn list_bills(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<BillQuery>,
) -> Result<Json<Vec<SalesmanBill>>, AppError> {
    DateRangeQuery { from: query.from, to: query.to }.validate()?;

    let bills = sqlx::query_as::<_, SalesmanBill>(&format!(
        "{BILL_SELECT}
         WHERE b.pump_master_id = $1
           AND ($2::DATE IS NULL OR b.bill_date >= $2)
           AND ($3::DATE IS NULL OR b.bill_date <= $3)
           AND ($4::UUID IS NULL OR b.customer_id = $4)
           AND ($5::UUID IS NULL OR b.salesman_nozzle_shift_id = $5)
         ORDER BY b.bill_no DESC"
    ))
    .bind(auth.pump_master_id)
    .bind(query.from)
    .bind(query.to)
    .bind(query.customer_id)
    .bind(query.shift_id)
    .fetch_all(&db_pool)
    .await?;

    Ok(Json(bills))
}

pub async fn get_bill(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<SalesmanBill>, AppError> {
    Ok(Json(fetch_bill(&db_pool, auth.pump_master_id, id).await?))
}

// PUT /salesman-bills/{id} - vehicle, driver, images and remarks only
pub async fn update_bill(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateBillRequest>,
) -> Result<Json<SalesmanBill>, AppError> {
    validate_vehicle(payload.vehicle_no.as_deref(), payload.driver_name.as_deref())?;

    let mut tx = db_pool.begin().await?;

    let shift_id = sqlx::query_scalar::<_, Uuid>(
        "SELECT salesman_nozzle_shift_id FROM salesman_bills WHERE id = $1 AND pump_master_id = $2",
    )
    .bind(id)
    .bind(auth.pump_master_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::not_found("Bill not found"))?;

    let shift = lock_shift(&mut tx, auth.pump_master_id, shift_id).await?;
    ensure_shift_access(&auth, shift.salesman_id)?;

    check_images(&mut tx, auth.pump_master_id, payload.meter_image_id, payload.vehicle_image_id).await?;

    sqlx::query(
        "UPDATE salesman_bills SET
            vehicle_no = COALESCE($1, vehicle_no),
            driver_name = COALESCE($2, driver_name),
            meter_image_id = COALESCE($3, meter_image_id),
            vehicle_image_id = COALESCE($4, vehicle_image_id),
            remarks = COALESCE($5, remarks)
         WHERE id = $6",
    )
    .bind(clean(payload.vehicle_no).map(|v| v.to_uppercase()))
    .bind(clean(payload.driver_name))
    .bind(payload.meter_image_id)
    .bind(payload.vehicle_image_id)
    .bind(clean(payload.remarks))
    .bind(id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(Json(fetch_bill(&db_pool, auth.pump_master_id, id).await?))
}

// DELETE /salesman-bills/{id}
pub async fn delete_bill(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    auth.require_manager("delete bills")?;

    let mut tx = db_pool.begin().await?;

    let shift_id = sqlx::query_scalar::<_, Uuid>(
        "SELECT salesman_nozzle_shift_id FROM salesman_bills WHERE id = $1 AND pump_master_id = $2",
    )
    .bind(id)
    .bind(auth.pump_master_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::not_found("Bill not found"))?;

    let shift = lock_shift(&mut tx, auth.pump_master_id, shift_id).await?;
    if shift.accounting_done {
        return Err(AppError::conflict("Shift is already accounted; delete its accounting first"));
    }

    sqlx::query("DELETE FROM salesman_bills WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}
