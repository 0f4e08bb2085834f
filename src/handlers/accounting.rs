// src/handlers/accounting.rs
//
// End-of-shift accounting: the server derives what the shift should have
// produced, the salesman declares what was collected, and the difference is
// stored as the balance. Finalized accountings are frozen.
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::shift::{dispensed_quantity, fuel_sales_amount, ShiftStatus};
use crate::domain::shift_accounting::{reconcile, AccountingSummary, CashPosition, CollectedAmounts, SystemTotals};
use crate::dtos::accounting::{
    stored_counts, AccountingResponse, CollectedInput, CreateAccountingRequest, SystemTotalsResponse,
};
use crate::dtos::common::DateRangeQuery;
use crate::error::AppError;
use crate::handlers::shift::{ensure_shift_access, lock_shift};
use crate::middleware::auth::AuthContext;
use crate::models::accounting::{SalesmanShiftAccounting, ACCOUNTING_COLUMNS};
use crate::state::AppState;

#[derive(sqlx::FromRow)]
struct ShiftTotalsRow {
    salesman_name: String,
    nozzle_name: String,
    status: ShiftStatus,
    opening_reading: f64,
    closing_reading: Option<f64>,
    product_rate: f64,
    customer_receipt: f64,
    credit: f64,
    expenses: f64,
}

impl ShiftTotalsRow {
    fn dispensed(&self) -> Result<f64, AppError> {
        let closing = match (self.status, self.closing_reading) {
            (ShiftStatus::Closed, Some(closing)) => closing,
            _ => return Err(AppError::conflict("Shift is still running; close it before accounting")),
        };
        dispensed_quantity(self.opening_reading, closing).map_err(|e| AppError::validation(e.to_string()))
    }

    fn totals(&self) -> Result<SystemTotals, AppError> {
        Ok(SystemTotals {
            fuel_sales: fuel_sales_amount(self.dispensed()?, self.product_rate),
            customer_receipt: self.customer_receipt,
            credit: self.credit,
            expenses: self.expenses,
        })
    }
}

/// Fuel sales from the meter, receipts from every payment taken on the shift,
/// credit from its bills and expenses from its expense records.
async fn load_shift_totals<'e, E>(
    executor: E,
    pump_master_id: Uuid,
    shift_id: Uuid,
) -> Result<ShiftTotalsRow, AppError>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query_as::<_, ShiftTotalsRow>(
        "SELECT u.full_name AS salesman_name, n.nozzle_name, sh.status,
                sh.opening_reading::FLOAT8 AS opening_reading,
                sh.closing_reading::FLOAT8 AS closing_reading,
                sh.product_rate::FLOAT8    AS product_rate,
                COALESCE((SELECT SUM(sp.amount) FROM salesman_bill_payments sp
                          WHERE sp.salesman_nozzle_shift_id = sh.id), 0)::FLOAT8 AS customer_receipt,
                COALESCE((SELECT SUM(b.amount) FROM salesman_bills b
                          WHERE b.salesman_nozzle_shift_id = sh.id), 0)::FLOAT8 AS credit,
                COALESCE((SELECT SUM(e.amount) FROM expenses e
                          WHERE e.salesman_nozzle_shift_id = sh.id), 0)::FLOAT8 AS expenses
         FROM salesman_nozzle_shifts sh
         JOIN users u ON u.id = sh.salesman_id
         JOIN nozzles n ON n.id = sh.nozzle_id
         WHERE sh.id = $1 AND sh.pump_master_id = $2",
    )
    .bind(shift_id)
    .bind(pump_master_id)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| AppError::not_found("Shift not found"))
}

async fn fetch_accounting(
    db_pool: &PgPool,
    pump_master_id: Uuid,
    id: Uuid,
) -> Result<SalesmanShiftAccounting, AppError> {
    sqlx::query_as::<_, SalesmanShiftAccounting>(&format!(
        "SELECT {ACCOUNTING_COLUMNS} FROM salesman_shift_accountings WHERE id = $1 AND pump_master_id = $2"
    ))
    .bind(id)
    .bind(pump_master_id)
    .fetch_optional(db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Accounting not found"))
}

#[derive(sqlx::FromRow)]
struct AccountingLock {
    salesman_nozzle_shift_id: Uuid,
    is_finalized: bool,
}

async fn lock_accounting(
    conn: &mut PgConnection,
    pump_master_id: Uuid,
    id: Uuid,
) -> Result<AccountingLock, AppError> {
    sqlx::query_as::<_, AccountingLock>(
        "SELECT salesman_nozzle_shift_id, is_finalized
         FROM salesman_shift_accountings
         WHERE id = $1 AND pump_master_id = $2
         FOR UPDATE",
    )
    .bind(id)
    .bind(pump_master_id)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| AppError::not_found("Accounting not found"))
}

fn log_position(summary: &AccountingSummary) {
    match summary.cash_position {
        CashPosition::Balanced => info!("Shift accounting balanced"),
        CashPosition::Excess => info!(balance = summary.balance_amount, "Excess cash in hand"),
        CashPosition::Shortage => warn!(balance = summary.balance_amount, "Cash shortage"),
    }
}

// GET /salesman-shift-accountings/shift/{shift_id}/system-totals
pub async fn get_system_totals(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(shift_id): Path<Uuid>,
) -> Result<Json<SystemTotalsResponse>, AppError> {
    let row = load_shift_totals(&db_pool, auth.pump_master_id, shift_id).await?;
    let dispensed = row.dispensed()?;
    let totals = row.totals()?;

    Ok(Json(SystemTotalsResponse {
        salesman_nozzle_shift_id: shift_id,
        salesman_name: row.salesman_name,
        nozzle_name: row.nozzle_name,
        dispensed_quantity: dispensed,
        product_rate: row.product_rate,
        expected_cash: totals.expected_cash(),
        totals,
    }))
}

// POST /salesman-shift-accountings/preview - computes, stores nothing
pub async fn preview_accounting(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<CreateAccountingRequest>,
) -> Result<Json<AccountingSummary>, AppError> {
    let collected = payload.collected.validate()?;
    let row = load_shift_totals(&db_pool, auth.pump_master_id, payload.salesman_nozzle_shift_id).await?;
    Ok(Json(reconcile(&row.totals()?, &collected)))
}

async fn insert_accounting(
    conn: &mut PgConnection,
    auth: &AuthContext,
    shift_id: Uuid,
    totals: &SystemTotals,
    collected: &CollectedAmounts,
    summary: &AccountingSummary,
) -> Result<Uuid, AppError> {
    let mut query = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO salesman_shift_accountings
            (pump_master_id, salesman_nozzle_shift_id, fuel_sales, customer_receipt, credit, expenses,
             upi_received, card_received, cash_in_hand, total_received, expected_cash, balance_amount,
             created_by,
             notes_2000, notes_1000, notes_500, notes_200, notes_100, notes_50, notes_20, notes_10,
             coins_5, coins_2, coins_1)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                 $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24)
         RETURNING id",
    )
    .bind(auth.pump_master_id)
    .bind(shift_id)
    .bind(totals.fuel_sales)
    .bind(totals.customer_receipt)
    .bind(totals.credit)
    .bind(summary.expenses)
    .bind(collected.upi_received)
    .bind(collected.card_received)
    .bind(summary.cash_in_hand)
    .bind(summary.total_received)
    .bind(summary.expected_cash)
    .bind(summary.balance_amount)
    .bind(auth.user_id);
    for count in stored_counts(&collected.denominations)? {
        query = query.bind(count);
    }

    query.fetch_one(conn).await.map_err(|e| match e.as_database_error() {
        Some(db) if db.constraint() == Some("shift_accountings_shift_key") => {
            AppError::conflict("Shift is already accounted")
        }
        _ => AppError::db(e),
    })
}

// POST /salesman-shift-accountings
#[instrument(skip_all, fields(shift_id = %payload.salesman_nozzle_shift_id))]
pub async fn create_accounting(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<CreateAccountingRequest>,
) -> Result<(StatusCode, Json<AccountingResponse>), AppError> {
    let collected = payload.collected.validate()?;
    let shift_id = payload.salesman_nozzle_shift_id;

    let mut tx = db_pool.begin().await?;

    let shift = lock_shift(&mut tx, auth.pump_master_id, shift_id).await?;
    ensure_shift_access(&auth, shift.salesman_id)?;
    if shift.status != ShiftStatus::Closed {
        return Err(AppError::conflict("Only a closed shift can be accounted"));
    }
    if shift.accounting_done {
        return Err(AppError::conflict("Shift is already accounted"));
    }

    let totals = load_shift_totals(&mut *tx, auth.pump_master_id, shift_id).await?.totals()?;
    let summary = reconcile(&totals, &collected);

    let id = insert_accounting(&mut tx, &auth, shift_id, &totals, &collected, &summary).await?;

    sqlx::query("UPDATE salesman_nozzle_shifts SET accounting_done = TRUE WHERE id = $1")
        .bind(shift_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    log_position(&summary);

    let accounting = fetch_accounting(&db_pool, auth.pump_master_id, id).await?;
    Ok((StatusCode::CREATED, Json(accounting.into())))
}

// PUT /salesman-shift-accountings/{id} - recount before finalization
#[instrument(skip_all, fields(accounting_id = %id))]
pub async fn update_accounting(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CollectedInput>,
) -> Result<Json<AccountingResponse>, AppError> {
    let collected = payload.validate()?;

    let mut tx = db_pool.begin().await?;

    let existing = lock_accounting(&mut tx, auth.pump_master_id, id).await?;
    if existing.is_finalized {
        return Err(AppError::conflict("Accounting is finalized and cannot be changed"));
    }
    let shift = lock_shift(&mut tx, auth.pump_master_id, existing.salesman_nozzle_shift_id).await?;
    ensure_shift_access(&auth, shift.salesman_id)?;

    let totals = load_shift_totals(&mut *tx, auth.pump_master_id, existing.salesman_nozzle_shift_id)
        .await?
        .totals()?;
    let summary = reconcile(&totals, &collected);

    let mut query = sqlx::query(
        "UPDATE salesman_shift_accountings SET
            fuel_sales = $1, customer_receipt = $2, credit = $3, expenses = $4,
            upi_received = $5, card_received = $6,
            cash_in_hand = $7, total_received = $8, expected_cash = $9, balance_amount = $10,
            updated_at = NOW(),
            notes_2000 = $12, notes_1000 = $13, notes_500 = $14, notes_200 = $15, notes_100 = $16,
            notes_50 = $17, notes_20 = $18, notes_10 = $19, coins_5 = $20, coins_2 = $21, coins_1 = $22
         WHERE id = $11",
    )
    .bind(totals.fuel_sales)
    .bind(totals.customer_receipt)
    .bind(totals.credit)
    .bind(summary.expenses)
    .bind(collected.upi_received)
    .bind(collected.card_received)
    .bind(summary.cash_in_hand)
    .bind(summary.total_received)
    .bind(summary.expected_cash)
    .bind(summary.balance_amount)
    .bind(id);
    for count in stored_counts(&collected.denominations)? {
        query = query.bind(count);
    }
    query.execute(&mut *tx).await?;

    tx.commit().await?;

    log_position(&summary);

    let accounting = fetch_accounting(&db_pool, auth.pump_master_id, id).await?;
    Ok(Json(accounting.into()))
}

// POST /salesman-shift-accountings/{id}/finalize
#[instrument(skip_all, fields(accounting_id = %id))]
pub async fn finalize_accounting(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<AccountingResponse>, AppError> {
    auth.require_manager("finalize accounting")?;

    let mut tx = db_pool.begin().await?;

    let existing = lock_accounting(&mut tx, auth.pump_master_id, id).await?;
    if existing.is_finalized {
        return Err(AppError::conflict("Accounting is already finalized"));
    }

    sqlx::query(
        "UPDATE salesman_shift_accountings
         SET is_finalized = TRUE, finalized_by = $1, finalized_at = NOW(), updated_at = NOW()
         WHERE id = $2",
    )
    .bind(auth.user_id)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    info!(finalized_by = %auth.username, "Shift accounting finalized");

    let accounting = fetch_accounting(&db_pool, auth.pump_master_id, id).await?;
    Ok(Json(accounting.into()))
}

// GET /salesman-shift-accountings/shift/{shift_id}
pub async fn get_accounting_by_shift(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(shift_id): Path<Uuid>,
) -> Result<Json<AccountingResponse>, AppError> {
    let accounting = sqlx::query_as::<_, SalesmanShiftAccounting>(&format!(
        "SELECT {ACCOUNTING_COLUMNS} FROM salesman_shift_accountings
         WHERE salesman_nozzle_shift_id = $1 AND pump_master_id = $2"
    ))
    .bind(shift_id)
    .bind(auth.pump_master_id)
    .fetch_optional(&db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Shift has not been accounted"))?;

    Ok(Json(accounting.into()))
}

pub async fn get_accounting(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<AccountingResponse>, AppError> {
    Ok(Json(fetch_accounting(&db_pool, auth.pump_master_id, id).await?.into()))
}

// GET /salesman-shift-accountings?from&to - by shift start date
pub async fn list_accountings(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(range): Query<DateRangeQuery>,
) -> Result<Json<Vec<AccountingResponse>>, AppError> {
    range.validate()?;

    let rows = sqlx::query_as::<_, SalesmanShiftAccounting>(&format!(
        "SELECT {ACCOUNTING_COLUMNS} FROM salesman_shift_accountings
         WHERE pump_master_id = $1
           AND salesman_nozzle_shift_id IN (
               SELECT id FROM salesman_nozzle_shifts
               WHERE pump_master_id = $1
                 AND ($2::DATE IS NULL OR start_datetime::DATE >= $2)
                 AND ($3::DATE IS NULL OR start_datetime::DATE <= $3))
         ORDER BY created_at DESC"
    ))
    .bind(auth.pump_master_id)
    .bind(range.from)
    .bind(range.to)
    .fetch_all(&db_pool)
    .await?;

    Ok(Json(rows.into_iter().map(AccountingResponse::from).collect()))
}

// DELETE /salesman-shift-accountings/{id} - reopens the shift for accounting
pub async fn delete_accounting(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    auth.require_manager("delete accounting")?;

    let mut tx = db_pool.begin().await?;

    let existing = lock_accounting(&mut tx, auth.pump_master_id, id).await?;
    if existing.is_finalized {
        return Err(AppError::conflict("Finalized accounting cannot be deleted"));
    }

    sqlx::query("DELETE FROM salesman_shift_accountings WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("UPDATE salesman_nozzle_shifts SET accounting_done = FALSE WHERE id = $1")
        .bind(existing.salesman_nozzle_shift_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(status: ShiftStatus, closing: Option<f64>) -> ShiftTotalsRow {
        ShiftTotalsRow {
            salesman_name: "Ravi".into(),
            nozzle_name: "N1".into(),
            status,
            opening_reading: 1_000.0,
            closing_reading: closing,
            product_rate: 100.0,
            customer_receipt: 500.0,
            credit: 300.0,
            expenses: 50.0,
        }
    }

    #[test]
    fn totals_come_from_meter_and_shift_records() {
        let totals = row(ShiftStatus::Closed, Some(1_014.0)).totals().unwrap();
        assert_eq!(totals.fuel_sales, 1_400.0);
        assert_eq!(totals.expected_cash(), 1_600.0);
        assert_eq!(totals.expenses, 50.0);
    }

    #[test]
    fn running_shift_has_no_totals_yet() {
        assert!(matches!(
            row(ShiftStatus::Active, None).totals(),
            Err(AppError::Conflict(_))
        ));
    }
}
