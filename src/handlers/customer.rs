use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::NaiveDate;
use sqlx::PgPool;
use tracing::{error, instrument};
use uuid::Uuid;

use crate::domain::ledger::{build_ledger, outstanding, LedgerEntryKind, LedgerMovement};
use crate::dtos::common::{clean, require_max_len, require_non_negative, require_text, DateRangeQuery};
use crate::dtos::customer::{
    CreateCustomerRequest, CustomerLedgerResponse, CustomerOutstandingResponse,
    UpdateCustomerRequest,
};
use crate::error::{map_constraint_violation, map_still_referenced, AppError};
use crate::middleware::auth::AuthContext;
use crate::models::customer::{Customer, CUSTOMER_COLUMNS};
use crate::state::AppState;

fn validate_tax_ids(gst: Option<&str>, pan: Option<&str>) -> Result<(), AppError> {
    require_max_len(gst, 15, "GST number")?;
    require_max_len(pan, 10, "PAN number")?;
    Ok(())
}

// GET /customers
#[instrument(skip_all)]
pub async fn list_customers(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<Customer>>, AppError> {
    match sqlx::query_as::<_, Customer>(&format!(
        "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE pump_master_id = $1 ORDER BY customer_name"
    ))
    .bind(auth.pump_master_id)
    .fetch_all(&db_pool)
    .await
    {
        Ok(customers) => Ok(Json(customers)),
        Err(e) => {
            error!(?e, "Failed to fetch customers");
            Err(e.into())
        }
    }
}

// GET /customers/{id}
pub async fn get_customer(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Customer>, AppError> {
    let customer = fetch_customer(&db_pool, auth.pump_master_id, id).await?;
    Ok(Json(customer))
}

async fn fetch_customer(db_pool: &PgPool, pump_master_id: Uuid, id: Uuid) -> Result<Customer, AppError> {
    sqlx::query_as::<_, Customer>(&format!(
        "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1 AND pump_master_id = $2"
    ))
    .bind(id)
    .bind(pump_master_id)
    .fetch_optional(db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Customer not found"))
}

// POST /customers
pub async fn create_customer(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<Customer>), AppError> {
    auth.require_manager("create customers")?;
    require_text(&payload.customer_name, "Customer name")?;
    require_max_len(Some(&payload.customer_name), 100, "Customer name")?;
    require_max_len(payload.phone_number.as_deref(), 15, "Phone number")?;
    validate_tax_ids(payload.gst_number.as_deref(), payload.pan_number.as_deref())?;
    require_non_negative(payload.credit_limit, "Credit limit")?;

    let customer = sqlx::query_as::<_, Customer>(&format!(
        "INSERT INTO customers
            (pump_master_id, customer_name, address, phone_number, gst_number, pan_number,
             credit_limit, opening_balance, opening_balance_date)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
         RETURNING {CUSTOMER_COLUMNS}"
    ))
    .bind(auth.pump_master_id)
    .bind(payload.customer_name.trim())
    .bind(clean(payload.address))
    .bind(clean(payload.phone_number))
    .bind(clean(payload.gst_number).map(|g| g.to_uppercase()))
    .bind(clean(payload.pan_number).map(|p| p.to_uppercase()))
    .bind(payload.credit_limit)
    .bind(payload.opening_balance)
    .bind(payload.opening_balance_date)
    .fetch_one(&db_pool)
    .await
    .map_err(|e| map_constraint_violation(e, "Customer name already exists"))?;

    Ok((StatusCode::CREATED, Json(customer)))
}

// PUT /customers/{id}
pub async fn update_customer(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCustomerRequest>,
) -> Result<Json<Customer>, AppError> {
    auth.require_manager("update customers")?;
    if let Some(name) = payload.customer_name.as_deref() {
        require_text(name, "Customer name")?;
        require_max_len(Some(name), 100, "Customer name")?;
    }
    require_max_len(payload.phone_number.as_deref(), 15, "Phone number")?;
    validate_tax_ids(payload.gst_number.as_deref(), payload.pan_number.as_deref())?;
    if let Some(limit) = payload.credit_limit {
        require_non_negative(limit, "Credit limit")?;
    }

    let customer = sqlx::query_as::<_, Customer>(&format!(
        "UPDATE customers SET
            customer_name = COALESCE($1, customer_name),
            address = COALESCE($2, address),
            phone_number = COALESCE($3, phone_number),
            gst_number = COALESCE($4, gst_number),
            pan_number = COALESCE($5, pan_number),
            credit_limit = COALESCE($6, credit_limit),
            opening_balance = COALESCE($7, opening_balance),
            opening_balance_date = COALESCE($8, opening_balance_date),
            is_active = COALESCE($9, is_active)
         WHERE id = $10 AND pump_master_id = $11
         RETURNING {CUSTOMER_COLUMNS}"
    ))
    .bind(payload.customer_name.map(|n| n.trim().to_string()))
    .bind(clean(payload.address))
    .bind(clean(payload.phone_number))
    .bind(clean(payload.gst_number).map(|g| g.to_uppercase()))
    .bind(clean(payload.pan_number).map(|p| p.to_uppercase()))
    .bind(payload.credit_limit)
    .bind(payload.opening_balance)
    .bind(payload.opening_balance_date)
    .bind(payload.is_active)
    .bind(id)
    .bind(auth.pump_master_id)
    .fetch_optional(&db_pool)
    .await
    .map_err(|e| map_constraint_violation(e, "Customer name already exists"))?
    .ok_or_else(|| AppError::not_found("Customer not found"))?;

    Ok(Json(customer))
}

// DELETE /customers/{id}
pub async fn delete_customer(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    auth.require_manager("delete customers")?;

    let result = sqlx::query("DELETE FROM customers WHERE id = $1 AND pump_master_id = $2")
        .bind(id)
        .bind(auth.pump_master_id)
        .execute(&db_pool)
        .await
        .map_err(|e| map_still_referenced(e, "Customer has bills or payments; deactivate instead"))?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Customer not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}

#[derive(sqlx::FromRow)]
pub(crate) struct CustomerBalanceRow {
    pub customer_name: String,
    pub credit_limit: f64,
    pub opening_balance: f64,
    pub total_billed: f64,
    pub total_paid: f64,
    pub is_active: bool,
}

impl CustomerBalanceRow {
    pub fn outstanding(&self) -> f64 {
        outstanding(self.opening_balance, self.total_billed, self.total_paid)
    }
}

/// Lifetime balance of a customer; used by the outstanding endpoint and the bill credit check.
pub(crate) async fn load_customer_balance<'e, E>(
    executor: E,
    pump_master_id: Uuid,
    customer_id: Uuid,
) -> Result<CustomerBalanceRow, AppError>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query_as::<_, CustomerBalanceRow>(
        "SELECT c.customer_name,
                c.credit_limit::FLOAT8     AS credit_limit,
                c.opening_balance::FLOAT8  AS opening_balance,
                COALESCE((SELECT SUM(b.amount) FROM salesman_bills b
                          WHERE b.customer_id = c.id), 0)::FLOAT8 AS total_billed,
                COALESCE((SELECT SUM(p.amount) FROM salesman_bill_payments p
                          WHERE p.customer_id = c.id), 0)::FLOAT8 AS total_paid,
                c.is_active
         FROM customers c
         WHERE c.id = $1 AND c.pump_master_id = $2",
    )
    .bind(customer_id)
    .bind(pump_master_id)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| AppError::not_found("Customer not found"))
}

// GET /customers/{id}/outstanding
pub async fn get_customer_outstanding(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<CustomerOutstandingResponse>, AppError> {
    let balance = load_customer_balance(&db_pool, auth.pump_master_id, id).await?;
    let outstanding = balance.outstanding();
    let available_credit = (balance.credit_limit > 0.0)
        .then(|| crate::domain::round2(balance.credit_limit - outstanding));

    Ok(Json(CustomerOutstandingResponse {
        customer_id: id,
        customer_name: balance.customer_name,
        opening_balance: balance.opening_balance,
        total_billed: balance.total_billed,
        total_paid: balance.total_paid,
        outstanding,
        credit_limit: balance.credit_limit,
        available_credit,
    }))
}

#[derive(sqlx::FromRow)]
struct LedgerRow {
    id: Uuid,
    kind: String,
    entry_date: NaiveDate,
    reference: Option<String>,
    amount: f64,
}

// GET /customers/{id}/ledger?from&to
#[instrument(skip_all, fields(customer_id = %id))]
pub async fn get_customer_ledger(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Query(range): Query<DateRangeQuery>,
) -> Result<Json<CustomerLedgerResponse>, AppError> {
    range.validate()?;
    let customer = fetch_customer(&db_pool, auth.pump_master_id, id).await?;

    // Everything before the window folds into the opening balance
    let carried = match range.from {
        Some(from) => sqlx::query_scalar::<_, f64>(
            "SELECT (
                COALESCE((SELECT SUM(amount) FROM salesman_bills
                          WHERE customer_id = $1 AND bill_date < $2), 0)
              - COALESCE((SELECT SUM(amount) FROM salesman_bill_payments
                          WHERE customer_id = $1 AND payment_date < $2), 0)
             )::FLOAT8",
        )
        .bind(id)
        .bind(from)
        .fetch_one(&db_pool)
        .await?,
        None => 0.0,
    };

    let rows = sqlx::query_as::<_, LedgerRow>(
        "SELECT id, 'BILL' AS kind, bill_date AS entry_date,
                'Bill #' || bill_no::TEXT AS reference,
                amount::FLOAT8 AS amount, created_at
         FROM salesman_bills
         WHERE customer_id = $1
           AND ($2::DATE IS NULL OR bill_date >= $2)
           AND ($3::DATE IS NULL OR bill_date <= $3)
         UNION ALL
         SELECT id, 'PAYMENT' AS kind, payment_date AS entry_date,
                reference_number AS reference,
                amount::FLOAT8 AS amount, created_at
         FROM salesman_bill_payments
         WHERE customer_id = $1
           AND ($2::DATE IS NULL OR payment_date >= $2)
           AND ($3::DATE IS NULL OR payment_date <= $3)
         ORDER BY entry_date, created_at",
    )
    .bind(id)
    .bind(range.from)
    .bind(range.to)
    .fetch_all(&db_pool)
    .await?;

    let movements: Vec<LedgerMovement> = rows
        .into_iter()
        .map(|r| LedgerMovement {
            id: r.id,
            kind: if r.kind == "BILL" {
                LedgerEntryKind::Bill
            } else {
                LedgerEntryKind::Payment
            },
            entry_date: r.entry_date,
            reference: r.reference,
            amount: r.amount,
        })
        .collect();

    let ledger = build_ledger(customer.opening_balance + carried, &movements);

    Ok(Json(CustomerLedgerResponse {
        customer_id: customer.id,
        customer_name: customer.customer_name,
        from: range.from,
        to: range.to,
        ledger,
    }))
}
