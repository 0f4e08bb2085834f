use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::domain::round2;
use crate::dtos::common::{clean, require_max_len, require_non_negative, require_positive, require_text, DateRangeQuery};
use crate::dtos::purchase::{CreatePurchaseRequest, PurchaseQuery, UpdatePurchaseRequest};
use crate::error::{map_constraint_violation, AppError};
use crate::handlers::ensure_exists;
use crate::middleware::auth::AuthContext;
use crate::models::purchase::{Purchase, PURCHASE_SELECT};
use crate::state::AppState;

async fn fetch_purchase(db_pool: &PgPool, pump_master_id: Uuid, id: Uuid) -> Result<Purchase, AppError> {
    sqlx::query_as::<_, Purchase>(&format!("{PURCHASE_SELECT} WHERE pu.id = $1 AND pu.pump_master_id = $2"))
        .bind(id)
        .bind(pump_master_id)
        .fetch_optional(db_pool)
        .await?
        .ok_or_else(|| AppError::not_found("Purchase not found"))
}

/// The tank, when given, must hold the purchased product.
async fn check_tank_product(
    db_pool: &PgPool,
    pump_master_id: Uuid,
    tank_id: Uuid,
    product_id: Uuid,
) -> Result<(), AppError> {
    let tank_product = sqlx::query_scalar::<_, Uuid>(
        "SELECT product_id FROM tanks WHERE id = $1 AND pump_master_id = $2",
    )
    .bind(tank_id)
    .bind(pump_master_id)
    .fetch_optional(db_pool)
    .await?
    .ok_or_else(|| AppError::validation("Tank not found"))?;

    if tank_product != product_id {
        return Err(AppError::validation("Tank does not hold the purchased product"));
    }
    Ok(())
}

// GET /purchases?from&to&supplierId
#[instrument(skip_all)]
pub async fn list_purchases(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<PurchaseQuery>,
) -> Result<Json<Vec<Purchase>>, AppError> {
    DateRangeQuery { from: query.from, to: query.to }.validate()?;

    let purchases = sqlx::query_as::<_, Purchase>(&format!(
        "{PURCHASE_SELECT}
         WHERE pu.pump_master_id = $1
           AND ($2::DATE IS NULL OR pu.purchase_date >= $2)
           AND ($3::DATE IS NULL OR pu.purchase_date <= $3)
           AND ($4::UUID IS NULL OR pu.supplier_id = $4)
         ORDER BY pu.purchase_date DESC, pu.created_at DESC"
    ))
    .bind(auth.pump_master_id)
    .bind(query.from)
    .bind(query.to)
    .bind(query.supplier_id)
    .fetch_all(&db_pool)
    .await?;

    Ok(Json(purchases))
}

pub async fn get_purchase(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Purchase>, AppError> {
    Ok(Json(fetch_purchase(&db_pool, auth.pump_master_id, id).await?))
}

pub async fn create_purchase(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<CreatePurchaseRequest>,
) -> Result<(StatusCode, Json<Purchase>), AppError> {
    auth.require_manager("record purchases")?;
    require_text(&payload.invoice_number, "Invoice number")?;
    require_max_len(Some(&payload.invoice_number), 50, "Invoice number")?;
    require_positive(payload.quantity, "Quantity")?;
    require_positive(payload.purchase_rate, "Purchase rate")?;
    require_non_negative(payload.tax_amount, "Tax amount")?;

    ensure_exists(&db_pool, "suppliers", payload.supplier_id, auth.pump_master_id, "Supplier").await?;
    ensure_exists(&db_pool, "products", payload.product_id, auth.pump_master_id, "Product").await?;
    if let Some(tank_id) = payload.tank_id {
        check_tank_product(&db_pool, auth.pump_master_id, tank_id, payload.product_id).await?;
    }

    let amount = round2(payload.quantity * payload.purchase_rate);

    let id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO purchases
            (pump_master_id, supplier_id, product_id, tank_id, invoice_number, purchase_date,
             quantity, purchase_rate, amount, tax_amount, payment_type, remarks)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
         RETURNING id",
    )
    .bind(auth.pump_master_id)
    .bind(payload.supplier_id)
    .bind(payload.product_id)
    .bind(payload.tank_id)
    .bind(payload.invoice_number.trim())
    .bind(payload.purchase_date)
    .bind(payload.quantity)
    .bind(payload.purchase_rate)
    .bind(amount)
    .bind(payload.tax_amount)
    .bind(payload.payment_type)
    .bind(clean(payload.remarks))
    .fetch_one(&db_pool)
    .await
    .map_err(|e| map_constraint_violation(e, "Purchase already recorded"))?;

    let purchase = fetch_purchase(&db_pool, auth.pump_master_id, id).await?;
    Ok((StatusCode::CREATED, Json(purchase)))
}

pub async fn update_purchase(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePurchaseRequest>,
) -> Result<Json<Purchase>, AppError> {
    auth.require_manager("update purchases")?;
    if let Some(invoice) = payload.invoice_number.as_deref() {
        require_text(invoice, "Invoice number")?;
        require_max_len(Some(invoice), 50, "Invoice number")?;
    }
    if let Some(tax) = payload.tax_amount {
        require_non_negative(tax, "Tax amount")?;
    }

    let current = fetch_purchase(&db_pool, auth.pump_master_id, id).await?;
    let quantity = payload.quantity.unwrap_or(current.quantity);
    let purchase_rate = payload.purchase_rate.unwrap_or(current.purchase_rate);
    require_positive(quantity, "Quantity")?;
    require_positive(purchase_rate, "Purchase rate")?;

    sqlx::query(
        "UPDATE purchases SET
            invoice_number = COALESCE($1, invoice_number),
            purchase_date = COALESCE($2, purchase_date),
            quantity = $3,
            purchase_rate = $4,
            amount = $5,
            tax_amount = COALESCE($6, tax_amount),
            payment_type = COALESCE($7, payment_type),
            remarks = COALESCE($8, remarks)
         WHERE id = $9 AND pump_master_id = $10",
    )
    .bind(payload.invoice_number.map(|i| i.trim().to_string()))
    .bind(payload.purchase_date)
    .bind(quantity)
    .bind(purchase_rate)
    .bind(round2(quantity * purchase_rate))
    .bind(payload.tax_amount)
    .bind(payload.payment_type)
    .bind(clean(payload.remarks))
    .bind(id)
    .bind(auth.pump_master_id)
    .execute(&db_pool)
    .await?;

    Ok(Json(fetch_purchase(&db_pool, auth.pump_master_id, id).await?))
}

pub async fn delete_purchase(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    auth.require_manager("delete purchases")?;

    let result = sqlx::query("DELETE FROM purchases WHERE id = $1 AND pump_master_id = $2")
        .bind(id)
        .bind(auth.pump_master_id)
        .execute(&db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Purchase not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}
