// src/handlers/product.rs
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::dtos::common::{clean, require_max_len, require_non_negative, require_positive, require_text};
use crate::dtos::product::{ChangeLogQuery, CreateProductRequest, UpdateProductRequest};
use crate::error::{map_constraint_violation, map_still_referenced, AppError};
use crate::middleware::auth::AuthContext;
use crate::models::product::{Product, ProductSalesUnitChangeLog, PRODUCT_COLUMNS};
use crate::state::AppState;

const DUPLICATE_NAME: &str = "Product name already exists";

fn validate_gst(gst_percentage: f64) -> Result<(), AppError> {
    require_non_negative(gst_percentage, "GST percentage")?;
    if gst_percentage > 100.0 {
        return Err(AppError::validation("GST percentage cannot exceed 100"));
    }
    Ok(())
}

// GET /products - List all products
#[instrument(skip_all)]
pub async fn get_products(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<Product>>, AppError> {
    match sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE pump_master_id = $1 ORDER BY product_name"
    ))
    .bind(auth.pump_master_id)
    .fetch_all(&db_pool)
    .await
    {
        Ok(products) => Ok(Json(products)),
        Err(e) => {
            error!(?e, "Failed to fetch products");
            Err(e.into())
        }
    }
}

// GET /products/{id}
pub async fn get_product(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Product>, AppError> {
    let product = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 AND pump_master_id = $2"
    ))
    .bind(id)
    .bind(auth.pump_master_id)
    .fetch_optional(&db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Product not found"))?;

    Ok(Json(product))
}

// POST /products
pub async fn create_product(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    auth.require_manager("create products")?;
    require_text(&payload.product_name, "Product name")?;
    require_max_len(Some(&payload.product_name), 100, "Product name")?;
    require_max_len(payload.hsn_code.as_deref(), 10, "HSN code")?;
    require_positive(payload.sales_rate, "Sales rate")?;
    validate_gst(payload.gst_percentage)?;

    let product = sqlx::query_as::<_, Product>(&format!(
        "INSERT INTO products
            (pump_master_id, product_name, product_type, hsn_code, sales_unit, sales_rate, gst_percentage)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING {PRODUCT_COLUMNS}"
    ))
    .bind(auth.pump_master_id)
    .bind(payload.product_name.trim())
    .bind(payload.product_type)
    .bind(clean(payload.hsn_code))
    .bind(payload.sales_unit)
    .bind(payload.sales_rate)
    .bind(payload.gst_percentage)
    .fetch_one(&db_pool)
    .await
    .map_err(|e| map_constraint_violation(e, DUPLICATE_NAME))?;

    Ok((StatusCode::CREATED, Json(product)))
}

// PUT /products/{id}
// A rate or unit change is written to the change log in the same transaction.
#[instrument(skip_all, fields(product_id = %id))]
pub async fn update_product(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<Json<Product>, AppError> {
    auth.require_manager("update products")?;
    if let Some(name) = payload.product_name.as_deref() {
        require_text(name, "Product name")?;
        require_max_len(Some(name), 100, "Product name")?;
    }
    require_max_len(payload.hsn_code.as_deref(), 10, "HSN code")?;
    if let Some(rate) = payload.sales_rate {
        require_positive(rate, "Sales rate")?;
    }
    if let Some(gst) = payload.gst_percentage {
        validate_gst(gst)?;
    }

    let mut tx = db_pool.begin().await?;

    let current = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 AND pump_master_id = $2 FOR UPDATE"
    ))
    .bind(id)
    .bind(auth.pump_master_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::not_found("Product not found"))?;

    let new_unit = payload.sales_unit.unwrap_or(current.sales_unit);
    let new_rate = payload.sales_rate.unwrap_or(current.sales_rate);

    let updated = sqlx::query_as::<_, Product>(&format!(
        "UPDATE products SET
            product_name = COALESCE($1, product_name),
            product_type = COALESCE($2, product_type),
            hsn_code = COALESCE($3, hsn_code),
            sales_unit = $4,
            sales_rate = $5,
            gst_percentage = COALESCE($6, gst_percentage),
            is_active = COALESCE($7, is_active),
            updated_at = NOW()
         WHERE id = $8
         RETURNING {PRODUCT_COLUMNS}"
    ))
    .bind(payload.product_name.map(|n| n.trim().to_string()))
    .bind(payload.product_type)
    .bind(clean(payload.hsn_code))
    .bind(new_unit)
    .bind(new_rate)
    .bind(payload.gst_percentage)
    .bind(payload.is_active)
    .bind(id)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| map_constraint_violation(e, DUPLICATE_NAME))?;

    if new_unit != current.sales_unit || new_rate != current.sales_rate {
        sqlx::query(
            "INSERT INTO product_sales_unit_change_logs
                (pump_master_id, product_id, old_sales_unit, new_sales_unit,
                 old_sales_rate, new_sales_rate, changed_by, remarks)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(auth.pump_master_id)
        .bind(id)
        .bind(current.sales_unit)
        .bind(new_unit)
        .bind(current.sales_rate)
        .bind(new_rate)
        .bind(auth.user_id)
        .bind(clean(payload.change_remarks))
        .execute(&mut *tx)
        .await?;

        info!(
            old_rate = current.sales_rate,
            new_rate,
            "Product rate or unit changed"
        );
    }

    tx.commit().await?;

    Ok(Json(updated))
}

// DELETE /products/{id}
pub async fn delete_product(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    auth.require_manager("delete products")?;

    let result = sqlx::query("DELETE FROM products WHERE id = $1 AND pump_master_id = $2")
        .bind(id)
        .bind(auth.pump_master_id)
        .execute(&db_pool)
        .await
        .map_err(|e| map_still_referenced(e, "Product is in use; deactivate it instead"))?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Product not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}

// GET /product-sales-unit-change-logs?productId=
pub async fn list_change_logs(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ChangeLogQuery>,
) -> Result<Json<Vec<ProductSalesUnitChangeLog>>, AppError> {
    let logs = sqlx::query_as::<_, ProductSalesUnitChangeLog>(
        "SELECT l.id, l.product_id, p.product_name,
                l.old_sales_unit, l.new_sales_unit,
                l.old_sales_rate::FLOAT8 AS old_sales_rate,
                l.new_sales_rate::FLOAT8 AS new_sales_rate,
                l.changed_by, u.username AS changed_by_username,
                l.remarks, l.changed_at
         FROM product_sales_unit_change_logs l
         JOIN products p ON p.id = l.product_id
         LEFT JOIN users u ON u.id = l.changed_by
         WHERE l.pump_master_id = $1
           AND ($2::UUID IS NULL OR l.product_id = $2)
         ORDER BY l.changed_at DESC",
    )
    .bind(auth.pump_master_id)
    .bind(query.product_id)
    .fetch_all(&db_pool)
    .await?;

    Ok(Json(logs))
}
