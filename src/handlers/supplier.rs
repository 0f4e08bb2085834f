use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use crate::dtos::common::{clean, require_max_len, require_text};
use crate::dtos::supplier::{CreateSupplierRequest, UpdateSupplierRequest};
use crate::error::{map_constraint_violation, map_still_referenced, AppError};
use crate::middleware::auth::AuthContext;
use crate::models::supplier::{Supplier, SUPPLIER_COLUMNS};
use crate::state::AppState;

const DUPLICATE_NAME: &str = "Supplier name already exists";

pub async fn list_suppliers(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<Supplier>>, AppError> {
    let suppliers = sqlx::query_as::<_, Supplier>(&format!(
        "SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE pump_master_id = $1 ORDER BY supplier_name"
    ))
    .bind(auth.pump_master_id)
    .fetch_all(&db_pool)
    .await?;

    Ok(Json(suppliers))
}

pub async fn get_supplier(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Supplier>, AppError> {
    let supplier = sqlx::query_as::<_, Supplier>(&format!(
        "SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE id = $1 AND pump_master_id = $2"
    ))
    .bind(id)
    .bind(auth.pump_master_id)
    .fetch_optional(&db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Supplier not found"))?;

    Ok(Json(supplier))
}

pub async fn create_supplier(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<CreateSupplierRequest>,
) -> Result<(StatusCode, Json<Supplier>), AppError> {
    auth.require_manager("create suppliers")?;
    require_text(&payload.supplier_name, "Supplier name")?;
    require_max_len(Some(&payload.supplier_name), 100, "Supplier name")?;
    require_max_len(payload.gst_number.as_deref(), 15, "GST number")?;

    let supplier = sqlx::query_as::<_, Supplier>(&format!(
        "INSERT INTO suppliers
            (pump_master_id, supplier_name, contact_person, phone_number, email, address, gst_number)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING {SUPPLIER_COLUMNS}"
    ))
    .bind(auth.pump_master_id)
    .bind(payload.supplier_name.trim())
    .bind(clean(payload.contact_person))
    .bind(clean(payload.phone_number))
    .bind(clean(payload.email))
    .bind(clean(payload.address))
    .bind(clean(payload.gst_number).map(|g| g.to_uppercase()))
    .fetch_one(&db_pool)
    .await
    .map_err(|e| map_constraint_violation(e, DUPLICATE_NAME))?;

    Ok((StatusCode::CREATED, Json(supplier)))
}

pub async fn update_supplier(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSupplierRequest>,
) -> Result<Json<Supplier>, AppError> {
    auth.require_manager("update suppliers")?;
    if let Some(name) = payload.supplier_name.as_deref() {
        require_text(name, "Supplier name")?;
        require_max_len(Some(name), 100, "Supplier name")?;
    }
    require_max_len(payload.gst_number.as_deref(), 15, "GST number")?;

    let supplier = sqlx::query_as::<_, Supplier>(&format!(
        "UPDATE suppliers SET
            supplier_name = COALESCE($1, supplier_name),
            contact_person = COALESCE($2, contact_person),
            phone_number = COALESCE($3, phone_number),
            email = COALESCE($4, email),
            address = COALESCE($5, address),
            gst_number = COALESCE($6, gst_number)
         WHERE id = $7 AND pump_master_id = $8
         RETURNING {SUPPLIER_COLUMNS}"
    ))
    .bind(payload.supplier_name.map(|n| n.trim().to_string()))
    .bind(clean(payload.contact_person))
    .bind(clean(payload.phone_number))
    .bind(clean(payload.email))
    .bind(clean(payload.address))
    .bind(clean(payload.gst_number).map(|g| g.to_uppercase()))
    .bind(id)
    .bind(auth.pump_master_id)
    .fetch_optional(&db_pool)
    .await
    .map_err(|e| map_constraint_violation(e, DUPLICATE_NAME))?
    .ok_or_else(|| AppError::not_found("Supplier not found"))?;

    Ok(Json(supplier))
}

pub async fn delete_supplier(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    auth.require_manager("delete suppliers")?;

    let result = sqlx::query("DELETE FROM suppliers WHERE id = $1 AND pump_master_id = $2")
        .bind(id)
        .bind(auth.pump_master_id)
        .execute(&db_pool)
        .await
        .map_err(|e| map_still_referenced(e, "Supplier has purchases and cannot be deleted"))?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Supplier not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}
