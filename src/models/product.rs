use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "product_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductType {
    Fuel,
    General,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "sales_unit", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SalesUnit {
    Litre,
    Piece,
    Kilogram,
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub product_name: String,
    pub product_type: ProductType,
    pub hsn_code: Option<String>,
    pub sales_unit: SalesUnit,
    pub sales_rate: f64,
    pub gst_percentage: f64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const PRODUCT_COLUMNS: &str = "id, product_name, product_type, hsn_code, sales_unit,
        sales_rate::FLOAT8      AS sales_rate,
        gst_percentage::FLOAT8  AS gst_percentage,
        is_active, created_at, updated_at";

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSalesUnitChangeLog {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub old_sales_unit: SalesUnit,
    pub new_sales_unit: SalesUnit,
    pub old_sales_rate: f64,
    pub new_sales_rate: f64,
    pub changed_by: Option<Uuid>,
    pub changed_by_username: Option<String>,
    pub remarks: Option<String>,
    pub changed_at: DateTime<Utc>,
}
