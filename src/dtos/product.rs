use serde::Deserialize;
use uuid::Uuid;

use crate::models::product::{ProductType, SalesUnit};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub product_name: String,
    pub product_type: ProductType,
    pub hsn_code: Option<String>,
    pub sales_unit: SalesUnit,
    pub sales_rate: f64,
    #[serde(default)]
    pub gst_percentage: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub product_name: Option<String>,
    pub product_type: Option<ProductType>,
    pub hsn_code: Option<String>,
    pub sales_unit: Option<SalesUnit>,
    pub sales_rate: Option<f64>,
    pub gst_percentage: Option<f64>,
    pub is_active: Option<bool>,
    /// Stored on the change log when the rate or unit changes.
    pub change_remarks: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeLogQuery {
    pub product_id: Option<Uuid>,
}
