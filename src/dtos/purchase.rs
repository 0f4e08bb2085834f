use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::models::purchase::PurchasePaymentType;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePurchaseRequest {
    pub supplier_id: Uuid,
    pub product_id: Uuid,
    pub tank_id: Option<Uuid>,
    pub invoice_number: String,
    pub purchase_date: NaiveDate,
    pub quantity: f64,
    pub purchase_rate: f64,
    #[serde(default)]
    pub tax_amount: f64,
    pub payment_type: PurchasePaymentType,
    pub remarks: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePurchaseRequest {
    pub invoice_number: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub quantity: Option<f64>,
    pub purchase_rate: Option<f64>,
    pub tax_amount: Option<f64>,
    pub payment_type: Option<PurchasePaymentType>,
    pub remarks: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub supplier_id: Option<Uuid>,
}
