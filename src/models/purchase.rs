use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "purchase_payment_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PurchasePaymentType {
    Cash,
    Credit,
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    pub id: Uuid,
    pub supplier_id: Uuid,
    pub supplier_name: String,
    pub product_id: Uuid,
    pub product_name: String,
    pub tank_id: Option<Uuid>,
    pub invoice_number: String,
    pub purchase_date: NaiveDate,
    pub quantity: f64,
    pub purchase_rate: f64,
    pub amount: f64,
    pub tax_amount: f64,
    pub payment_type: PurchasePaymentType,
    pub remarks: Option<String>,
    pub created_at: DateTime<Utc>,
}

pub const PURCHASE_SELECT: &str = "SELECT pu.id, pu.supplier_id, s.supplier_name,
        pu.product_id, p.product_name, pu.tank_id, pu.invoice_number, pu.purchase_date,
        pu.quantity::FLOAT8       AS quantity,
        pu.purchase_rate::FLOAT8  AS purchase_rate,
        pu.amount::FLOAT8         AS amount,
        pu.tax_amount::FLOAT8     AS tax_amount,
        pu.payment_type, pu.remarks, pu.created_at
     FROM purchases pu
     JOIN suppliers s ON s.id = pu.supplier_id
     JOIN products p ON p.id = pu.product_id";
