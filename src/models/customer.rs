use serde::Serialize;
use sqlx::FromRow;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    pub customer_name: String,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    pub gst_number: Option<String>,
    pub pan_number: Option<String>,
    pub credit_limit: f64,
    pub opening_balance: f64,
    pub opening_balance_date: Option<NaiveDate>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

pub const CUSTOMER_COLUMNS: &str = "id, customer_name, address, phone_number, gst_number, pan_number,
        credit_limit::FLOAT8     AS credit_limit,
        opening_balance::FLOAT8  AS opening_balance,
        opening_balance_date, is_active, created_at";
