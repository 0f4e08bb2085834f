use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerRequest {
    pub customer_name: String,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    pub gst_number: Option<String>,
    pub pan_number: Option<String>,
    #[serde(default)]
    pub credit_limit: f64,
    #[serde(default)]
    pub opening_balance: f64,
    pub opening_balance_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomerRequest {
    pub customer_name: Option<String>,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    pub gst_number: Option<String>,
    pub pan_number: Option<String>,
    pub credit_limit: Option<f64>,
    pub opening_balance: Option<f64>,
    pub opening_balance_date: Option<NaiveDate>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerOutstandingResponse {
    pub customer_id: Uuid,
    pub customer_name: String,
    pub opening_balance: f64,
    pub total_billed: f64,
    pub total_paid: f64,
    pub outstanding: f64,
    pub credit_limit: f64,
    /// `None` when no credit limit is configured.
    pub available_credit: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerLedgerResponse {
    pub customer_id: Uuid,
    pub customer_name: String,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    #[serde(flatten)]
    pub ledger: crate::domain::ledger::Ledger,
}
