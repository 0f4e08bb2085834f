use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::models::bill::PaymentMethod;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateExpenseRequest {
    /// Defaults to today.
    pub expense_date: Option<NaiveDate>,
    pub expense_category: String,
    pub amount: f64,
    pub description: Option<String>,
    pub salesman_nozzle_shift_id: Option<Uuid>,
    pub bank_account_id: Option<Uuid>,
    pub payment_method: Option<PaymentMethod>,
    pub receipt_file_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateExpenseRequest {
    pub expense_date: Option<NaiveDate>,
    pub expense_category: Option<String>,
    pub amount: Option<f64>,
    pub description: Option<String>,
    pub bank_account_id: Option<Uuid>,
    pub payment_method: Option<PaymentMethod>,
    pub receipt_file_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub shift_id: Option<Uuid>,
}
