use serde::Serialize;
use sqlx::FromRow;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use super::bill::PaymentMethod;

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: Uuid,
    pub expense_date: NaiveDate,
    pub expense_category: String,
    pub amount: f64,
    pub description: Option<String>,
    pub salesman_nozzle_shift_id: Option<Uuid>,
    pub bank_account_id: Option<Uuid>,
    pub payment_method: PaymentMethod,
    pub receipt_file_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

pub const EXPENSE_COLUMNS: &str = "id, expense_date, expense_category,
        amount::FLOAT8 AS amount,
        description, salesman_nozzle_shift_id, bank_account_id, payment_method,
        receipt_file_id, created_at";
