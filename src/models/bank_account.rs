use serde::Serialize;
use sqlx::FromRow;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BankAccount {
    pub id: Uuid,
    pub account_holder_name: String,
    pub account_number: String,
    pub bank_name: String,
    pub ifsc_code: String,
    pub branch_name: Option<String>,
    pub opening_balance: f64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

pub const BANK_ACCOUNT_COLUMNS: &str = "id, account_holder_name, account_number, bank_name,
        ifsc_code, branch_name,
        opening_balance::FLOAT8 AS opening_balance,
        is_active, created_at";
