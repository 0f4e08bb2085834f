use serde::Serialize;
use sqlx::FromRow;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub id: Uuid,
    pub supplier_name: String,
    pub contact_person: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub gst_number: Option<String>,
    pub created_at: DateTime<Utc>,
}

pub const SUPPLIER_COLUMNS: &str =
    "id, supplier_name, contact_person, phone_number, email, address, gst_number, created_at";
