use sqlx::FromRow;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::shift::ShiftStatus;

#[derive(Debug, Clone, FromRow)]
pub struct SalesmanNozzleShift {
    pub id: Uuid,
    pub salesman_id: Uuid,
    pub salesman_name: String,
    pub nozzle_id: Uuid,
    pub nozzle_name: String,
    pub product_id: Uuid,
    pub product_name: String,
    pub start_datetime: DateTime<Utc>,
    pub end_datetime: Option<DateTime<Utc>>,
    pub opening_reading: f64,
    pub closing_reading: Option<f64>,
    pub product_rate: f64,
    pub status: ShiftStatus,
    pub accounting_done: bool,
    pub created_at: DateTime<Utc>,
}

pub const SHIFT_SELECT: &str = "SELECT sh.id, sh.salesman_id, u.full_name AS salesman_name,
        sh.nozzle_id, n.nozzle_name, sh.product_id, p.product_name,
        sh.start_datetime, sh.end_datetime,
        sh.opening_reading::FLOAT8  AS opening_reading,
        sh.closing_reading::FLOAT8  AS closing_reading,
        sh.product_rate::FLOAT8     AS product_rate,
        sh.status, sh.accounting_done, sh.created_at
     FROM salesman_nozzle_shifts sh
     JOIN users u ON u.id = sh.salesman_id
     JOIN nozzles n ON n.id = sh.nozzle_id
     JOIN products p ON p.id = sh.product_id";
