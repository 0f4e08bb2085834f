use serde::Serialize;
use sqlx::FromRow;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tank {
    pub id: Uuid,
    pub tank_name: String,
    pub product_id: Uuid,
    pub product_name: String,
    pub capacity: f64,
    pub opening_level: f64,
    pub opening_level_date: NaiveDate,
    pub low_level_alert: f64,
    pub created_at: DateTime<Utc>,
}

pub const TANK_SELECT: &str = "SELECT t.id, t.tank_name, t.product_id, p.product_name,
        t.capacity::FLOAT8         AS capacity,
        t.opening_level::FLOAT8    AS opening_level,
        t.opening_level_date,
        t.low_level_alert::FLOAT8  AS low_level_alert,
        t.created_at
     FROM tanks t
     JOIN products p ON p.id = t.product_id";

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Nozzle {
    pub id: Uuid,
    pub nozzle_name: String,
    pub tank_id: Uuid,
    pub tank_name: String,
    pub product_id: Uuid,
    pub product_name: String,
    pub current_reading: f64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

pub const NOZZLE_SELECT: &str = "SELECT n.id, n.nozzle_name, n.tank_id, t.tank_name,
        t.product_id, p.product_name,
        n.current_reading::FLOAT8 AS current_reading,
        n.is_active, n.created_at
     FROM nozzles n
     JOIN tanks t ON t.id = n.tank_id
     JOIN products p ON p.id = t.product_id";
