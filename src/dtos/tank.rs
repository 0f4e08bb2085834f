use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::tank::TankStock;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTankRequest {
    pub tank_name: String,
    pub product_id: Uuid,
    pub capacity: f64,
    #[serde(default)]
    pub opening_level: f64,
    pub opening_level_date: NaiveDate,
    #[serde(default)]
    pub low_level_alert: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTankRequest {
    pub tank_name: Option<String>,
    pub capacity: Option<f64>,
    pub opening_level: Option<f64>,
    pub opening_level_date: Option<NaiveDate>,
    pub low_level_alert: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TankBalanceResponse {
    pub tank_id: Uuid,
    pub tank_name: String,
    pub product_name: String,
    pub capacity: f64,
    pub since: NaiveDate,
    #[serde(flatten)]
    pub stock: TankStock,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNozzleRequest {
    pub nozzle_name: String,
    pub tank_id: Uuid,
    #[serde(default)]
    pub current_reading: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNozzleRequest {
    pub nozzle_name: Option<String>,
    pub tank_id: Option<Uuid>,
    pub current_reading: Option<f64>,
    pub is_active: Option<bool>,
}
