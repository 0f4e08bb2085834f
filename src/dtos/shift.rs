use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::shift::{dispensed_quantity, fuel_sales_amount, ShiftStatus};
use crate::models::shift::SalesmanNozzleShift;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenShiftRequest {
    /// Defaults to the caller when a salesman opens their own shift.
    pub salesman_id: Option<Uuid>,
    pub nozzle_id: Uuid,
    /// Defaults to the nozzle's current meter reading.
    pub opening_reading: Option<f64>,
    pub start_datetime: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseShiftRequest {
    pub closing_reading: f64,
    pub end_datetime: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub salesman_id: Option<Uuid>,
    pub status: Option<ShiftStatus>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftResponse {
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
    pub dispensed_quantity: Option<f64>,
    pub fuel_sales: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl From<SalesmanNozzleShift> for ShiftResponse {
    fn from(shift: SalesmanNozzleShift) -> Self {
        let dispensed = shift
            .closing_reading
            .and_then(|closing| dispensed_quantity(shift.opening_reading, closing).ok());
        Self {
            id: shift.id,
            salesman_id: shift.salesman_id,
            salesman_name: shift.salesman_name,
            nozzle_id: shift.nozzle_id,
            nozzle_name: shift.nozzle_name,
            product_id: shift.product_id,
            product_name: shift.product_name,
            start_datetime: shift.start_datetime,
            end_datetime: shift.end_datetime,
            opening_reading: shift.opening_reading,
            closing_reading: shift.closing_reading,
            product_rate: shift.product_rate,
            status: shift.status,
            accounting_done: shift.accounting_done,
            dispensed_quantity: dispensed,
            fuel_sales: dispensed.map(|q| fuel_sales_amount(q, shift.product_rate)),
            created_at: shift.created_at,
        }
    }
}
