use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_method", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Upi,
    Card,
    Cheque,
    BankTransfer,
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesmanBill {
    pub id: Uuid,
    pub bill_no: i64,
    pub bill_date: NaiveDate,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub product_id: Uuid,
    pub product_name: String,
    pub salesman_nozzle_shift_id: Uuid,
    pub quantity: f64,
    pub rate: f64,
    pub amount: f64,
    pub vehicle_no: Option<String>,
    pub driver_name: Option<String>,
    pub meter_image_id: Option<Uuid>,
    pub vehicle_image_id: Option<Uuid>,
    pub remarks: Option<String>,
    pub created_at: DateTime<Utc>,
}

pub const BILL_SELECT: &str = "SELECT b.id, b.bill_no, b.bill_date,
        b.customer_id, c.customer_name, b.product_id, p.product_name,
        b.salesman_nozzle_shift_id,
        b.quantity::FLOAT8  AS quantity,
        b.rate::FLOAT8      AS rate,
        b.amount::FLOAT8    AS amount,
        b.vehicle_no, b.driver_name, b.meter_image_id, b.vehicle_image_id,
        b.remarks, b.created_at
     FROM salesman_bills b
     JOIN customers c ON c.id = b.customer_id
     JOIN products p ON p.id = b.product_id";

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesmanBillPayment {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub salesman_nozzle_shift_id: Option<Uuid>,
    pub bank_account_id: Option<Uuid>,
    pub payment_date: NaiveDate,
    pub amount: f64,
    pub payment_method: PaymentMethod,
    pub reference_number: Option<String>,
    pub remarks: Option<String>,
    pub created_at: DateTime<Utc>,
}

pub const PAYMENT_SELECT: &str = "SELECT sp.id, sp.customer_id, c.customer_name,
        sp.salesman_nozzle_shift_id, sp.bank_account_id, sp.payment_date,
        sp.amount::FLOAT8 AS amount,
        sp.payment_method, sp.reference_number, sp.remarks, sp.created_at
     FROM salesman_bill_payments sp
     JOIN customers c ON c.id = sp.customer_id";
