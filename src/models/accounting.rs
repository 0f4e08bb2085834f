use sqlx::FromRow;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::shift_accounting::DenominationCounts;

#[derive(Debug, Clone, FromRow)]
pub struct SalesmanShiftAccounting {
    pub id: Uuid,
    pub salesman_nozzle_shift_id: Uuid,
    pub fuel_sales: f64,
    pub customer_receipt: f64,
    pub credit: f64,
    pub expenses: f64,
    pub upi_received: f64,
    pub card_received: f64,
    pub notes_2000: i32,
    pub notes_1000: i32,
    pub notes_500: i32,
    pub notes_200: i32,
    pub notes_100: i32,
    pub notes_50: i32,
    pub notes_20: i32,
    pub notes_10: i32,
    pub coins_5: i32,
    pub coins_2: i32,
    pub coins_1: i32,
    pub cash_in_hand: f64,
    pub total_received: f64,
    pub expected_cash: f64,
    pub balance_amount: f64,
    pub is_finalized: bool,
    pub finalized_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SalesmanShiftAccounting {
    pub fn denominations(&self) -> DenominationCounts {
        let count = |n: i32| n.max(0) as u32;
        DenominationCounts {
            notes_2000: count(self.notes_2000),
            notes_1000: count(self.notes_1000),
            notes_500: count(self.notes_500),
            notes_200: count(self.notes_200),
            notes_100: count(self.notes_100),
            notes_50: count(self.notes_50),
            notes_20: count(self.notes_20),
            notes_10: count(self.notes_10),
            coins_5: count(self.coins_5),
            coins_2: count(self.coins_2),
            coins_1: count(self.coins_1),
        }
    }
}

pub const ACCOUNTING_COLUMNS: &str = "id, salesman_nozzle_shift_id,
        fuel_sales::FLOAT8        AS fuel_sales,
        customer_receipt::FLOAT8  AS customer_receipt,
        credit::FLOAT8            AS credit,
        expenses::FLOAT8          AS expenses,
        upi_received::FLOAT8      AS upi_received,
        card_received::FLOAT8     AS card_received,
        notes_2000, notes_1000, notes_500, notes_200, notes_100, notes_50, notes_20, notes_10,
        coins_5, coins_2, coins_1,
        cash_in_hand::FLOAT8      AS cash_in_hand,
        total_received::FLOAT8    AS total_received,
        expected_cash::FLOAT8     AS expected_cash,
        balance_amount::FLOAT8    AS balance_amount,
        is_finalized, finalized_at, created_at, updated_at";
