use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::lenient;
use super::common::require_non_negative;
use crate::domain::shift_accounting::{
    CashPosition, CollectedAmounts, DenominationCounts, SystemTotals,
};
use crate::error::AppError;
use crate::models::accounting::SalesmanShiftAccounting;

/// Largest amount a `NUMERIC(14, 2)` column holds.
pub const MAX_STORED_AMOUNT: f64 = 999_999_999_999.99;

/// Denomination counts as the `INTEGER` columns store them, highest note first.
pub fn stored_counts(denominations: &DenominationCounts) -> Result<[i32; 11], AppError> {
    let mut stored = [0i32; 11];
    for (slot, (value, count)) in stored.iter_mut().zip(denominations.pairs()) {
        *slot = i32::try_from(count)
            .map_err(|_| AppError::validation(format!("Count of {value} notes/coins is too large")))?;
    }
    Ok(stored)
}

fn require_storable(value: f64, field: &str) -> Result<(), AppError> {
    if value > MAX_STORED_AMOUNT {
        return Err(AppError::validation(format!("{field} is too large")));
    }
    Ok(())
}

/// What the salesman hands over: digital receipts and the counted drawer.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectedInput {
    #[serde(default, deserialize_with = "lenient::amount")]
    pub upi_received: f64,
    #[serde(default, deserialize_with = "lenient::amount")]
    pub card_received: f64,
    #[serde(default)]
    pub denominations: DenominationCounts,
}

impl CollectedInput {
    pub fn validate(&self) -> Result<CollectedAmounts, AppError> {
        require_non_negative(self.upi_received, "UPI received")?;
        require_non_negative(self.card_received, "Card received")?;
        stored_counts(&self.denominations)?;
        let cash_in_hand = self.denominations.cash_in_hand() as f64;
        require_storable(self.upi_received, "UPI received")?;
        require_storable(self.card_received, "Card received")?;
        require_storable(cash_in_hand, "Cash in hand")?;
        require_storable(cash_in_hand + self.upi_received + self.card_received, "Total received")?;
        Ok(CollectedAmounts {
            upi_received: self.upi_received,
            card_received: self.card_received,
            denominations: self.denominations,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountingRequest {
    pub salesman_nozzle_shift_id: Uuid,
    #[serde(flatten)]
    pub collected: CollectedInput,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemTotalsResponse {
    pub salesman_nozzle_shift_id: Uuid,
    pub salesman_name: String,
    pub nozzle_name: String,
    pub dispensed_quantity: f64,
    pub product_rate: f64,
    #[serde(flatten)]
    pub totals: SystemTotals,
    pub expected_cash: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountingResponse {
    pub id: Uuid,
    pub salesman_nozzle_shift_id: Uuid,
    pub fuel_sales: f64,
    pub customer_receipt: f64,
    pub credit: f64,
    pub expenses: f64,
    pub upi_received: f64,
    pub card_received: f64,
    pub denominations: DenominationCounts,
    pub cash_in_hand: f64,
    pub total_received: f64,
    pub expected_cash: f64,
    pub balance_amount: f64,
    pub cash_position: CashPosition,
    pub is_finalized: bool,
    pub finalized_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<SalesmanShiftAccounting> for AccountingResponse {
    fn from(row: SalesmanShiftAccounting) -> Self {
        let denominations = row.denominations();
        Self {
            id: row.id,
            salesman_nozzle_shift_id: row.salesman_nozzle_shift_id,
            fuel_sales: row.fuel_sales,
            customer_receipt: row.customer_receipt,
            credit: row.credit,
            expenses: row.expenses,
            upi_received: row.upi_received,
            card_received: row.card_received,
            denominations,
            cash_in_hand: row.cash_in_hand,
            total_received: row.total_received,
            expected_cash: row.expected_cash,
            balance_amount: row.balance_amount,
            cash_position: CashPosition::from_balance(row.balance_amount),
            is_finalized: row.is_finalized,
            finalized_at: row.finalized_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_reads_blank_form_fields_as_zero() {
        let req: CreateAccountingRequest = serde_json::from_str(
            r#"{
                "salesmanNozzleShiftId": "6f1c1f1e-8b7a-4d2c-9a55-0c3d2f3b4a11",
                "upiReceived": "",
                "cardReceived": null,
                "denominations": {"notes500": "2", "notes100": 3, "coins2": ""}
            }"#,
        )
        .unwrap();

        let collected = req.collected.validate().unwrap();
        assert_eq!(collected.upi_received, 0.0);
        assert_eq!(collected.card_received, 0.0);
        assert_eq!(collected.denominations.cash_in_hand(), 1300);
    }

    #[test]
    fn missing_denominations_default_to_empty_drawer() {
        let input: CollectedInput = serde_json::from_str(r#"{"upiReceived": 150}"#).unwrap();
        assert_eq!(input.denominations, DenominationCounts::default());
        assert_eq!(input.validate().unwrap().upi_received, 150.0);
    }

    #[test]
    fn negative_digital_receipts_are_rejected() {
        let input: CollectedInput = serde_json::from_str(r#"{"cardReceived": "-10"}"#).unwrap();
        assert!(matches!(input.validate(), Err(AppError::ValidationError(_))));
    }

    #[test]
    fn counts_beyond_the_integer_column_are_rejected() {
        let input: CollectedInput =
            serde_json::from_str(r#"{"denominations": {"coins1": 3000000000}}"#).unwrap();
        assert_eq!(input.denominations.coins_1, 3_000_000_000);
        assert!(matches!(input.validate(), Err(AppError::ValidationError(_))));
        assert!(stored_counts(&input.denominations).is_err());
    }

    #[test]
    fn drawer_worth_more_than_the_amount_column_is_rejected() {
        // each count fits an INTEGER but 2000 x 600M does not fit NUMERIC(14, 2)
        let input: CollectedInput =
            serde_json::from_str(r#"{"denominations": {"notes2000": 600000000}}"#).unwrap();
        assert!(matches!(input.validate(), Err(AppError::ValidationError(_))));

        let input: CollectedInput =
            serde_json::from_str(r#"{"upiReceived": 999999999999, "cardReceived": 5}"#).unwrap();
        assert!(matches!(input.validate(), Err(AppError::ValidationError(_))));
    }

    #[test]
    fn stored_counts_follow_denomination_order() {
        let input: CollectedInput =
            serde_json::from_str(r#"{"denominations": {"notes2000": 1, "coins1": 7}}"#).unwrap();
        let stored = stored_counts(&input.denominations).unwrap();
        assert_eq!(stored[0], 1);
        assert_eq!(stored[10], 7);
        assert_eq!(stored.iter().sum::<i32>(), 8);
    }
}
