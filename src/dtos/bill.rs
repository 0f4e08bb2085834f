use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::models::bill::PaymentMethod;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBillRequest {
    /// Defaults to today.
    pub bill_date: Option<NaiveDate>,
    pub customer_id: Uuid,
    pub salesman_nozzle_shift_id: Uuid,
    /// Either quantity or amount must be given; the other follows from the shift rate.
    pub quantity: Option<f64>,
    pub amount: Option<f64>,
    pub vehicle_no: Option<String>,
    pub driver_name: Option<String>,
    pub meter_image_id: Option<Uuid>,
    pub vehicle_image_id: Option<Uuid>,
    pub remarks: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBillRequest {
    pub vehicle_no: Option<String>,
    pub driver_name: Option<String>,
    pub meter_image_id: Option<Uuid>,
    pub vehicle_image_id: Option<Uuid>,
    pub remarks: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub customer_id: Option<Uuid>,
    pub shift_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    pub customer_id: Uuid,
    pub salesman_nozzle_shift_id: Option<Uuid>,
    pub bank_account_id: Option<Uuid>,
    /// Defaults to today.
    pub payment_date: Option<NaiveDate>,
    pub amount: f64,
    pub payment_method: PaymentMethod,
    pub reference_number: Option<String>,
    pub remarks: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePaymentRequest {
    pub bank_account_id: Option<Uuid>,
    pub payment_date: Option<NaiveDate>,
    pub amount: Option<f64>,
    pub payment_method: Option<PaymentMethod>,
    pub reference_number: Option<String>,
    pub remarks: Option<String>,
}

/// Resolves quantity and amount from whichever the salesman typed.
pub fn resolve_quantity_and_amount(
    quantity: Option<f64>,
    amount: Option<f64>,
    rate: f64,
) -> Result<(f64, f64), &'static str> {
    use crate::domain::{round2, round3};

    if rate <= 0.0 {
        return Err("Product rate must be greater than 0");
    }
    match (quantity, amount) {
        (Some(q), _) if q > 0.0 => Ok((round3(q), round2(q * rate))),
        (None, Some(a)) if a > 0.0 => Ok((round3(a / rate), round2(a))),
        (Some(_), _) => Err("Quantity must be greater than 0"),
        (None, Some(_)) => Err("Amount must be greater than 0"),
        (None, None) => Err("Either quantity or amount is required"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantity_drives_amount() {
        assert_eq!(resolve_quantity_and_amount(Some(40.0), None, 101.5), Ok((40.0, 4_060.0)));
    }

    #[test]
    fn amount_drives_quantity() {
        assert_eq!(resolve_quantity_and_amount(None, Some(2_000.0), 100.0), Ok((20.0, 2_000.0)));
    }

    #[test]
    fn quantity_wins_when_both_are_sent() {
        let (q, a) = resolve_quantity_and_amount(Some(10.0), Some(5.0), 100.0).unwrap();
        assert_eq!((q, a), (10.0, 1_000.0));
    }

    #[test]
    fn missing_or_non_positive_inputs_fail() {
        assert!(resolve_quantity_and_amount(None, None, 100.0).is_err());
        assert!(resolve_quantity_and_amount(Some(0.0), None, 100.0).is_err());
        assert!(resolve_quantity_and_amount(None, Some(-5.0), 100.0).is_err());
        assert!(resolve_quantity_and_amount(Some(1.0), None, 0.0).is_err());
    }
}
