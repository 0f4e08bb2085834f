//! Nozzle meter arithmetic for a salesman's shift.

use serde::{Deserialize, Serialize};

use super::{round2, round3};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "shift_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShiftStatus {
    Open,
    Active,
    Closed,
}

impl ShiftStatus {
    /// OPEN and ACTIVE both mean the salesman is still dispensing.
    pub fn is_running(self) -> bool {
        !matches!(self, ShiftStatus::Closed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MeterError {
    NegativeReading,
    ClosingBelowOpening { opening: f64, closing: f64 },
}

impl std::fmt::Display for MeterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MeterError::NegativeReading => f.write_str("Meter readings cannot be negative"),
            MeterError::ClosingBelowOpening { opening, closing } => write!(
                f,
                "Closing reading ({closing}) cannot be less than opening reading ({opening})"
            ),
        }
    }
}

/// Litres dispensed between two meter readings.
pub fn dispensed_quantity(opening_reading: f64, closing_reading: f64) -> Result<f64, MeterError> {
    if opening_reading < 0.0 || closing_reading < 0.0 {
        return Err(MeterError::NegativeReading);
    }
    if closing_reading < opening_reading {
        return Err(MeterError::ClosingBelowOpening {
            opening: opening_reading,
            closing: closing_reading,
        });
    }
    Ok(round3(closing_reading - opening_reading))
}

pub fn fuel_sales_amount(dispensed: f64, product_rate: f64) -> f64 {
    round2(dispensed * product_rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispensed_is_reading_difference() {
        assert_eq!(dispensed_quantity(12_000.5, 12_350.75).unwrap(), 350.25);
        assert_eq!(dispensed_quantity(100.0, 100.0).unwrap(), 0.0);
    }

    #[test]
    fn closing_below_opening_is_rejected() {
        let err = dispensed_quantity(500.0, 499.9).unwrap_err();
        assert_eq!(
            err,
            MeterError::ClosingBelowOpening {
                opening: 500.0,
                closing: 499.9
            }
        );
        assert!(err.to_string().contains("cannot be less than"));
    }

    #[test]
    fn negative_readings_are_rejected() {
        assert_eq!(dispensed_quantity(-1.0, 5.0), Err(MeterError::NegativeReading));
    }

    #[test]
    fn sales_amount_rounds_to_paise() {
        assert_eq!(fuel_sales_amount(350.25, 102.63), 35_946.16);
    }

    #[test]
    fn only_closed_shifts_stop_running() {
        assert!(ShiftStatus::Open.is_running());
        assert!(ShiftStatus::Active.is_running());
        assert!(!ShiftStatus::Closed.is_running());
    }

    #[test]
    fn status_uses_screaming_case_on_the_wire() {
        assert_eq!(serde_json::to_string(&ShiftStatus::Closed).unwrap(), "\"CLOSED\"");
        let parsed: ShiftStatus = serde_json::from_str("\"ACTIVE\"").unwrap();
        assert_eq!(parsed, ShiftStatus::Active);
    }
}
