//! Underground tank stock position.

use serde::Serialize;

use super::{round2, round3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TankMovements {
    pub opening_level: f64,
    pub received: f64,
    pub dispensed: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TankStock {
    pub opening_level: f64,
    pub received: f64,
    pub dispensed: f64,
    pub current_level: f64,
    pub fill_percentage: f64,
    pub is_low_level: bool,
}

pub fn tank_stock(movements: TankMovements, capacity: f64, low_level_alert: f64) -> TankStock {
    let current_level = round3(movements.opening_level + movements.received - movements.dispensed);
    let fill_percentage = if capacity > 0.0 {
        round2(current_level / capacity * 100.0)
    } else {
        0.0
    };

    TankStock {
        opening_level: round3(movements.opening_level),
        received: round3(movements.received),
        dispensed: round3(movements.dispensed),
        current_level,
        fill_percentage,
        is_low_level: current_level <= low_level_alert,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_is_opening_plus_received_minus_dispensed() {
        let stock = tank_stock(
            TankMovements {
                opening_level: 4_000.0,
                received: 12_000.0,
                dispensed: 9_500.5,
            },
            20_000.0,
            1_000.0,
        );
        assert_eq!(stock.current_level, 6_499.5);
        assert_eq!(stock.fill_percentage, 32.5);
        assert!(!stock.is_low_level);
    }

    #[test]
    fn low_level_flag_triggers_at_threshold() {
        let stock = tank_stock(
            TankMovements {
                opening_level: 1_500.0,
                received: 0.0,
                dispensed: 500.0,
            },
            10_000.0,
            1_000.0,
        );
        assert!(stock.is_low_level);
    }

    #[test]
    fn zero_capacity_reports_zero_fill() {
        let stock = tank_stock(
            TankMovements {
                opening_level: 10.0,
                received: 0.0,
                dispensed: 0.0,
            },
            0.0,
            0.0,
        );
        assert_eq!(stock.fill_percentage, 0.0);
    }
}
