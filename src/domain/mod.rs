//! Pure business calculations. Handlers load the inputs, these decide the numbers.

pub mod ledger;
pub mod payroll;
pub mod profit;
pub mod shift;
pub mod shift_accounting;
pub mod tank;

/// Rounds a money amount to paise.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Rounds a volume to millilitres.
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_helpers() {
        assert_eq!(round2(10.005_1), 10.01);
        assert_eq!(round2(-3.334), -3.33);
        assert_eq!(round3(1.234_56), 1.235);
    }
}
