use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::AppError;

/// `?from=YYYY-MM-DD&to=YYYY-MM-DD`; both ends inclusive and optional.
#[derive(Debug, Default, Clone, Copy, Deserialize)]
pub struct DateRangeQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRangeQuery {
    pub fn validate(&self) -> Result<(), AppError> {
        match (self.from, self.to) {
            (Some(from), Some(to)) if from > to => Err(AppError::validation(
                "'from' date must not be after 'to' date",
            )),
            _ => Ok(()),
        }
    }

    /// Both ends, for reports that need a closed window.
    pub fn require_both(&self) -> Result<(NaiveDate, NaiveDate), AppError> {
        self.validate()?;
        match (self.from, self.to) {
            (Some(from), Some(to)) => Ok((from, to)),
            _ => Err(AppError::validation("Both 'from' and 'to' dates are required")),
        }
    }
}

pub fn require_text(value: &str, field: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} is required")));
    }
    Ok(())
}

pub fn require_max_len(value: Option<&str>, max: usize, field: &str) -> Result<(), AppError> {
    match value {
        Some(v) if v.chars().count() > max => Err(AppError::validation(format!(
            "{field} must be at most {max} characters"
        ))),
        _ => Ok(()),
    }
}

pub fn require_non_negative(value: f64, field: &str) -> Result<(), AppError> {
    if !value.is_finite() || value < 0.0 {
        return Err(AppError::validation(format!("{field} cannot be negative")));
    }
    Ok(())
}

pub fn require_positive(value: f64, field: &str) -> Result<(), AppError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(AppError::validation(format!("{field} must be greater than 0")));
    }
    Ok(())
}

/// Trims optional text and turns blank strings into `None`.
pub fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    #[test]
    fn inverted_range_is_rejected() {
        let range = DateRangeQuery { from: Some(date(10)), to: Some(date(1)) };
        assert!(range.validate().is_err());
    }

    #[test]
    fn open_ended_range_is_fine_until_both_required() {
        let range = DateRangeQuery { from: Some(date(1)), to: None };
        assert!(range.validate().is_ok());
        assert!(range.require_both().is_err());
    }

    #[test]
    fn query_string_dates_parse() {
        let range: DateRangeQuery =
            serde_json::from_str(r#"{"from": "2024-06-01", "to": "2024-06-30"}"#).unwrap();
        assert_eq!(range.require_both().unwrap(), (date(1), date(30)));
    }

    #[test]
    fn field_checks() {
        assert!(require_text("  ", "Customer name").is_err());
        assert!(require_max_len(Some("abcdef"), 5, "Code").is_err());
        assert!(require_max_len(None, 5, "Code").is_ok());
        assert!(require_non_negative(-0.01, "Rate").is_err());
        assert!(require_positive(0.0, "Quantity").is_err());
        assert!(require_positive(f64::NAN, "Quantity").is_err());
        assert_eq!(clean(Some("  KA-01 ".into())), Some("KA-01".to_string()));
        assert_eq!(clean(Some("   ".into())), None);
    }
}
