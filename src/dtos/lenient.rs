//! Form-friendly number parsing for request bodies.
//!
//! The dashboard posts whatever is in its input boxes: numbers, numeric
//! strings, empty strings or `null`. Blank always means zero.

use serde::de::{self, Deserializer, Visitor};
use std::fmt;

/// Money amount: number, numeric string, `""` or `null` (the latter two read as 0).
pub fn amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(AmountVisitor)
}

/// Denomination count: like [`amount`] but whole numbers only, negatives clamp to 0.
pub fn count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(CountVisitor)
}

struct AmountVisitor;

impl<'de> Visitor<'de> for AmountVisitor {
    type Value = f64;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a number, a numeric string, an empty string or null")
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
        if v.is_finite() {
            Ok(v)
        } else {
            Err(E::custom("amount must be a finite number"))
        }
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
        Ok(v as f64)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
        Ok(v as f64)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            return Ok(0.0);
        }
        trimmed
            .parse::<f64>()
            .map_err(|_| E::custom(format!("invalid amount '{trimmed}'")))
            .and_then(|n| self.visit_f64(n))
    }

    fn visit_unit<E: de::Error>(self) -> Result<f64, E> {
        Ok(0.0)
    }

    fn visit_none<E: de::Error>(self) -> Result<f64, E> {
        Ok(0.0)
    }
}

struct CountVisitor;

impl<'de> Visitor<'de> for CountVisitor {
    type Value = u32;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a whole number, a numeric string, an empty string or null")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<u32, E> {
        Ok(v.clamp(0, u32::MAX as i64) as u32)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<u32, E> {
        Ok(v.min(u32::MAX as u64) as u32)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<u32, E> {
        if !v.is_finite() || v.fract() != 0.0 {
            return Err(E::custom("count must be a whole number"));
        }
        Ok(v.clamp(0.0, u32::MAX as f64) as u32)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<u32, E> {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            return Ok(0);
        }
        match trimmed.parse::<f64>() {
            Ok(n) => self.visit_f64(n),
            Err(_) => Err(E::custom(format!("invalid count '{trimmed}'"))),
        }
    }

    fn visit_unit<E: de::Error>(self) -> Result<u32, E> {
        Ok(0)
    }

    fn visit_none<E: de::Error>(self) -> Result<u32, E> {
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Form {
        #[serde(default, deserialize_with = "super::amount")]
        amount: f64,
        #[serde(default, deserialize_with = "super::count")]
        count: u32,
    }

    fn parse(json: &str) -> Form {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn blank_null_and_missing_read_as_zero() {
        for json in [
            r#"{"amount": "", "count": ""}"#,
            r#"{"amount": null, "count": null}"#,
            r#"{}"#,
            r#"{"amount": "   ", "count": " "}"#,
        ] {
            let form = parse(json);
            assert_eq!(form.amount, 0.0, "{json}");
            assert_eq!(form.count, 0, "{json}");
        }
    }

    #[test]
    fn numeric_strings_are_accepted() {
        let form = parse(r#"{"amount": "250.75", "count": "12"}"#);
        assert_eq!(form.amount, 250.75);
        assert_eq!(form.count, 12);
    }

    #[test]
    fn negative_counts_clamp_to_zero() {
        assert_eq!(parse(r#"{"count": -4}"#).count, 0);
        assert_eq!(parse(r#"{"count": "-4"}"#).count, 0);
    }

    #[test]
    fn whole_floats_count_but_fractions_do_not() {
        assert_eq!(parse(r#"{"count": 3.0}"#).count, 3);
        assert_eq!(parse(r#"{"count": "3.0"}"#).count, 3);
        assert_eq!(parse(r#"{"count": " 12.00 "}"#).count, 12);
        assert!(serde_json::from_str::<Form>(r#"{"count": 2.5}"#).is_err());
        assert!(serde_json::from_str::<Form>(r#"{"count": "2.5"}"#).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(serde_json::from_str::<Form>(r#"{"amount": "abc"}"#).is_err());
        assert!(serde_json::from_str::<Form>(r#"{"count": "ten"}"#).is_err());
        assert!(serde_json::from_str::<Form>(r#"{"count": "NaN"}"#).is_err());
    }
}
