use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBankAccountRequest {
    pub account_holder_name: String,
    pub account_number: String,
    pub bank_name: String,
    pub ifsc_code: String,
    pub branch_name: Option<String>,
    #[serde(default)]
    pub opening_balance: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBankAccountRequest {
    pub account_holder_name: Option<String>,
    pub bank_name: Option<String>,
    pub ifsc_code: Option<String>,
    pub branch_name: Option<String>,
    pub opening_balance: Option<f64>,
    pub is_active: Option<bool>,
}

/// Indian Financial System Code: 4 letters, a zero, then 6 alphanumerics.
pub fn is_valid_ifsc(code: &str) -> bool {
    let bytes = code.as_bytes();
    bytes.len() == 11
        && bytes[..4].iter().all(|b| b.is_ascii_uppercase())
        && bytes[4] == b'0'
        && bytes[5..].iter().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::is_valid_ifsc;

    #[test]
    fn ifsc_shape() {
        assert!(is_valid_ifsc("SBIN0001234"));
        assert!(is_valid_ifsc("HDFC0ABC123"));
        assert!(!is_valid_ifsc("SBIN1001234"));
        assert!(!is_valid_ifsc("sbin0001234"));
        assert!(!is_valid_ifsc("SBIN000123"));
    }
}
