//! Customer field validation
//!
//! Each check returns an explanation the lead agent can relay to the user.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

static CIVIL_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{12}$").expect("valid regex"));

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$")
        .expect("valid regex")
});

/// E.164 allows at most 15 digits; anything under 8 cannot be a real subscriber number
const PHONE_DIGITS: std::ops::RangeInclusive<usize> = 8..=15;

/// A rejected field, worded for the agent
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct FieldError(pub String);

/// Check an international phone number such as `+1-202-555-0134`
pub fn validate_phone_number(number: &str) -> Result<(), FieldError> {
    let Some(rest) = number.strip_prefix('+') else {
        return Err(FieldError(
            "The phone number must include the country code (e.g., +1 for the US). Please provide the correct format."
                .to_string(),
        ));
    };

    let digits: String = rest.chars().filter(|c| *c != '-' && *c != ' ').collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(FieldError(
            "The phone number contains invalid characters. Ensure that it only contains digits, spaces, or hyphens after the country code."
                .to_string(),
        ));
    }

    if !PHONE_DIGITS.contains(&digits.len()) {
        return Err(FieldError(format!(
            "The phone number '{}' is not valid. Please double-check the number and try again.",
            number
        )));
    }

    Ok(())
}

/// Check a 12-digit civil ID
pub fn validate_civil_id(civil_id: &str) -> Result<(), FieldError> {
    if CIVIL_ID.is_match(civil_id) {
        Ok(())
    } else {
        Err(FieldError(format!(
            "The Civil ID '{}' is invalid. A valid Civil ID should contain exactly 12 digits with no other characters.",
            civil_id
        )))
    }
}

/// Check the shape of an email address
pub fn validate_email_address(email: &str) -> Result<(), FieldError> {
    if EMAIL.is_match(email) {
        Ok(())
    } else {
        Err(FieldError(format!(
            "The email address '{}' is invalid. Please verify and provide a correct email address format.",
            email
        )))
    }
}

/// Validate every supplied field, phone first, then civil ID, then email.
/// The first failure wins.
pub fn validate_customer_info(
    phone: Option<&str>,
    civil_id: Option<&str>,
    email: Option<&str>,
) -> Result<(), FieldError> {
    if let Some(phone) = phone {
        validate_phone_number(phone)?;
    }
    if let Some(civil_id) = civil_id {
        validate_civil_id(civil_id)?;
    }
    if let Some(email) = email {
        validate_email_address(email)?;
    }
    Ok(())
}

/// Canonical storage form of a phone number: `+` followed by digits only
pub fn normalize_phone(number: &str) -> String {
    let digits: String = number.chars().filter(|c| c.is_ascii_digit()).collect();
    format!("+{}", digits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_rules() {
        assert!(validate_phone_number("+1-202-555-0134").is_ok());
        assert!(validate_phone_number("+91 8124832683").is_ok());

        let missing_code = validate_phone_number("2025550134").unwrap_err();
        assert!(missing_code.0.contains("country code"));

        let letters = validate_phone_number("+1-202-CALL-NOW").unwrap_err();
        assert!(letters.0.contains("invalid characters"));

        let short = validate_phone_number("+123").unwrap_err();
        assert!(short.0.contains("is not valid"));
    }

    #[test]
    fn test_civil_id_rules() {
        assert!(validate_civil_id("123456789012").is_ok());
        assert!(validate_civil_id("12345678901").is_err());
        assert!(validate_civil_id("12345678901a").is_err());
    }

    #[test]
    fn test_email_rules() {
        assert!(validate_email_address("john@x.com").is_ok());
        assert!(validate_email_address("chandruganeshan@gmail.com").is_ok());
        assert!(validate_email_address("john@").is_err());
        assert!(validate_email_address("john.x.com").is_err());
    }

    #[test]
    fn test_first_failure_wins() {
        let err = validate_customer_info(Some("12345"), Some("bad"), Some("bad")).unwrap_err();
        assert!(err.0.contains("country code"));

        let err = validate_customer_info(None, Some("bad"), Some("bad")).unwrap_err();
        assert!(err.0.contains("Civil ID"));
    }

    #[test]
    fn test_normalize_phone() {
        assert_eq!(normalize_phone("+1-202-555 0134"), "+12025550134");
    }
}
