//! Recipient phone-number normalization.
//!
//! Queue records carry numbers as entered at the front desk: with spaces,
//! dashes, a leading `+`, with or without the country code. The gateway
//! wants a bare `digits@c.us` chat id.

use std::sync::LazyLock;

use regex::Regex;

use courier_common::error::CourierError;

static VALID_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{2,4}\d{10}$").expect("valid phone pattern")
});

/// Normalize a raw phone number into a gateway chat id.
///
/// Strips every non-digit, prefixes bare 10-digit numbers with the default
/// country code `91`, and requires country code + 10 digits overall.
/// A number that cannot be normalized will never self-correct, so the
/// error is a validation failure rather than a transient one.
pub fn normalize(raw: &str) -> Result<String, CourierError> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

    let digits = if digits.len() == 10 {
        format!("91{digits}")
    } else {
        digits
    };

    if !VALID_NUMBER.is_match(&digits) {
        return Err(CourierError::InvalidRecipient(format!(
            "expected country code + 10 digits, got {raw:?}"
        )));
    }

    Ok(format!("{digits}@c.us"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ten_digits_get_country_prefix() {
        assert_eq!(normalize("9876543210").unwrap(), "919876543210@c.us");
    }

    #[test]
    fn test_formatted_number_is_stripped() {
        assert_eq!(normalize("+91 98765-43210").unwrap(), "919876543210@c.us");
    }

    #[test]
    fn test_full_international_number_passes() {
        assert_eq!(normalize("4479460735351").unwrap(), "4479460735351@c.us");
    }

    #[test]
    fn test_short_number_rejected() {
        assert!(normalize("12345").is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(normalize("not-a-number").is_err());
    }
}
