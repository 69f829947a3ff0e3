//! Validation utilities.

use crate::BmmError;
use validator::{Validate, ValidationErrors};

/// Extension trait for validation.
pub trait ValidateExt: Validate {
    /// Validates the struct and returns a `BmmError` on failure.
    fn validate_request(&self) -> Result<(), BmmError> {
        self.validate().map_err(validation_errors_to_bmm_error)
    }
}

impl<T: Validate> ValidateExt for T {}

/// Converts `validator::ValidationErrors` to `BmmError`.
///
/// Field messages are sorted by field name so the resulting text is stable.
#[must_use]
pub fn validation_errors_to_bmm_error(errors: ValidationErrors) -> BmmError {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| {
                let message = error
                    .message
                    .as_ref()
                    .map_or_else(|| error.code.to_string(), ToString::to_string);
                format!("{field}: {message}")
            })
        })
        .collect();
    messages.sort();

    BmmError::Validation(messages.join("; "))
}

impl From<ValidationErrors> for BmmError {
    fn from(errors: ValidationErrors) -> Self {
        validation_errors_to_bmm_error(errors)
    }
}

/// Common validation functions.
pub mod rules {
    use std::net::IpAddr;
    use validator::ValidationError;

    /// Validates that a string is not blank (not empty after trimming).
    pub fn not_blank(value: &str) -> Result<(), ValidationError> {
        if value.trim().is_empty() {
            return Err(ValidationError::new("not_blank"));
        }
        Ok(())
    }

    /// Validates a colon separated MAC-48 address, e.g. `00:1a:2b:3c:4d:5e`.
    pub fn mac_address(value: &str) -> Result<(), ValidationError> {
        let octets: Vec<&str> = value.split(':').collect();
        let valid = octets.len() == 6
            && octets
                .iter()
                .all(|o| o.len() == 2 && o.chars().all(|c| c.is_ascii_hexdigit()));
        if !valid {
            return Err(ValidationError::new("mac_address_invalid"));
        }
        Ok(())
    }

    /// Validates an IPv4 or IPv6 address.
    pub fn ip_address(value: &str) -> Result<(), ValidationError> {
        value
            .parse::<IpAddr>()
            .map(|_| ())
            .map_err(|_| ValidationError::new("ip_address_invalid"))
    }

    /// Validates every entry of an IP address list.
    pub fn ip_addresses(values: &[String]) -> Result<(), ValidationError> {
        values.iter().try_for_each(|v| ip_address(v))
    }
}
