//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::dao::calendar::{parse_date, parse_time};

const HOLDER_MAX_LEN: usize = 64;

fn error(code: &'static str, message: impl Into<String>) -> ValidationError {
    let message: String = message.into();
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// Validates a URL slug: lowercase ASCII letters, digits and single inner hyphens.
///
/// ```ignore
/// validate_slug("cgv-vincom")  // Ok
/// validate_slug("CGV")         // Err - uppercase
/// validate_slug("-vincom")     // Err - leading hyphen
/// ```
pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    if slug.is_empty() || slug.len() > 100 {
        return Err(error("slug_length", "Slug must be 1 to 100 characters"));
    }
    let valid_chars = slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if !valid_chars || slug.starts_with('-') || slug.ends_with('-') || slug.contains("--") {
        return Err(error(
            "slug_format",
            "Slug must contain lowercase letters, digits and single inner hyphens",
        ));
    }
    Ok(())
}

/// Validates the checkout holder identifier that owns seat locks.
pub fn validate_holder(holder: &str) -> Result<(), ValidationError> {
    if holder.is_empty() || holder.len() > HOLDER_MAX_LEN {
        return Err(error(
            "holder_length",
            format!("Holder must be 1 to {HOLDER_MAX_LEN} characters (got {})", holder.len()),
        ));
    }
    if !holder
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@'))
    {
        return Err(error(
            "holder_format",
            "Holder may only contain ASCII letters, digits, `-`, `_`, `.` and `@`",
        ));
    }
    Ok(())
}

/// Validates a `YYYY-MM-DD` date string.
pub fn validate_date(value: &str) -> Result<(), ValidationError> {
    parse_date(value)
        .map(|_| ())
        .map_err(|_| error("date_format", "Date must use the YYYY-MM-DD format"))
}

/// Validates an `HH:MM` time string.
pub fn validate_clock_time(value: &str) -> Result<(), ValidationError> {
    parse_time(value)
        .map(|_| ())
        .map_err(|_| error("time_format", "Time must use the 24-hour HH:MM format"))
}

/// Rejects strings made only of whitespace.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(error("blank", "Value must not be blank"));
    }
    Ok(())
}
