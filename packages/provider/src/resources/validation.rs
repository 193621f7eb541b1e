//! Field validators shared by the resource mappers.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ProviderError;

/// Pragmatic email check: one `@`, no whitespace, a dotted domain.
static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap_or_else(|_| unreachable!())
});

/// Absolute http(s) URL with a host.
static HTTP_URL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://[A-Za-z0-9.-]+(:[0-9]{1,5})?(/[^\s]*)?$").unwrap_or_else(|_| unreachable!())
});

pub fn non_empty(field: &str, value: &str) -> Result<(), ProviderError> {
    if value.trim().is_empty() {
        return Err(ProviderError::validation(format!("{} must not be empty", field)));
    }
    Ok(())
}

pub fn email(field: &str, value: &str) -> Result<(), ProviderError> {
    if !EMAIL_REGEX.is_match(value) {
        return Err(ProviderError::validation(format!(
            "{} must be an email address, got '{}'",
            field, value
        )));
    }
    Ok(())
}

pub fn http_url(field: &str, value: &str) -> Result<(), ProviderError> {
    if !HTTP_URL_REGEX.is_match(value) {
        return Err(ProviderError::validation(format!(
            "{} must be an http or https URL, got '{}'",
            field, value
        )));
    }
    Ok(())
}

pub fn positive(field: &str, value: i64) -> Result<(), ProviderError> {
    if value <= 0 {
        return Err(ProviderError::validation(format!(
            "{} must be greater than zero",
            field
        )));
    }
    Ok(())
}
