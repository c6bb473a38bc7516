use crate::errors::{AppError, AppResult};
use crate::models::NewCoi;
use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

pub const MISSING_REQUIRED_MESSAGE: &str = "Please fill in all required fields marked with *";
pub const INVALID_EMAIL_MESSAGE: &str = "Please enter a valid email address";

pub fn is_valid_email(raw: &str) -> bool {
    EMAIL_PATTERN.is_match(raw)
}

/// Checks a create form before it reaches the store.
pub fn validate_new_coi(form: &NewCoi) -> AppResult<()> {
    if form.property.is_empty() || form.tenant_name.is_empty() || form.tenant_email.is_empty() {
        return Err(AppError::Validation(MISSING_REQUIRED_MESSAGE.to_string()));
    }
    if !is_valid_email(&form.tenant_email) {
        return Err(AppError::Validation(INVALID_EMAIL_MESSAGE.to_string()));
    }
    Ok(())
}
