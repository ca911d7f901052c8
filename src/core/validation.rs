use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::AppError;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

pub fn normalize_non_empty(input: Option<String>) -> Option<String> {
    input.and_then(|v| normalize_non_empty_str(&v))
}

pub fn normalize_non_empty_str(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn require_non_empty(input: Option<&str>, message: &str) -> Result<String, AppError> {
    input
        .and_then(normalize_non_empty_str)
        .ok_or_else(|| AppError::validation(message))
}

pub fn validate_email(email: &str) -> Result<String, AppError> {
    let trimmed = email.trim();
    if EMAIL_RE.is_match(trimmed) {
        Ok(trimmed.to_lowercase())
    } else {
        Err(AppError::validation("Invalid email address"))
    }
}

pub fn validate_priority(priority: i64) -> Result<i64, AppError> {
    if (1..=5).contains(&priority) {
        Ok(priority)
    } else {
        Err(AppError::validation("Priority must be between 1 and 5"))
    }
}
