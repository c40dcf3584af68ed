use std::sync::LazyLock;

use chrono::{NaiveDate, Utc};
use regex::Regex;

use crate::models::{AuthError, RegisterRequest};

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 128;

static EMAIL_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok());

static USERNAME_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.]{3,30}$").ok());

static PHONE_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9]{8,15}$").ok());

fn matches_pattern(pattern: &LazyLock<Option<Regex>>, value: &str) -> bool {
    pattern.as_ref().is_some_and(|re| re.is_match(value))
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn validate_email(email: &str) -> Result<(), AuthError> {
    if !matches_pattern(&EMAIL_RE, email) {
        return Err(AuthError::Validation("email is not a valid address".to_string()));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), AuthError> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LEN {
        return Err(AuthError::Validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    if len > MAX_PASSWORD_LEN {
        return Err(AuthError::Validation(format!(
            "password must be at most {} characters",
            MAX_PASSWORD_LEN
        )));
    }
    Ok(())
}

fn validate_birth_date(date: NaiveDate) -> Result<(), AuthError> {
    if date >= Utc::now().date_naive() {
        return Err(AuthError::Validation("date_of_birth must be in the past".to_string()));
    }
    Ok(())
}

pub fn validate_register_request(request: &RegisterRequest) -> Result<(), AuthError> {
    if !matches_pattern(&USERNAME_RE, request.username.trim()) {
        return Err(AuthError::Validation(
            "username must be 3-30 letters, digits, dots or underscores".to_string(),
        ));
    }
    validate_email(&normalize_email(&request.email))?;
    validate_password(&request.password)?;

    if request.full_name.trim().is_empty() {
        return Err(AuthError::Validation("full_name is required".to_string()));
    }
    if !matches_pattern(&PHONE_RE, request.phone_number.trim()) {
        return Err(AuthError::Validation("phone_number is not valid".to_string()));
    }

    validate_birth_date(request.date_of_birth)
}
