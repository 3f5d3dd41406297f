// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;

/// Longest accepted person name.
pub const MAX_NAME_LENGTH: usize = 150;

/// Longest accepted city or district.
pub const MAX_PLACE_LENGTH: usize = 100;

/// Longest accepted email address.
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Validates a first or last name.
///
/// A name starts with an ASCII letter, is 2 to 150 characters long, and
/// contains only letters, spaces, apostrophes and hyphens.
///
/// # Arguments
///
/// * `field` - Label used in the error message (e.g. "first name")
/// * `value` - The raw input
///
/// # Returns
///
/// The trimmed name.
///
/// # Errors
///
/// Returns `DomainError::InvalidName` if the name does not follow the rule.
pub fn validate_person_name(field: &str, value: &str) -> Result<String, DomainError> {
    let trimmed: &str = value.trim();
    let length: usize = trimmed.chars().count();

    if length < 2 || length > MAX_NAME_LENGTH {
        return Err(DomainError::InvalidName(format!(
            "{field} must be between 2 and {MAX_NAME_LENGTH} characters"
        )));
    }

    let mut chars = trimmed.chars();
    if !chars.next().is_some_and(|c| c.is_ascii_alphabetic()) {
        return Err(DomainError::InvalidName(format!(
            "{field} must start with a letter"
        )));
    }

    if !chars.all(|c| c.is_ascii_alphabetic() || matches!(c, ' ' | '\'' | '-')) {
        return Err(DomainError::InvalidName(format!(
            "{field} may only contain letters, spaces, apostrophes and hyphens"
        )));
    }

    Ok(trimmed.to_string())
}

/// Normalises an email address to lower case and checks its shape.
///
/// # Errors
///
/// Returns `DomainError::InvalidEmail` if the address has no single `@`,
/// an empty local part, a domain without a dot, or whitespace.
pub fn normalize_email(value: &str) -> Result<String, DomainError> {
    let email: String = value.trim().to_lowercase();

    if email.is_empty() || email.len() > MAX_EMAIL_LENGTH {
        return Err(DomainError::InvalidEmail(String::from(
            "email must be between 1 and 254 characters",
        )));
    }

    if email.chars().any(char::is_whitespace) {
        return Err(DomainError::InvalidEmail(String::from(
            "email cannot contain whitespace",
        )));
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(DomainError::InvalidEmail(format!("'{email}' has no '@'")));
    };

    if local.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
    {
        return Err(DomainError::InvalidEmail(format!(
            "'{email}' is not a valid address"
        )));
    }

    Ok(email)
}

/// Validates an optional phone number: an optional `+` then 7 to 15 digits.
///
/// Empty input means no phone number.
///
/// # Errors
///
/// Returns `DomainError::InvalidPhone` if a non-empty value is malformed.
pub fn validate_phone(value: &str) -> Result<Option<String>, DomainError> {
    let trimmed: &str = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let digits: &str = trimmed.strip_prefix('+').unwrap_or(trimmed);
    if !(7..=15).contains(&digits.len()) || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DomainError::InvalidPhone(String::from(
            "phone must be 7 to 15 digits, optionally starting with '+'",
        )));
    }

    Ok(Some(trimmed.to_string()))
}

/// Validates a city name.
///
/// # Errors
///
/// Returns `DomainError::InvalidCity` if the city is empty or too long.
pub fn validate_city(value: &str) -> Result<String, DomainError> {
    let trimmed: &str = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::InvalidCity(String::from(
            "city cannot be empty",
        )));
    }
    if trimmed.chars().count() > MAX_PLACE_LENGTH {
        return Err(DomainError::InvalidCity(format!(
            "city must be at most {MAX_PLACE_LENGTH} characters"
        )));
    }
    Ok(trimmed.to_string())
}
