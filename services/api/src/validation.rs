//! Input validation for the registration boundary.
//!
//! Every validator returns a field-qualified message so the caller can
//! surface it next to the offending input.

use regex::Regex;
use std::sync::OnceLock;

/// Validate email format and length.
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("email: is required".to_string());
    }

    if email.len() > 254 {
        return Err("email: must be at most 254 characters long".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("email: invalid format".to_string());
    }

    Ok(())
}

/// Validate password length bounds.
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("password: is required".to_string());
    }

    if password.len() < 8 {
        return Err("password: must be at least 8 characters long".to_string());
    }

    if password.len() > 128 {
        return Err("password: must be at most 128 characters long".to_string());
    }

    Ok(())
}

/// Validate a college identifier (student or faculty number).
pub fn validate_college_id(college_id: &str) -> Result<(), String> {
    if college_id.is_empty() {
        return Err("collegeId: is required".to_string());
    }

    if college_id.len() > 16 {
        return Err("collegeId: must be at most 16 characters long".to_string());
    }

    static COLLEGE_ID_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = COLLEGE_ID_REGEX.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9-]+$").expect("Failed to compile college id regex")
    });

    if !regex.is_match(college_id) {
        return Err("collegeId: may only contain letters, digits and dashes".to_string());
    }

    Ok(())
}

/// Require a non-empty value for the named field.
pub fn validate_required(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field}: is required"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_email() {
        assert!(validate_email("emma@college.edu").is_ok());
        assert!(validate_email("first.last+tag@sub.domain.org").is_ok());
    }

    #[test]
    fn rejects_malformed_email() {
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("missing@tld").is_err());
    }

    #[test]
    fn password_length_bounds() {
        assert!(validate_password("longenough").is_ok());
        assert!(validate_password("short").is_err());
        assert!(validate_password(&"x".repeat(129)).is_err());
    }

    #[test]
    fn college_id_shape() {
        assert!(validate_college_id("STU001").is_ok());
        assert!(validate_college_id("FAC-01").is_ok());
        assert!(validate_college_id("").is_err());
        assert!(validate_college_id("has spaces").is_err());
    }

    #[test]
    fn required_fields() {
        assert!(validate_required("firstName", "Emma").is_ok());
        assert_eq!(
            validate_required("firstName", "  ").unwrap_err(),
            "firstName: is required"
        );
    }
}
