//! Input validation utilities
//!
//! All validation happens at the service layer before any store write;
//! the repositories trust their callers.

use regex::Regex;
use std::sync::OnceLock;

/// Validate username
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("Username is required".to_string());
    }

    if username.len() < 3 {
        return Err("Username must be at least 3 characters".to_string());
    }

    if username.len() > 32 {
        return Err("Username must be at most 32 characters".to_string());
    }

    static USERNAME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = USERNAME_REGEX
        .get_or_init(|| Regex::new(r"^[a-zA-Z0-9_]+$").expect("Failed to compile username regex"));

    if !regex.is_match(username) {
        return Err("Username can only contain letters, numbers, and underscores".to_string());
    }

    Ok(())
}

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email must be at most 254 characters".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    if password.len() < 6 {
        return Err("Password must be at least 6 characters".to_string());
    }

    if password.len() > 128 {
        return Err("Password must be at most 128 characters".to_string());
    }

    Ok(())
}

/// Validate a timer preset's name and time fields
///
/// The error names the offending field and its allowed range.
pub fn validate_preset(name: &str, hours: i64, minutes: i64, seconds: i64) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Preset name is required".to_string());
    }

    if !(0..=23).contains(&hours) {
        return Err("Hours must be between 0 and 23".to_string());
    }

    if !(0..=59).contains(&minutes) {
        return Err("Minutes must be between 0 and 59".to_string());
    }

    if !(0..=59).contains(&seconds) {
        return Err("Seconds must be between 0 and 59".to_string());
    }

    Ok(())
}
