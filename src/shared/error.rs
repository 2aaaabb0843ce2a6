//! Shared Error Types
//!
//! This module defines the error types that do not depend on the HTTP layer.
//! Request validation produces a list of [`FieldError`]s that the backend
//! returns verbatim in the `errors` member of the response envelope.
//!
//! # Usage
//!
//! ```rust
//! use tourfleet::shared::error::FieldErrors;
//!
//! let mut errors = FieldErrors::new();
//! errors.required("email", "");
//! assert!(errors.into_result().is_err());
//! ```
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single failed validation rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Name of the offending field as it appears in the request body
    pub field: String,
    /// Human-readable error message
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Shared error types
#[derive(Debug, Error, Clone)]
pub enum SharedError {
    /// JSON serialization or deserialization error
    #[error("Serialization error: {message}")]
    SerializationError {
        /// Human-readable error message
        message: String,
    },

    /// One or more fields failed validation
    #[error("Validation failed for {} field(s)", errors.len())]
    ValidationError {
        /// Every failed rule, in declaration order
        errors: Vec<FieldError>,
    },
}

impl SharedError {
    /// Create a new serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
        }
    }

    /// Create a validation error for a single field
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            errors: vec![FieldError::new(field, message)],
        }
    }
}

impl From<serde_json::Error> for SharedError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(format!("JSON error: {}", err))
    }
}

/// Collects field errors while a request struct is checked
#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: Vec<FieldError>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    /// Fails when the trimmed value is empty.
    pub fn required(&mut self, field: &str, value: &str) -> bool {
        if value.trim().is_empty() {
            self.push(field, format!("{} is required", field));
            return false;
        }
        true
    }

    pub fn length(&mut self, field: &str, value: &str, min: usize, max: usize) -> bool {
        let len = value.chars().count();
        if len < min || len > max {
            self.push(
                field,
                format!("{} must be between {} and {} characters", field, min, max),
            );
            return false;
        }
        true
    }

    pub fn min_length(&mut self, field: &str, value: &str, min: usize) -> bool {
        if value.chars().count() < min {
            self.push(field, format!("{} must be at least {} characters", field, min));
            return false;
        }
        true
    }

    pub fn email(&mut self, field: &str, value: &str) -> bool {
        if !is_valid_email(value) {
            self.push(field, format!("{} must be a valid email address", field));
            return false;
        }
        true
    }

    pub fn phone(&mut self, field: &str, value: &str) -> bool {
        if !is_valid_phone(value) {
            self.push(field, format!("{} must be a valid phone number", field));
            return false;
        }
        true
    }

    pub fn positive(&mut self, field: &str, value: i64) -> bool {
        if value <= 0 {
            self.push(field, format!("{} must be greater than zero", field));
            return false;
        }
        true
    }

    pub fn non_negative(&mut self, field: &str, value: i64) -> bool {
        if value < 0 {
            self.push(field, format!("{} must not be negative", field));
            return false;
        }
        true
    }

    pub fn one_of(&mut self, field: &str, value: &str, allowed: &[&str]) -> bool {
        if !allowed.contains(&value) {
            self.push(
                field,
                format!("{} must be one of: {}", field, allowed.join(", ")),
            );
            return false;
        }
        true
    }

    pub fn date(&mut self, field: &str, value: &str) -> bool {
        if chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d").is_err() {
            self.push(field, format!("{} must be a date formatted YYYY-MM-DD", field));
            return false;
        }
        true
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_result(self) -> Result<(), SharedError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(SharedError::ValidationError {
                errors: self.errors,
            })
        }
    }
}

/// Basic structural email check: one `@`, non-empty local part, dotted domain.
pub fn is_valid_email(value: &str) -> bool {
    let mut parts = value.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    !local.is_empty()
        && !value.chars().any(char::is_whitespace)
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

/// Digits with an optional leading `+`, 8 to 15 digits long.
pub fn is_valid_phone(value: &str) -> bool {
    let digits = value.strip_prefix('+').unwrap_or(value);
    (8..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
}

/// Validation of a deserialized request body
pub trait Validate {
    fn validate(&self) -> Result<(), SharedError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialization_error() {
        let error = SharedError::serialization("Invalid JSON");
        match error {
            SharedError::SerializationError { message } => {
                assert_eq!(message, "Invalid JSON");
            }
            _ => panic!("Expected SerializationError"),
        }
    }

    #[test]
    fn test_validation_error_single_field() {
        let error = SharedError::validation("email", "Invalid email format");
        match error {
            SharedError::ValidationError { errors } => {
                assert_eq!(errors, vec![FieldError::new("email", "Invalid email format")]);
            }
            _ => panic!("Expected ValidationError"),
        }
    }

    #[test]
    fn test_collector_keeps_every_failure() {
        let mut errors = FieldErrors::new();
        errors.required("username", "  ");
        errors.email("email", "not-an-email");
        errors.min_length("password", "abc", 6);
        errors.phone("phone", "0811222333");

        match errors.into_result() {
            Err(SharedError::ValidationError { errors }) => {
                let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["username", "email", "password"]);
            }
            other => panic!("Expected ValidationError, got {:?}", other),
        }
    }

    #[test]
    fn test_collector_ok_when_empty() {
        let mut errors = FieldErrors::new();
        errors.required("name", "Bali Trans");
        errors.one_of("role", "staff", &["admin", "staff"]);
        errors.date("date_of_birth", "1990-02-28");
        assert!(errors.into_result().is_ok());
    }

    #[test]
    fn test_email_rules() {
        assert!(is_valid_email("a@x.com"));
        assert!(!is_valid_email("a@x"));
        assert!(!is_valid_email("@x.com"));
        assert!(!is_valid_email("a@@x.com"));
        assert!(!is_valid_email("a b@x.com"));
    }

    #[test]
    fn test_phone_rules() {
        assert!(is_valid_phone("081122334455"));
        assert!(is_valid_phone("+6281122334455"));
        assert!(!is_valid_phone("0811-2233"));
        assert!(!is_valid_phone("1234"));
    }

    #[test]
    fn test_from_serde_error() {
        let result: Result<serde_json::Value, _> = serde_json::from_str("{ invalid json }");
        let shared_error: SharedError = result.unwrap_err().into();
        assert!(matches!(shared_error, SharedError::SerializationError { .. }));
    }
}
