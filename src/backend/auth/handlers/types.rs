/**
 * Authentication Handler Types
 *
 * Request bodies for the `/api/auth` endpoints and their validation rules.
 * Response bodies are the service types (`Registration`, `LoginResult`,
 * `UserProfile`) wrapped in the envelope.
 */

use serde::Deserialize;

use crate::shared::error::{FieldErrors, SharedError, Validate};

/// Usernames are 3-30 chars, start with a letter, and contain only letters,
/// numbers and underscores
pub fn is_valid_username(username: &str) -> bool {
    if username.len() < 3 || username.len() > 30 {
        return false;
    }

    let mut chars = username.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn check_password(errors: &mut FieldErrors, field: &str, password: &str) {
    if errors.min_length(field, password, 8) && password.len() > 72 {
        errors.push(field, format!("{} must be at most 72 bytes", field));
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct RegisterRequest {
    pub username: String,
    pub fullname: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), SharedError> {
        let mut errors = FieldErrors::new();
        if !is_valid_username(self.username.trim()) {
            errors.push(
                "username",
                "username must be 3-30 chars, start with a letter, and contain only letters, numbers, and underscores",
            );
        }
        if errors.required("fullname", &self.fullname) {
            errors.length("fullname", self.fullname.trim(), 1, 100);
        }
        if errors.required("email", &self.email) {
            errors.email("email", self.email.trim());
        }
        check_password(&mut errors, "password", &self.password);
        if let Some(phone) = self.phone.as_deref().filter(|p| !p.trim().is_empty()) {
            errors.phone("phone", phone.trim());
        }
        errors.into_result()
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct VerifyOtpRequest {
    /// Verification token returned by registration
    pub token: String,
    pub otp: String,
}

impl Validate for VerifyOtpRequest {
    fn validate(&self) -> Result<(), SharedError> {
        let mut errors = FieldErrors::new();
        errors.required("token", &self.token);
        if errors.required("otp", &self.otp) && !self.otp.trim().chars().all(|c| c.is_ascii_digit()) {
            errors.push("otp", "otp must contain only digits");
        }
        errors.into_result()
    }
}

/// Exactly one of `email` or `token` must identify the account
#[derive(Deserialize, Debug, Clone, Default)]
pub struct ResendOtpRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

impl Validate for ResendOtpRequest {
    fn validate(&self) -> Result<(), SharedError> {
        let mut errors = FieldErrors::new();
        if let Some(email) = self.email.as_deref().filter(|e| !e.trim().is_empty()) {
            errors.email("email", email.trim());
        }
        errors.into_result()
    }
}

/// Email or phone, plus password
#[derive(Deserialize, Debug, Clone)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub password: String,
}

impl LoginRequest {
    pub fn identifier(&self) -> Option<&str> {
        fn present(value: &Option<String>) -> Option<&str> {
            value.as_deref().map(str::trim).filter(|v| !v.is_empty())
        }
        present(&self.email).or_else(|| present(&self.phone))
    }
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), SharedError> {
        let mut errors = FieldErrors::new();
        if self.identifier().is_none() {
            errors.push("email", "email or phone is required");
        }
        errors.required("password", &self.password);
        errors.into_result()
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct ResetPasswordRequest {
    pub email: String,
}

impl Validate for ResetPasswordRequest {
    fn validate(&self) -> Result<(), SharedError> {
        let mut errors = FieldErrors::new();
        if errors.required("email", &self.email) {
            errors.email("email", self.email.trim());
        }
        errors.into_result()
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct UpdatePasswordRequest {
    /// Reset token from the emailed link, or a session token
    pub token: String,
    pub password: String,
    pub confirm_password: String,
}

impl Validate for UpdatePasswordRequest {
    fn validate(&self) -> Result<(), SharedError> {
        let mut errors = FieldErrors::new();
        errors.required("token", &self.token);
        check_password(&mut errors, "password", &self.password);
        errors.required("confirm_password", &self.confirm_password);
        errors.into_result()
    }
}
