/**
 * API Error Types
 *
 * Every failure a handler can return, with its HTTP status and the message
 * placed in the response envelope.
 *
 * | Variant | Status |
 * |---|---|
 * | `Validation` | 400, with a per-field `errors` list |
 * | `BadRequest`, `InvalidOtp` | 400 |
 * | `Unauthorized`, `InvalidCredentials`, `InvalidToken` | 401 |
 * | `Forbidden`, `AccountNotVerified` | 403 |
 * | `NotFound` | 404 |
 * | `Conflict` | 409 |
 * | `PayloadTooLarge` | 413 |
 * | `Internal` | 500, detail logged and replaced by a generic message |
 */

use axum::http::StatusCode;
use thiserror::Error;

use crate::shared::{FieldError, SharedError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation failed")]
    Validation(Vec<FieldError>),

    #[error("{0}")]
    BadRequest(String),

    #[error("invalid or expired OTP")]
    InvalidOtp,

    #[error("{0}")]
    Unauthorized(String),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("invalid or expired token")]
    InvalidToken,

    #[error("account is not verified")]
    AccountNotVerified,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    /// Detail is logged, never returned
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::Internal(detail.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest(_) | Self::InvalidOtp => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) | Self::InvalidCredentials | Self::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            Self::Forbidden(_) | Self::AccountNotVerified => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message for the response envelope
    pub fn message(&self) -> String {
        match self {
            Self::Internal(_) => "internal server error".to_string(),
            other => other.to_string(),
        }
    }

    pub fn field_errors(&self) -> Option<&[FieldError]> {
        match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<SharedError> for ApiError {
    fn from(err: SharedError) -> Self {
        match err {
            SharedError::ValidationError { errors } => Self::Validation(errors),
            SharedError::SerializationError { message } => Self::BadRequest(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_mapping() {
        assert_eq!(ApiError::InvalidOtp.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::InvalidCredentials.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::InvalidToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::AccountNotVerified.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::conflict("x").status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::PayloadTooLarge("big".to_string()).status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[test]
    fn test_internal_detail_is_hidden() {
        let err = ApiError::internal("connection refused at 10.0.0.3");
        assert_eq!(err.message(), "internal server error");
        assert!(err.to_string().contains("10.0.0.3"));
    }

    #[test]
    fn test_from_shared_validation() {
        let err: ApiError = SharedError::validation("email", "email is required").into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.field_errors().unwrap()[0].field, "email");
    }
}
