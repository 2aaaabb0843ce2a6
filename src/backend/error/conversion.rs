/**
 * Error Conversion
 *
 * Layer errors become [`ApiError`] here, and [`ApiError`] becomes an
 * enveloped HTTP response:
 *
 * ```json
 * {
 *   "success": false,
 *   "message": "validation failed",
 *   "transactionid": "2f6c...",
 *   "errors": [{"field": "email", "message": "email is required"}]
 * }
 * ```
 *
 * The response also carries an [`ErrorRecord`] extension so the transaction
 * middleware can write the audit entry without re-parsing the body.
 */

use axum::extract::multipart::MultipartError;
use axum::response::{IntoResponse, Response};

use crate::backend::auth::service::AuthError;
use crate::backend::auth::sessions::TokenError;
use crate::backend::cache::CacheError;
use crate::backend::db::StoreError;
use crate::backend::error::types::ApiError;
use crate::backend::response::{self, Envelope};

/// Attached to every error response
#[derive(Debug, Clone)]
pub struct ErrorRecord {
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if let Self::Internal(detail) = &self {
            tracing::error!("Internal error: {}", detail);
        } else {
            tracing::debug!("Request failed with {}: {}", status, self);
        }

        let message = self.message();
        let envelope: Envelope<()> = Envelope {
            success: false,
            message: message.clone(),
            transactionid: response::current_transaction_id(),
            data: None,
            errors: self.field_errors().map(<[_]>::to_vec),
        };

        let mut response = (status, axum::Json(envelope)).into_response();
        response.extensions_mut().insert(ErrorRecord { message });
        response
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        if err.is_unique_violation() {
            return Self::Conflict("resource already exists".to_string());
        }
        Self::Internal(err.to_string())
    }
}

impl From<CacheError> for ApiError {
    fn from(err: CacheError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Issue(message) => Self::Internal(message),
            _ => Self::InvalidToken,
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::EmailExists
            | AuthError::UsernameExists
            | AuthError::PhoneExists => Self::Conflict(err.to_string()),
            AuthError::InvalidOtp => Self::InvalidOtp,
            AuthError::InvalidCredentials => Self::InvalidCredentials,
            AuthError::AccountNotVerified => Self::AccountNotVerified,
            AuthError::AccountDisabled => Self::Forbidden(err.to_string()),
            AuthError::InvalidToken => Self::InvalidToken,
            AuthError::BadRequest(message) => Self::BadRequest(message),
            AuthError::UserNotFound => Self::NotFound(err.to_string()),
            AuthError::Store(e) => e.into(),
            AuthError::Cache(e) => e.into(),
            AuthError::Mail(e) => Self::Internal(e.to_string()),
            AuthError::Hash(detail) | AuthError::Token(detail) => Self::Internal(detail),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        let status = err.status();
        if status == axum::http::StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge("uploaded file is too large".to_string())
        } else {
            Self::BadRequest(err.body_text())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_store_unique_violation_is_conflict() {
        let err: ApiError = StoreError::UniqueViolation {
            context: "insert content",
            detail: "contents_slug_unique".to_string(),
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_auth_errors_map_to_status() {
        let cases = [
            (AuthError::EmailExists, StatusCode::CONFLICT),
            (AuthError::InvalidOtp, StatusCode::BAD_REQUEST),
            (AuthError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (AuthError::AccountNotVerified, StatusCode::FORBIDDEN),
            (AuthError::InvalidToken, StatusCode::UNAUTHORIZED),
            (AuthError::Hash("boom".to_string()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status_code(), status);
        }
    }

    #[tokio::test]
    async fn test_error_response_is_enveloped() {
        let response = ApiError::not_found("fleet not found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.extensions().get::<ErrorRecord>().unwrap().message,
            "fleet not found"
        );

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "fleet not found");
        assert!(json.get("data").is_none());
    }
}
