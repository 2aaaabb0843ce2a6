/**
 * Response Envelope
 *
 * Every API response, success or failure, has the same shape:
 *
 * ```json
 * {"success": true, "message": "fleet created", "transactionid": "…", "data": {…}}
 * ```
 *
 * The transaction id is assigned by the transaction middleware and held in a
 * task-local for the lifetime of the request, so envelopes can be built
 * anywhere in the handler's call tree.
 */

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::backend::error::ApiError;
use crate::shared::FieldError;

tokio::task_local! {
    static TRANSACTION_ID: String;
}

/// Run `future` with `id` as the current transaction id.
pub async fn with_transaction_id<F>(id: String, future: F) -> F::Output
where
    F: std::future::Future,
{
    TRANSACTION_ID.scope(id, future).await
}

/// Transaction id of the request being served, or empty outside one
pub fn current_transaction_id() -> String {
    TRANSACTION_ID.try_with(|id| id.clone()).unwrap_or_default()
}

#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    pub message: String,
    pub transactionid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

/// Successful handler output
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    status: StatusCode,
    message: String,
    data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            status: StatusCode::OK,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            message: message.into(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    /// Success without a `data` member
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            message: message.into(),
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let envelope = Envelope {
            success: true,
            message: self.message,
            transactionid: current_transaction_id(),
            data: self.data,
            errors: None,
        };
        (self.status, Json(envelope)).into_response()
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, ApiError>;

/// One page of a listing
#[derive(Debug, Clone, Serialize)]
pub struct Page<T: Serialize> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: i64,
}
