/**
 * Transaction Middleware
 *
 * Outermost layer of the API. For every request it:
 *
 * 1. assigns a transaction id, available to envelopes through
 *    [`current_transaction_id`](crate::backend::response::current_transaction_id)
 * 2. captures JSON request bodies so failures can be audited
 * 3. echoes the id in the `X-Transaction-Id` response header
 * 4. writes an audit entry for every `4xx`/`5xx` response
 */

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header::CONTENT_LENGTH, header::CONTENT_TYPE, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::backend::audit::{sanitize, AuditEntry, AuditLog};
use crate::backend::error::{ApiError, ErrorRecord};
use crate::backend::response::with_transaction_id;

pub const TRANSACTION_HEADER: &str = "x-transaction-id";

/// Largest JSON body buffered for audit capture
const CAPTURE_LIMIT: usize = 1024 * 1024;

pub async fn transaction_middleware(
    State(audit): State<Arc<AuditLog>>,
    request: Request,
    next: Next,
) -> Response {
    let transaction_id = uuid::Uuid::new_v4().to_string();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let (mut response, captured) = with_transaction_id(transaction_id.clone(), async move {
        match capture_json_body(request).await {
            Ok((request, captured)) => (next.run(request).await, captured),
            Err(err) => (err.into_response(), None),
        }
    })
    .await;

    let status = response.status();
    if status.is_client_error() || status.is_server_error() {
        let message = response
            .extensions()
            .get::<ErrorRecord>()
            .map(|record| record.message.clone())
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());

        audit.record(&AuditEntry {
            time: chrono::Utc::now().to_rfc3339(),
            transactionid: transaction_id.clone(),
            method,
            path,
            status: status.as_u16(),
            message,
            request: captured.as_ref().map(sanitize),
        });
    }

    if let Ok(value) = HeaderValue::from_str(&transaction_id) {
        response.headers_mut().insert(TRANSACTION_HEADER, value);
    }
    response
}

/// Buffer a JSON body and hand back an equivalent request. Other content
/// types (multipart uploads) pass through untouched.
async fn capture_json_body(request: Request) -> Result<(Request, Option<Value>), ApiError> {
    let is_json = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map_or(false, |v| v.starts_with("application/json"));
    if !is_json {
        return Ok((request, None));
    }

    let declared = request
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared.map_or(false, |len| len > CAPTURE_LIMIT) {
        return Err(ApiError::PayloadTooLarge("request body is too large".to_string()));
    }

    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, CAPTURE_LIMIT).await.map_err(|e| {
        tracing::warn!("Failed to read request body: {}", e);
        ApiError::bad_request("failed to read request body")
    })?;
    let captured = serde_json::from_slice::<Value>(&bytes).ok();
    Ok((Request::from_parts(parts, Body::from(bytes)), captured))
}
