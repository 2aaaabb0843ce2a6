/**
 * Request Extractors
 *
 * - `ValidJson<T>` deserializes the body like `Json<T>` and then runs
 *   [`Validate`]. Malformed bodies become `400` envelopes instead of axum's
 *   plain-text rejections; validation failures carry per-field errors.
 * - `ListParams` reads `?page=&limit=&search=` for the catalogue listings.
 */

use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::backend::error::ApiError;
use crate::shared::error::Validate;

#[derive(Debug, Clone)]
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(request, state).await.map_err(|rejection| {
            tracing::debug!("Rejected JSON body: {}", rejection.body_text());
            ApiError::BadRequest(rejection.body_text())
        })?;
        value.validate()?;
        Ok(Self(value))
    }
}

const DEFAULT_LIMIT: u32 = 20;
const MAX_LIMIT: u32 = 100;

#[derive(Debug, Clone, Default, Deserialize)]
struct RawListParams {
    page: Option<u32>,
    limit: Option<u32>,
    search: Option<String>,
}

/// Paging and search for list endpoints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParams {
    /// 1-based
    pub page: u32,
    pub limit: u32,
    /// Case-insensitive substring match, already trimmed
    pub search: Option<String>,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_LIMIT,
            search: None,
        }
    }
}

impl ListParams {
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.limit)
    }

    /// `%term%` for a `LIKE` filter, lower-cased
    pub fn pattern(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(|term| format!("%{}%", term.to_lowercase()))
    }
}

impl From<RawListParams> for ListParams {
    fn from(raw: RawListParams) -> Self {
        Self {
            page: raw.page.unwrap_or(1).max(1),
            limit: raw.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
            search: raw
                .search
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        }
    }
}

impl<S> FromRequestParts<S> for ListParams
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(raw) = Query::<RawListParams>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
        Ok(raw.into())
    }
}
