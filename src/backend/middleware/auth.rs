/**
 * Authentication Middleware
 *
 * Two guards populate an [`Identity`] in the request extensions before the
 * handler runs:
 *
 * - [`require_auth`] - dual scheme. If an `X-API-Key` header is present it is
 *   the only credential evaluated, even when `Authorization` is also sent.
 *   Otherwise `Authorization: Bearer <token>` is evaluated.
 * - [`require_bearer`] - session tokens only, for routes partners may not use.
 *
 * Any failure short-circuits with `401` before the handler.
 *
 * # Authorization
 *
 * | Identity | May |
 * |---|---|
 * | partner (API key) | read organization catalogues, price and place orders |
 * | staff | the above, plus create and update catalogue entries |
 * | admin | the above, plus delete and manage users and members |
 * | owner (`is_admin`) | the above, plus promote members to admin |
 */

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::backend::auth::roles::Role;
use crate::backend::auth::sessions::{SessionPayload, TokenKind};
use crate::backend::auth::users;
use crate::backend::error::ApiError;
use crate::backend::organizations::repository as organizations;
use crate::backend::server::state::AppState;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Who is making the request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    /// `None` for API-key partners
    pub user_id: Option<String>,
    pub username: Option<String>,
    pub organization_id: Option<String>,
    pub role: Option<Role>,
    /// Owner of the organization
    pub is_admin: bool,
}

impl Identity {
    pub fn partner(organization_id: String) -> Self {
        Self {
            user_id: None,
            username: None,
            organization_id: Some(organization_id),
            role: Some(Role::Partner),
            is_admin: false,
        }
    }

    pub fn is_partner(&self) -> bool {
        self.role == Some(Role::Partner)
    }

    /// The authenticated user's id; partners have none.
    pub fn user_id(&self) -> Result<&str, ApiError> {
        self.user_id
            .as_deref()
            .ok_or_else(|| ApiError::forbidden("this operation requires a user session"))
    }

    /// Organization scope of the request
    pub fn organization_id(&self) -> Result<&str, ApiError> {
        self.organization_id
            .as_deref()
            .ok_or_else(|| ApiError::forbidden("no active organization membership"))
    }

    /// Admin or staff member; returns the organization id.
    pub fn require_writer(&self) -> Result<&str, ApiError> {
        let organization_id = self.organization_id()?;
        match self.role {
            Some(Role::Admin) | Some(Role::Staff) => Ok(organization_id),
            _ => Err(ApiError::forbidden("insufficient permissions")),
        }
    }

    pub fn require_admin(&self) -> Result<&str, ApiError> {
        let organization_id = self.organization_id()?;
        match self.role {
            Some(Role::Admin) => Ok(organization_id),
            _ => Err(ApiError::forbidden("organization admin role required")),
        }
    }

    pub fn require_owner(&self) -> Result<&str, ApiError> {
        let organization_id = self.require_admin()?;
        if self.is_admin {
            Ok(organization_id)
        } else {
            Err(ApiError::forbidden("only the organization owner may do this"))
        }
    }

    /// Value stored in `created_by` / `updated_by` columns
    pub fn actor(&self) -> String {
        match (&self.user_id, &self.organization_id) {
            (Some(user_id), _) => user_id.clone(),
            (None, Some(organization_id)) => format!("partner:{}", organization_id),
            (None, None) => "anonymous".to_string(),
        }
    }
}

/// Bearer token or API key, API key first
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = match request.headers().get(API_KEY_HEADER) {
        Some(value) => {
            let key = value.to_str().map_err(|_| {
                tracing::warn!("Non-ASCII API key header");
                ApiError::unauthorized("invalid API key")
            })?;
            authenticate_api_key(&state, key).await?
        }
        None => authenticate_bearer(&state, request.headers()).await?,
    };

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Session token only
pub async fn require_bearer(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = authenticate_bearer(&state, request.headers()).await?;
    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

async fn authenticate_api_key(state: &AppState, key: &str) -> Result<Identity, ApiError> {
    let organization_id = state.tokens.parse_api_key(key.trim()).map_err(|e| {
        tracing::warn!("Invalid API key: {}", e);
        ApiError::unauthorized("invalid API key")
    })?;

    if organizations::find_by_id(&state.db, &organization_id).await?.is_none() {
        tracing::warn!("API key for unknown organization {}", organization_id);
        return Err(ApiError::unauthorized("invalid API key"));
    }

    Ok(Identity::partner(organization_id))
}

async fn authenticate_bearer(state: &AppState, headers: &HeaderMap) -> Result<Identity, ApiError> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            tracing::warn!("Missing Authorization header");
            ApiError::unauthorized("missing credentials")
        })?;

    let token = header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            tracing::warn!("Invalid Authorization header format");
            ApiError::unauthorized("invalid authorization header")
        })?;

    let (claims, session): (_, SessionPayload) =
        state.tokens.parse(token, TokenKind::Session).map_err(|e| {
            tracing::warn!("Invalid session token: {}", e);
            ApiError::InvalidToken
        })?;

    let user = users::find_by_id(&state.db, &session.user_id)
        .await?
        .ok_or_else(|| {
            tracing::warn!("Session token for missing user {}", session.user_id);
            ApiError::InvalidToken
        })?;
    if !user.is_active() {
        return Err(ApiError::unauthorized("account is disabled"));
    }

    Ok(Identity {
        user_id: Some(session.user_id),
        username: Some(claims.username),
        organization_id: session.organization_id,
        role: session.role,
        is_admin: session.is_admin,
    })
}

/// Axum extractor for the identity set by the auth middleware
#[derive(Clone, Debug)]
pub struct AuthUser(pub Identity);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| {
                tracing::warn!("Identity not found in request extensions");
                ApiError::unauthorized("missing credentials")
            })
    }
}
