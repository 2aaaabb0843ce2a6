/**
 * Login Handler
 *
 * `POST /api/auth/login` with `{email | phone, password}`.
 *
 * # Security
 *
 * - Unknown accounts and wrong passwords return the same `401`
 * - A correct password on an unverified account returns `403`
 * - The token carries the active membership, sealed
 */

use axum::extract::State;

use crate::backend::auth::handlers::types::LoginRequest;
use crate::backend::auth::service::{AuthService, LoginResult};
use crate::backend::error::ApiError;
use crate::backend::extract::ValidJson;
use crate::backend::response::{ApiResponse, ApiResult};

pub async fn login(
    State(auth): State<AuthService>,
    ValidJson(request): ValidJson<LoginRequest>,
) -> ApiResult<LoginResult> {
    let identifier = request
        .identifier()
        .ok_or_else(|| ApiError::bad_request("email or phone is required"))?;
    let result = auth.login(identifier, &request.password).await?;
    Ok(ApiResponse::ok("login successful", result))
}
