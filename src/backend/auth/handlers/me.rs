/**
 * Get Me Handler
 *
 * `GET /api/auth/me`, bearer only. Returns the authenticated user's profile.
 */

use axum::extract::State;

use crate::backend::auth::service::AuthService;
use crate::backend::auth::users::UserProfile;
use crate::backend::middleware::AuthUser;
use crate::backend::response::{ApiResponse, ApiResult};

pub async fn get_me(
    State(auth): State<AuthService>,
    AuthUser(identity): AuthUser,
) -> ApiResult<UserProfile> {
    let user_id = identity.user_id()?;
    tracing::debug!("Get me request for user: {}", user_id);
    let profile = auth.me(user_id).await?;
    Ok(ApiResponse::ok("profile loaded", profile))
}
