/**
 * Password Handlers
 *
 * - `POST /api/auth/reset-password` - `{email}`; always answers with the same
 *   success message so account existence is not revealed
 * - `POST /api/auth/update-password` - `{token, password, confirm_password}`;
 *   `token` is either the emailed reset token or a session token
 */

use axum::extract::State;

use crate::backend::auth::handlers::types::{ResetPasswordRequest, UpdatePasswordRequest};
use crate::backend::auth::service::AuthService;
use crate::backend::extract::ValidJson;
use crate::backend::response::{ApiResponse, ApiResult};

pub async fn reset_password(
    State(auth): State<AuthService>,
    ValidJson(request): ValidJson<ResetPasswordRequest>,
) -> ApiResult<()> {
    auth.request_reset(&request.email).await?;
    Ok(ApiResponse::message(
        "if the email is registered, a reset link has been sent",
    ))
}

pub async fn update_password(
    State(auth): State<AuthService>,
    ValidJson(request): ValidJson<UpdatePasswordRequest>,
) -> ApiResult<()> {
    auth.update_password(&request.token, &request.password, &request.confirm_password)
        .await?;
    Ok(ApiResponse::message("password updated"))
}
