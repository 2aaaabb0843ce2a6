/**
 * OTP Handlers
 *
 * - `POST /api/auth/verify-otp` - `{token, otp}`; activates the account
 * - `POST /api/auth/resend-otp` - `{email}` or `{token}`; replaces the code
 *
 * A wrong code, an expired code and a code that was already used all give
 * `400 Invalid OTP`.
 */

use axum::extract::State;
use serde::Serialize;

use crate::backend::auth::handlers::types::{ResendOtpRequest, VerifyOtpRequest};
use crate::backend::auth::service::AuthService;
use crate::backend::auth::users::UserProfile;
use crate::backend::extract::ValidJson;
use crate::backend::response::{ApiResponse, ApiResult};

#[derive(Debug, Serialize)]
pub struct ResendOtpResponse {
    pub verification_token: String,
}

pub async fn verify_otp(
    State(auth): State<AuthService>,
    ValidJson(request): ValidJson<VerifyOtpRequest>,
) -> ApiResult<UserProfile> {
    let user = auth.verify_otp(&request.token, &request.otp).await?;
    Ok(ApiResponse::ok("account verified", user))
}

pub async fn resend_otp(
    State(auth): State<AuthService>,
    ValidJson(request): ValidJson<ResendOtpRequest>,
) -> ApiResult<ResendOtpResponse> {
    let verification_token = auth
        .resend_otp(request.email.as_deref(), request.token.as_deref())
        .await?;
    Ok(ApiResponse::ok(
        "a new verification code has been sent",
        ResendOtpResponse { verification_token },
    ))
}
