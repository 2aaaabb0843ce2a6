/**
 * Register Handler
 *
 * `POST /api/auth/register`
 *
 * Creates an unverified account, emails an OTP and returns the profile with a
 * verification token for the follow-up `verify-otp` / `resend-otp` calls.
 *
 * # Errors
 *
 * * `400 Bad Request` - validation failed
 * * `409 Conflict` - email, username or phone already registered
 * * `500 Internal Server Error` - hashing, persistence or cache failure
 */

use axum::extract::State;

use crate::backend::auth::handlers::types::RegisterRequest;
use crate::backend::auth::service::{AuthService, RegisterInput, Registration};
use crate::backend::extract::ValidJson;
use crate::backend::response::{ApiResponse, ApiResult};

pub async fn register(
    State(auth): State<AuthService>,
    ValidJson(request): ValidJson<RegisterRequest>,
) -> ApiResult<Registration> {
    let registration = auth
        .register(RegisterInput {
            username: request.username,
            fullname: request.fullname,
            email: request.email,
            password: request.password,
            phone: request.phone,
        })
        .await?;

    Ok(ApiResponse::created(
        "registration successful, check your email for the verification code",
        registration,
    ))
}
