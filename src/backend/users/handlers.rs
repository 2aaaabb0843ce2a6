/**
 * User Handlers
 *
 * - `PUT /api/user/profile` - update the caller's own profile
 * - `GET /api/users`, `POST /api/users` - list and create (admin)
 * - `GET|PUT|DELETE /api/users/{id}` - manage one account (admin)
 *
 * All routes are bearer only.
 */

use axum::extract::{Path, State};

use crate::backend::auth::service::AuthService;
use crate::backend::auth::users::UserProfile;
use crate::backend::db::Database;
use crate::backend::extract::ValidJson;
use crate::backend::middleware::AuthUser;
use crate::backend::response::{ApiResponse, ApiResult};
use crate::backend::users::models::{CreateUserRequest, ManagedUser, ProfileFields, UpdateUserRequest};
use crate::backend::users::service;

pub async fn update_profile(
    State(db): State<Database>,
    AuthUser(identity): AuthUser,
    ValidJson(fields): ValidJson<ProfileFields>,
) -> ApiResult<UserProfile> {
    let profile = service::update_profile(&db, identity.user_id()?, &fields).await?;
    Ok(ApiResponse::ok("profile updated", profile))
}

pub async fn list_users(
    State(db): State<Database>,
    AuthUser(identity): AuthUser,
) -> ApiResult<Vec<ManagedUser>> {
    let users = service::list(&db, &identity).await?;
    Ok(ApiResponse::ok("users loaded", users))
}

pub async fn create_user(
    State(db): State<Database>,
    State(auth): State<AuthService>,
    AuthUser(identity): AuthUser,
    ValidJson(request): ValidJson<CreateUserRequest>,
) -> ApiResult<ManagedUser> {
    let user = service::create(&db, &auth, &identity, request).await?;
    Ok(ApiResponse::created("user created", user))
}

pub async fn get_user(
    State(db): State<Database>,
    AuthUser(identity): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<ManagedUser> {
    let user = service::get(&db, &identity, &id).await?;
    Ok(ApiResponse::ok("user loaded", user))
}

pub async fn update_user(
    State(db): State<Database>,
    AuthUser(identity): AuthUser,
    Path(id): Path<String>,
    ValidJson(request): ValidJson<UpdateUserRequest>,
) -> ApiResult<ManagedUser> {
    let user = service::update(&db, &identity, &id, request).await?;
    Ok(ApiResponse::ok("user updated", user))
}

pub async fn delete_user(
    State(db): State<Database>,
    AuthUser(identity): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<()> {
    service::delete(&db, &identity, &id).await?;
    Ok(ApiResponse::message("user deleted"))
}
