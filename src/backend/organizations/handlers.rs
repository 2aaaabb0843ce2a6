/**
 * Organization Handlers
 *
 * All routes are bearer only.
 *
 * - `POST /api/organization` - found an organization
 * - `GET /api/organization` - the caller's organization
 * - `PUT /api/organization` - update details (admin)
 * - `POST /api/organization/join` - request membership by code
 * - `GET /api/organization/members` - list members
 * - `PUT /api/organization/members/{user_id}` - change role or activation (admin)
 * - `POST /api/organization/api-key` - issue a partner API key (admin)
 */

use axum::extract::{Path, State};

use crate::backend::auth::service::AuthService;
use crate::backend::db::Database;
use crate::backend::extract::ValidJson;
use crate::backend::middleware::AuthUser;
use crate::backend::organizations::models::{
    ApiKeyResponse, CreateOrganizationRequest, CreatedOrganization, JoinOrganizationRequest,
    JoinedOrganization, MemberView, OrganizationView, UpdateMemberRequest,
    UpdateOrganizationRequest,
};
use crate::backend::organizations::service;
use crate::backend::response::{ApiResponse, ApiResult};

pub async fn create_organization(
    State(db): State<Database>,
    State(auth): State<AuthService>,
    AuthUser(identity): AuthUser,
    ValidJson(request): ValidJson<CreateOrganizationRequest>,
) -> ApiResult<CreatedOrganization> {
    let user_id = identity.user_id()?;
    let created = service::create(&db, &auth, user_id, request).await?;
    Ok(ApiResponse::created("organization created", created))
}

pub async fn get_organization(
    State(db): State<Database>,
    AuthUser(identity): AuthUser,
) -> ApiResult<OrganizationView> {
    let organization = service::get(&db, &identity).await?;
    Ok(ApiResponse::ok("organization loaded", organization))
}

pub async fn update_organization(
    State(db): State<Database>,
    AuthUser(identity): AuthUser,
    ValidJson(request): ValidJson<UpdateOrganizationRequest>,
) -> ApiResult<OrganizationView> {
    let organization = service::update(&db, &identity, request).await?;
    Ok(ApiResponse::ok("organization updated", organization))
}

pub async fn join_organization(
    State(db): State<Database>,
    AuthUser(identity): AuthUser,
    ValidJson(request): ValidJson<JoinOrganizationRequest>,
) -> ApiResult<JoinedOrganization> {
    let user_id = identity.user_id()?;
    let joined = service::join(&db, user_id, &request.code).await?;
    Ok(ApiResponse::created(
        "join request sent, waiting for an admin to activate it",
        joined,
    ))
}

pub async fn list_members(
    State(db): State<Database>,
    AuthUser(identity): AuthUser,
) -> ApiResult<Vec<MemberView>> {
    let members = service::members(&db, &identity).await?;
    Ok(ApiResponse::ok("members loaded", members))
}

pub async fn update_member(
    State(db): State<Database>,
    AuthUser(identity): AuthUser,
    Path(user_id): Path<String>,
    ValidJson(request): ValidJson<UpdateMemberRequest>,
) -> ApiResult<MemberView> {
    let member = service::update_member(&db, &identity, &user_id, request).await?;
    Ok(ApiResponse::ok("member updated", member))
}

pub async fn create_api_key(
    State(auth): State<AuthService>,
    AuthUser(identity): AuthUser,
) -> ApiResult<ApiKeyResponse> {
    let key = service::api_key(&auth, &identity)?;
    Ok(ApiResponse::created("API key issued", key))
}
