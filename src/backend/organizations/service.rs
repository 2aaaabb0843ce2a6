/**
 * Organization Service
 *
 * Tenant lifecycle: founding an organization, joining one by code, and the
 * admin operations on its members.
 *
 * # Rules
 *
 * - A user holds at most one membership, active or pending
 * - The founder needs a complete contact profile (fullname, email, phone)
 * - The founder becomes an active `admin` and the organization owner
 * - Joining by code creates an inactive `staff` membership
 * - Only the owner may promote members to `admin`; nobody may modify the owner
 */

use rand::Rng;

use crate::backend::auth::roles::Role;
use crate::backend::auth::service::AuthService;
use crate::backend::auth::users;
use crate::backend::db::{Database, StoreContext, StoreError};
use crate::backend::error::ApiError;
use crate::backend::middleware::Identity;
use crate::backend::organizations::models::{
    ApiKeyResponse, CreateOrganizationRequest, CreatedOrganization, JoinedOrganization,
    MemberView, Membership, Organization, OrganizationView, UpdateMemberRequest,
    UpdateOrganizationRequest,
};
use crate::backend::organizations::repository;
use crate::shared::strings::organization_code;
use crate::shared::time;

/// Attempts at drawing an unused organization code
const CODE_ATTEMPTS: usize = 5;

fn trimmed(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Found an organization and return it with a session token that carries
/// the new admin membership.
pub async fn create(
    db: &Database,
    auth: &AuthService,
    user_id: &str,
    request: CreateOrganizationRequest,
) -> Result<CreatedOrganization, ApiError> {
    let user = users::find_by_id(db, user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("user not found"))?;

    if !user.has_complete_contact() {
        return Err(ApiError::bad_request(
            "complete your profile (fullname, email and phone) before creating an organization",
        ));
    }
    if repository::membership_for_user(db, user_id).await?.is_some() {
        return Err(ApiError::conflict("you already belong to an organization"));
    }

    let name = request.name.trim().to_string();
    let mut organization = None;

    for attempt in 1..=CODE_ATTEMPTS {
        let suffix = rand::thread_rng().gen_range(0..1_000_000);
        let code = organization_code(&name, suffix);
        if repository::code_exists(db, &code).await? {
            tracing::debug!("Organization code {} taken (attempt {})", code, attempt);
            continue;
        }

        let now = time::now();
        let candidate = Organization {
            id: uuid::Uuid::new_v4().to_string(),
            code,
            name: name.clone(),
            company_name: request.company_name.trim().to_string(),
            address: trimmed(&request.address),
            city: trimmed(&request.city),
            province: trimmed(&request.province),
            phone: trimmed(&request.phone),
            email: trimmed(&request.email),
            created_by: user.id.clone(),
            created_at: now,
            updated_at: now,
        };

        match insert_with_owner(db, &candidate).await {
            Ok(()) => {
                organization = Some(candidate);
                break;
            }
            Err(e) if e.violates("code") => {
                tracing::debug!("Organization code {} raced (attempt {})", candidate.code, attempt);
            }
            Err(e) if e.is_unique_violation() => {
                return Err(ApiError::conflict("you already belong to an organization"));
            }
            Err(e) => return Err(e.into()),
        }
    }

    let organization = organization.ok_or_else(|| {
        ApiError::internal(format!(
            "no unused organization code after {} attempts",
            CODE_ATTEMPTS
        ))
    })?;
    tracing::info!(
        "Organization {} ({}) created by {}",
        organization.id,
        organization.code,
        user.id
    );

    let session = auth.issue_session(&user).await?;
    Ok(CreatedOrganization {
        organization: organization.into(),
        token: session.token,
    })
}

async fn insert_with_owner(db: &Database, organization: &Organization) -> Result<(), StoreError> {
    let mut tx = db.begin().await?;
    repository::insert_organization(db, &mut tx, organization).await?;
    let membership = Membership {
        id: uuid::Uuid::new_v4().to_string(),
        organization_id: organization.id.clone(),
        user_id: organization.created_by.clone(),
        role: Role::Admin.as_str().to_string(),
        is_active: 1,
        created_at: organization.created_at,
        updated_at: organization.created_at,
    };
    repository::insert_membership(db, &mut *tx, &membership).await?;
    tx.commit().await.context("commit organization")
}

pub async fn get(db: &Database, identity: &Identity) -> Result<OrganizationView, ApiError> {
    let organization_id = identity.organization_id()?;
    let organization = repository::find_by_id(db, organization_id)
        .await?
        .ok_or_else(|| ApiError::not_found("organization not found"))?;
    Ok(organization.into())
}

pub async fn update(
    db: &Database,
    identity: &Identity,
    changes: UpdateOrganizationRequest,
) -> Result<OrganizationView, ApiError> {
    let organization_id = identity.require_admin()?;
    if !repository::update_organization(db, organization_id, &changes).await? {
        return Err(ApiError::not_found("organization not found"));
    }
    tracing::info!("Organization {} updated by {}", organization_id, identity.actor());
    get(db, identity).await
}

/// Request to join by code; an admin activates the membership later.
pub async fn join(db: &Database, user_id: &str, code: &str) -> Result<JoinedOrganization, ApiError> {
    let organization = repository::find_by_code(db, code.trim())
        .await?
        .ok_or_else(|| ApiError::not_found("organization not found"))?;

    if repository::membership_for_user(db, user_id).await?.is_some() {
        return Err(ApiError::conflict("you already belong to an organization"));
    }

    let now = time::now();
    let membership = Membership {
        id: uuid::Uuid::new_v4().to_string(),
        organization_id: organization.id.clone(),
        user_id: user_id.to_string(),
        role: Role::Staff.as_str().to_string(),
        is_active: 0,
        created_at: now,
        updated_at: now,
    };
    repository::insert_membership(db, db.pool(), &membership)
        .await
        .map_err(|e| {
            if e.is_unique_violation() {
                ApiError::conflict("you already belong to an organization")
            } else {
                e.into()
            }
        })?;

    tracing::info!("User {} requested to join organization {}", user_id, organization.id);
    Ok(JoinedOrganization {
        organization_id: organization.id,
        organization_name: organization.name,
        role: Role::Staff,
        is_active: false,
    })
}

pub async fn members(db: &Database, identity: &Identity) -> Result<Vec<MemberView>, ApiError> {
    let organization_id = identity.organization_id()?;
    let organization = repository::find_by_id(db, organization_id)
        .await?
        .ok_or_else(|| ApiError::not_found("organization not found"))?;
    let rows = repository::list_members(db, organization_id).await?;
    Ok(rows
        .into_iter()
        .map(|row| MemberView::from_row(row, &organization.created_by))
        .collect())
}

pub async fn update_member(
    db: &Database,
    identity: &Identity,
    user_id: &str,
    request: UpdateMemberRequest,
) -> Result<MemberView, ApiError> {
    let organization_id = identity.require_admin()?;
    let organization = repository::find_by_id(db, organization_id)
        .await?
        .ok_or_else(|| ApiError::not_found("organization not found"))?;

    if organization.created_by == user_id {
        return Err(ApiError::forbidden("the organization owner cannot be modified"));
    }

    let role = request
        .role
        .as_deref()
        .map(str::parse::<Role>)
        .transpose()
        .map_err(|_| ApiError::bad_request("role must be admin or staff"))?;
    if role == Some(Role::Admin) {
        identity.require_owner()?;
    }

    if repository::find_member(db, organization_id, user_id).await?.is_none() {
        return Err(ApiError::not_found("member not found"));
    }
    repository::update_member(db, organization_id, user_id, role, request.is_active).await?;
    tracing::info!(
        "Member {} of organization {} updated by {}",
        user_id,
        organization_id,
        identity.actor()
    );

    let row = repository::find_member(db, organization_id, user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("member not found"))?;
    Ok(MemberView::from_row(row, &organization.created_by))
}

/// Issue a partner API key for the caller's organization
pub fn api_key(auth: &AuthService, identity: &Identity) -> Result<ApiKeyResponse, ApiError> {
    let organization_id = identity.require_admin()?;
    let api_key = auth.tokens().issue_api_key(organization_id)?;
    tracing::info!("API key issued for organization {} by {}", organization_id, identity.actor());
    Ok(ApiKeyResponse {
        organization_id: organization_id.to_string(),
        api_key,
    })
}
