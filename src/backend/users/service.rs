/**
 * User Management Service
 *
 * Profile self-service for every user, plus the organization admin's view
 * of the accounts in their organization. Admin operations only ever reach
 * users holding a membership in the admin's organization; anyone else is
 * reported as not found.
 */

use crate::backend::auth::roles::Role;
use crate::backend::auth::service::AuthService;
use crate::backend::auth::users::{self, User, UserProfile};
use crate::backend::db::{Database, StoreContext, StoreError};
use crate::backend::error::ApiError;
use crate::backend::middleware::Identity;
use crate::backend::organizations::models::{MemberRow, Membership, Organization};
use crate::backend::organizations::repository as organizations;
use crate::backend::users::models::{CreateUserRequest, ManagedUser, ProfileFields, UpdateUserRequest};
use crate::shared::strings::normalize_email;
use crate::shared::time;

/// Map a unique violation on the users table to the field it concerns
fn account_conflict(err: StoreError) -> ApiError {
    if err.violates("email") {
        ApiError::conflict("email is already registered")
    } else if err.violates("username") {
        ApiError::conflict("username is already taken")
    } else if err.violates("phone") {
        ApiError::conflict("phone number is already registered")
    } else {
        err.into()
    }
}

fn parse_role(role: Option<&str>) -> Result<Option<Role>, ApiError> {
    role.map(str::parse::<Role>)
        .transpose()
        .map_err(|_| ApiError::bad_request("role must be admin or staff"))
}

async fn load_organization(db: &Database, organization_id: &str) -> Result<Organization, ApiError> {
    organizations::find_by_id(db, organization_id)
        .await?
        .ok_or_else(|| ApiError::not_found("organization not found"))
}

async fn load_managed(
    db: &Database,
    organization: &Organization,
    user_id: &str,
) -> Result<(User, MemberRow), ApiError> {
    let member = organizations::find_member(db, &organization.id, user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("user not found"))?;
    let user = users::find_by_id(db, user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("user not found"))?;
    Ok((user, member))
}

fn managed(user: User, member: &MemberRow, organization: &Organization) -> ManagedUser {
    ManagedUser {
        is_owner: user.id == organization.created_by,
        profile: user.into(),
        role: member.role.clone(),
        membership_active: member.is_active != 0,
    }
}

/// `PUT /user/profile`
pub async fn update_profile(
    db: &Database,
    user_id: &str,
    fields: &ProfileFields,
) -> Result<UserProfile, ApiError> {
    let updated = users::update_profile(db, user_id, &fields.changes())
        .await
        .map_err(account_conflict)?;
    if !updated {
        return Err(ApiError::not_found("user not found"));
    }
    let user = users::find_by_id(db, user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("user not found"))?;
    tracing::info!("Profile updated for user {}", user_id);
    Ok(user.into())
}

pub async fn list(db: &Database, identity: &Identity) -> Result<Vec<ManagedUser>, ApiError> {
    let organization = load_organization(db, identity.require_admin()?).await?;
    let members = organizations::list_members(db, &organization.id).await?;

    let mut result = Vec::with_capacity(members.len());
    for member in members {
        if let Some(user) = users::find_by_id(db, &member.user_id).await? {
            result.push(managed(user, &member, &organization));
        }
    }
    Ok(result)
}

pub async fn get(db: &Database, identity: &Identity, user_id: &str) -> Result<ManagedUser, ApiError> {
    let organization = load_organization(db, identity.require_admin()?).await?;
    let (user, member) = load_managed(db, &organization, user_id).await?;
    Ok(managed(user, &member, &organization))
}

/// Create a verified, active account with an active membership in the
/// admin's organization.
pub async fn create(
    db: &Database,
    auth: &AuthService,
    identity: &Identity,
    request: CreateUserRequest,
) -> Result<ManagedUser, ApiError> {
    let organization_id = identity.require_admin()?;
    let role = parse_role(request.role.as_deref())?.unwrap_or(Role::Staff);
    if role == Role::Admin {
        identity.require_owner()?;
    }
    let organization = load_organization(db, organization_id).await?;

    let password_hash = auth.hash(&request.password).await?;
    let mut user = User::new(
        request.username.trim().to_string(),
        request.fullname.trim().to_string(),
        normalize_email(&request.email),
        request
            .phone
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string),
        password_hash,
    );
    user.is_verified = 1;
    user.is_active = 1;

    let membership = Membership {
        id: uuid::Uuid::new_v4().to_string(),
        organization_id: organization.id.clone(),
        user_id: user.id.clone(),
        role: role.as_str().to_string(),
        is_active: 1,
        created_at: time::now(),
        updated_at: time::now(),
    };

    let mut tx = db.begin().await?;
    users::insert_user(db, &mut tx, &user)
        .await
        .map_err(account_conflict)?;
    organizations::insert_membership(db, &mut *tx, &membership).await?;
    tx.commit().await.context("commit user")?;

    tracing::info!(
        "User {} created in organization {} by {}",
        user.id,
        organization.id,
        identity.actor()
    );
    let (user, member) = load_managed(db, &organization, &user.id).await?;
    Ok(managed(user, &member, &organization))
}

pub async fn update(
    db: &Database,
    identity: &Identity,
    user_id: &str,
    request: UpdateUserRequest,
) -> Result<ManagedUser, ApiError> {
    let organization = load_organization(db, identity.require_admin()?).await?;
    load_managed(db, &organization, user_id).await?;

    let role = parse_role(request.role.as_deref())?;
    if (role.is_some() || request.is_active.is_some()) && user_id == organization.created_by {
        return Err(ApiError::forbidden("the organization owner cannot be modified"));
    }
    if role == Some(Role::Admin) {
        identity.require_owner()?;
    }

    users::update_profile(db, user_id, &request.profile.changes())
        .await
        .map_err(account_conflict)?;
    if let Some(active) = request.is_active {
        users::set_active(db, user_id, active).await?;
    }
    if role.is_some() {
        organizations::update_member(db, &organization.id, user_id, role, None).await?;
    }

    tracing::info!("User {} updated by {}", user_id, identity.actor());
    let (user, member) = load_managed(db, &organization, user_id).await?;
    Ok(managed(user, &member, &organization))
}

/// Soft delete the account and drop its membership
pub async fn delete(db: &Database, identity: &Identity, user_id: &str) -> Result<(), ApiError> {
    let organization = load_organization(db, identity.require_admin()?).await?;
    load_managed(db, &organization, user_id).await?;

    if user_id == organization.created_by {
        return Err(ApiError::forbidden("the organization owner cannot be deleted"));
    }
    if identity.user_id.as_deref() == Some(user_id) {
        return Err(ApiError::bad_request("you cannot delete your own account"));
    }

    users::soft_delete(db, user_id).await?;
    organizations::remove_member(db, &organization.id, user_id).await?;
    tracing::info!("User {} deleted by {}", user_id, identity.actor());
    Ok(())
}
