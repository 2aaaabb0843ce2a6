/**
 * Organization Models
 */

use serde::{Deserialize, Serialize};

use crate::backend::auth::roles::Role;
use crate::shared::error::{FieldErrors, SharedError, Validate};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Organization {
    pub id: String,
    /// `PREFIX-NNNNNN`, unique
    pub code: String,
    pub name: String,
    pub company_name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// Owner; one organization per founding user
    pub created_by: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrganizationView {
    pub id: String,
    pub code: String,
    pub name: String,
    pub company_name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    #[serde(with = "crate::shared::time::rfc3339")]
    pub created_at: i64,
    #[serde(with = "crate::shared::time::rfc3339")]
    pub updated_at: i64,
}

impl From<Organization> for OrganizationView {
    fn from(org: Organization) -> Self {
        Self {
            id: org.id,
            code: org.code,
            name: org.name,
            company_name: org.company_name,
            address: org.address,
            city: org.city,
            province: org.province,
            phone: org.phone,
            email: org.email,
            created_at: org.created_at,
            updated_at: org.updated_at,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Membership {
    pub id: String,
    pub organization_id: String,
    pub user_id: String,
    pub role: String,
    pub is_active: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// The organization a user acts for, resolved at login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveMembership {
    pub organization_id: String,
    pub organization_name: String,
    pub role: Role,
    pub is_owner: bool,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MemberRow {
    pub user_id: String,
    pub username: String,
    pub fullname: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: String,
    pub is_active: i64,
    pub joined_at: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberView {
    pub user_id: String,
    pub username: String,
    pub fullname: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: String,
    pub is_active: bool,
    pub is_owner: bool,
    #[serde(with = "crate::shared::time::rfc3339")]
    pub joined_at: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrganizationRequest {
    pub name: String,
    pub company_name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl Validate for CreateOrganizationRequest {
    fn validate(&self) -> Result<(), SharedError> {
        let mut errors = FieldErrors::new();
        if errors.required("name", &self.name) {
            errors.length("name", &self.name, 3, 100);
        }
        if errors.required("company_name", &self.company_name) {
            errors.length("company_name", &self.company_name, 3, 150);
        }
        if let Some(phone) = &self.phone {
            errors.phone("phone", phone);
        }
        if let Some(email) = &self.email {
            errors.email("email", email);
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateOrganizationRequest {
    pub name: Option<String>,
    pub company_name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl Validate for UpdateOrganizationRequest {
    fn validate(&self) -> Result<(), SharedError> {
        let mut errors = FieldErrors::new();
        if let Some(name) = &self.name {
            errors.length("name", name, 3, 100);
        }
        if let Some(company_name) = &self.company_name {
            errors.length("company_name", company_name, 3, 150);
        }
        if let Some(phone) = &self.phone {
            errors.phone("phone", phone);
        }
        if let Some(email) = &self.email {
            errors.email("email", email);
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JoinOrganizationRequest {
    pub code: String,
}

impl Validate for JoinOrganizationRequest {
    fn validate(&self) -> Result<(), SharedError> {
        let mut errors = FieldErrors::new();
        errors.required("code", &self.code);
        errors.into_result()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateMemberRequest {
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

impl Validate for UpdateMemberRequest {
    fn validate(&self) -> Result<(), SharedError> {
        let mut errors = FieldErrors::new();
        if let Some(role) = &self.role {
            errors.one_of("role", role, &["admin", "staff"]);
        }
        if self.role.is_none() && self.is_active.is_none() {
            errors.push("role", "either role or is_active must be provided");
        }
        errors.into_result()
    }
}

/// Response of a successful create: the organization plus a session token
/// that carries the new membership
#[derive(Debug, Clone, Serialize)]
pub struct CreatedOrganization {
    pub organization: OrganizationView,
    pub token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiKeyResponse {
    pub organization_id: String,
    pub api_key: String,
}

impl MemberView {
    pub fn from_row(row: MemberRow, owner_id: &str) -> Self {
        Self {
            is_owner: row.user_id == owner_id,
            user_id: row.user_id,
            username: row.username,
            fullname: row.fullname,
            email: row.email,
            phone: row.phone,
            role: row.role,
            is_active: row.is_active != 0,
            joined_at: row.joined_at,
        }
    }
}

/// Pending membership created by a join request
#[derive(Debug, Clone, Serialize)]
pub struct JoinedOrganization {
    pub organization_id: String,
    pub organization_name: String,
    pub role: Role,
    pub is_active: bool,
}
