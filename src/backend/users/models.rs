/**
 * User Management Models
 */

use serde::{Deserialize, Serialize};

use crate::backend::auth::handlers::types::is_valid_username;
use crate::backend::auth::users::{ProfileChanges, UserProfile};
use crate::shared::error::{FieldErrors, SharedError, Validate};

const GENDERS: &[&str] = &["male", "female"];
const MEMBER_ROLES: &[&str] = &["admin", "staff"];

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Editable profile fields, shared by `PUT /user/profile` and `PUT /users/{id}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileFields {
    pub fullname: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    /// `YYYY-MM-DD`
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub npwp: Option<String>,
    pub avatar: Option<String>,
}

impl ProfileFields {
    fn check(&self, errors: &mut FieldErrors) {
        if let Some(fullname) = &self.fullname {
            errors.length("fullname", fullname.trim(), 1, 100);
        }
        if let Some(phone) = non_empty(&self.phone) {
            errors.phone("phone", &phone);
        }
        if let Some(date) = non_empty(&self.date_of_birth) {
            errors.date("date_of_birth", &date);
        }
        if let Some(gender) = non_empty(&self.gender) {
            errors.one_of("gender", &gender, GENDERS);
        }
        if let Some(npwp) = non_empty(&self.npwp) {
            errors.length("npwp", &npwp, 15, 20);
        }
    }

    pub fn changes(&self) -> ProfileChanges {
        ProfileChanges {
            fullname: non_empty(&self.fullname),
            phone: non_empty(&self.phone),
            address: non_empty(&self.address),
            city: non_empty(&self.city),
            province: non_empty(&self.province),
            date_of_birth: non_empty(&self.date_of_birth),
            gender: non_empty(&self.gender),
            npwp: non_empty(&self.npwp),
            avatar: non_empty(&self.avatar),
        }
    }
}

impl Validate for ProfileFields {
    fn validate(&self) -> Result<(), SharedError> {
        let mut errors = FieldErrors::new();
        self.check(&mut errors);
        errors.into_result()
    }
}

/// Admin-created account; verified and active immediately
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub fullname: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub phone: Option<String>,
    /// `admin` or `staff`, default `staff`
    #[serde(default)]
    pub role: Option<String>,
}

impl Validate for CreateUserRequest {
    fn validate(&self) -> Result<(), SharedError> {
        let mut errors = FieldErrors::new();
        if !is_valid_username(self.username.trim()) {
            errors.push(
                "username",
                "username must be 3-30 chars, start with a letter, and contain only letters, numbers, and underscores",
            );
        }
        if errors.required("fullname", &self.fullname) {
            errors.length("fullname", self.fullname.trim(), 1, 100);
        }
        if errors.required("email", &self.email) {
            errors.email("email", self.email.trim());
        }
        errors.min_length("password", &self.password, 8);
        if let Some(phone) = non_empty(&self.phone) {
            errors.phone("phone", &phone);
        }
        if let Some(role) = &self.role {
            errors.one_of("role", role, MEMBER_ROLES);
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(flatten)]
    pub profile: ProfileFields,
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

impl Validate for UpdateUserRequest {
    fn validate(&self) -> Result<(), SharedError> {
        let mut errors = FieldErrors::new();
        self.profile.check(&mut errors);
        if let Some(role) = &self.role {
            errors.one_of("role", role, MEMBER_ROLES);
        }
        errors.into_result()
    }
}

/// A user as seen by their organization's admins
#[derive(Debug, Clone, Serialize)]
pub struct ManagedUser {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub role: String,
    pub membership_active: bool,
    pub is_owner: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_changes_drop_blank_fields() {
        let fields = ProfileFields {
            fullname: Some(" Alice Doe ".to_string()),
            city: Some("   ".to_string()),
            ..Default::default()
        };
        let changes = fields.changes();
        assert_eq!(changes.fullname.as_deref(), Some("Alice Doe"));
        assert!(changes.city.is_none());
    }

    #[test]
    fn test_profile_rejects_bad_date_and_gender() {
        let fields = ProfileFields {
            date_of_birth: Some("31-12-1990".to_string()),
            gender: Some("unknown".to_string()),
            ..Default::default()
        };
        match fields.validate().unwrap_err() {
            SharedError::ValidationError { errors } => {
                let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["date_of_birth", "gender"]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_update_user_flattens_profile() {
        let request: UpdateUserRequest =
            serde_json::from_str(r#"{"fullname":"Bob","role":"admin","is_active":false}"#).unwrap();
        assert_eq!(request.profile.fullname.as_deref(), Some("Bob"));
        assert_eq!(request.role.as_deref(), Some("admin"));
        assert_eq!(request.is_active, Some(false));
        assert!(request.validate().is_ok());
    }
}
