/**
 * User Model and Database Operations
 *
 * Every lookup ignores soft-deleted rows. Uniqueness of username, email and
 * phone is enforced by the schema; callers map a unique violation through
 * [`StoreError::violates`].
 */

use serde::Serialize;
use sqlx::{Any, Transaction};

use crate::backend::db::{Database, StoreContext, StoreError};
use crate::shared::time;

const USER_COLUMNS: &str = "id, username, email, phone, password_hash, fullname, address, city, \
     province, date_of_birth, gender, npwp, avatar, is_verified, is_active, created_at, \
     updated_at, deleted_at";

/// User row
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    /// bcrypt digest
    pub password_hash: String,
    pub fullname: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    /// `YYYY-MM-DD`
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub npwp: Option<String>,
    pub avatar: Option<String>,
    pub is_verified: i64,
    pub is_active: i64,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}

impl User {
    /// A new unverified, inactive account
    pub fn new(
        username: String,
        fullname: String,
        email: String,
        phone: Option<String>,
        password_hash: String,
    ) -> Self {
        let now = time::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            username,
            email,
            phone,
            password_hash,
            fullname,
            address: None,
            city: None,
            province: None,
            date_of_birth: None,
            gender: None,
            npwp: None,
            avatar: None,
            is_verified: 0,
            is_active: 0,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn is_verified(&self) -> bool {
        self.is_verified != 0
    }

    pub fn is_active(&self) -> bool {
        self.is_active != 0
    }

    /// Phone, full name and email are all present
    pub fn has_complete_contact(&self) -> bool {
        let filled = |v: &str| !v.trim().is_empty();
        filled(&self.fullname)
            && filled(&self.email)
            && self.phone.as_deref().map_or(false, filled)
    }
}

/// Public view of a user; never includes the password digest
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    pub fullname: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub npwp: Option<String>,
    pub avatar: Option<String>,
    pub is_verified: bool,
    pub is_active: bool,
    #[serde(with = "crate::shared::time::rfc3339")]
    pub created_at: i64,
    #[serde(with = "crate::shared::time::rfc3339")]
    pub updated_at: i64,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        let is_verified = user.is_verified();
        let is_active = user.is_active();
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            phone: user.phone,
            fullname: user.fullname,
            address: user.address,
            city: user.city,
            province: user.province,
            date_of_birth: user.date_of_birth,
            gender: user.gender,
            npwp: user.npwp,
            avatar: user.avatar,
            is_verified,
            is_active,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Partial profile update; `None` leaves a column unchanged
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub fullname: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub npwp: Option<String>,
    pub avatar: Option<String>,
}

/// Insert a user inside an open transaction
pub async fn insert_user(
    db: &Database,
    tx: &mut Transaction<'static, Any>,
    user: &User,
) -> Result<(), StoreError> {
    let sql = db.sql(&format!(
        "INSERT INTO users ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        USER_COLUMNS
    ));
    sqlx::query(&sql)
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.password_hash)
        .bind(&user.fullname)
        .bind(&user.address)
        .bind(&user.city)
        .bind(&user.province)
        .bind(&user.date_of_birth)
        .bind(&user.gender)
        .bind(&user.npwp)
        .bind(&user.avatar)
        .bind(user.is_verified)
        .bind(user.is_active)
        .bind(user.created_at)
        .bind(user.updated_at)
        .bind(user.deleted_at)
        .execute(&mut **tx)
        .await
        .context("insert user")?;
    Ok(())
}

async fn find_one(
    db: &Database,
    column: &'static str,
    value: &str,
    context: &'static str,
) -> Result<Option<User>, StoreError> {
    let sql = db.sql(&format!(
        "SELECT {} FROM users WHERE {} = ? AND deleted_at IS NULL",
        USER_COLUMNS, column
    ));
    sqlx::query_as::<_, User>(&sql)
        .bind(value)
        .fetch_optional(db.pool())
        .await
        .context(context)
}

pub async fn find_by_id(db: &Database, id: &str) -> Result<Option<User>, StoreError> {
    find_one(db, "id", id, "load user by id").await
}

pub async fn find_by_email(db: &Database, email: &str) -> Result<Option<User>, StoreError> {
    find_one(db, "email", email, "load user by email").await
}

pub async fn find_by_username(db: &Database, username: &str) -> Result<Option<User>, StoreError> {
    find_one(db, "username", username, "load user by username").await
}

pub async fn find_by_phone(db: &Database, phone: &str) -> Result<Option<User>, StoreError> {
    find_one(db, "phone", phone, "load user by phone").await
}

/// Flag the account verified and active.
pub async fn mark_verified(db: &Database, id: &str) -> Result<(), StoreError> {
    let sql = db.sql("UPDATE users SET is_verified = 1, is_active = 1, updated_at = ? WHERE id = ?");
    sqlx::query(&sql)
        .bind(time::now())
        .bind(id)
        .execute(db.pool())
        .await
        .context("mark user verified")?;
    Ok(())
}

pub async fn update_password(db: &Database, id: &str, password_hash: &str) -> Result<(), StoreError> {
    let sql = db.sql(
        "UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
    );
    sqlx::query(&sql)
        .bind(password_hash)
        .bind(time::now())
        .bind(id)
        .execute(db.pool())
        .await
        .context("update password")?;
    Ok(())
}

/// Apply the non-empty fields of `changes`; returns false when no live row matched.
pub async fn update_profile(
    db: &Database,
    id: &str,
    changes: &ProfileChanges,
) -> Result<bool, StoreError> {
    let sql = db.sql(
        "UPDATE users SET \
            fullname = COALESCE(?, fullname), \
            phone = COALESCE(?, phone), \
            address = COALESCE(?, address), \
            city = COALESCE(?, city), \
            province = COALESCE(?, province), \
            date_of_birth = COALESCE(?, date_of_birth), \
            gender = COALESCE(?, gender), \
            npwp = COALESCE(?, npwp), \
            avatar = COALESCE(?, avatar), \
            updated_at = ? \
         WHERE id = ? AND deleted_at IS NULL",
    );
    let result = sqlx::query(&sql)
        .bind(&changes.fullname)
        .bind(&changes.phone)
        .bind(&changes.address)
        .bind(&changes.city)
        .bind(&changes.province)
        .bind(&changes.date_of_birth)
        .bind(&changes.gender)
        .bind(&changes.npwp)
        .bind(&changes.avatar)
        .bind(time::now())
        .bind(id)
        .execute(db.pool())
        .await
        .context("update profile")?;
    Ok(result.rows_affected() > 0)
}

/// Set the active flag of a live account.
pub async fn set_active(db: &Database, id: &str, active: bool) -> Result<bool, StoreError> {
    let sql = db.sql("UPDATE users SET is_active = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL");
    let result = sqlx::query(&sql)
        .bind(i64::from(active))
        .bind(time::now())
        .bind(id)
        .execute(db.pool())
        .await
        .context("set user active")?;
    Ok(result.rows_affected() > 0)
}

/// Soft delete; the row stays but every lookup skips it.
pub async fn soft_delete(db: &Database, id: &str) -> Result<bool, StoreError> {
    let now = time::now();
    let sql = db.sql(
        "UPDATE users SET deleted_at = ?, is_active = 0, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
    );
    let result = sqlx::query(&sql)
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(db.pool())
        .await
        .context("soft delete user")?;
    Ok(result.rows_affected() > 0)
}
