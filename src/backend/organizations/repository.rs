/**
 * Organization Database Operations
 */

use sqlx::{Any, Executor, Transaction};

use crate::backend::auth::roles::Role;
use crate::backend::db::{Database, StoreContext, StoreError};
use crate::backend::organizations::models::{
    ActiveMembership, MemberRow, Membership, Organization, UpdateOrganizationRequest,
};
use crate::shared::time;

const ORGANIZATION_COLUMNS: &str = "id, code, name, company_name, address, city, province, \
     phone, email, created_by, created_at, updated_at";

pub async fn insert_organization(
    db: &Database,
    tx: &mut Transaction<'static, Any>,
    org: &Organization,
) -> Result<(), StoreError> {
    let sql = db.sql(&format!(
        "INSERT INTO organizations ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        ORGANIZATION_COLUMNS
    ));
    sqlx::query(&sql)
        .bind(&org.id)
        .bind(&org.code)
        .bind(&org.name)
        .bind(&org.company_name)
        .bind(&org.address)
        .bind(&org.city)
        .bind(&org.province)
        .bind(&org.phone)
        .bind(&org.email)
        .bind(&org.created_by)
        .bind(org.created_at)
        .bind(org.updated_at)
        .execute(&mut **tx)
        .await
        .context("insert organization")?;
    Ok(())
}

pub async fn insert_membership<'c, E>(
    db: &Database,
    executor: E,
    membership: &Membership,
) -> Result<(), StoreError>
where
    E: Executor<'c, Database = Any>,
{
    let sql = db.sql(
        "INSERT INTO organization_users (id, organization_id, user_id, role, is_active, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    );
    sqlx::query(&sql)
        .bind(&membership.id)
        .bind(&membership.organization_id)
        .bind(&membership.user_id)
        .bind(&membership.role)
        .bind(membership.is_active)
        .bind(membership.created_at)
        .bind(membership.updated_at)
        .execute(executor)
        .await
        .context("insert membership")?;
    Ok(())
}

pub async fn find_by_id(db: &Database, id: &str) -> Result<Option<Organization>, StoreError> {
    let sql = db.sql(&format!("SELECT {} FROM organizations WHERE id = ?", ORGANIZATION_COLUMNS));
    sqlx::query_as::<_, Organization>(&sql)
        .bind(id)
        .fetch_optional(db.pool())
        .await
        .context("load organization")
}

pub async fn find_by_code(db: &Database, code: &str) -> Result<Option<Organization>, StoreError> {
    let sql = db.sql(&format!("SELECT {} FROM organizations WHERE code = ?", ORGANIZATION_COLUMNS));
    sqlx::query_as::<_, Organization>(&sql)
        .bind(code)
        .fetch_optional(db.pool())
        .await
        .context("load organization by code")
}

pub async fn code_exists(db: &Database, code: &str) -> Result<bool, StoreError> {
    let sql = db.sql("SELECT COUNT(*) FROM organizations WHERE code = ?");
    let (count,): (i64,) = sqlx::query_as(&sql)
        .bind(code)
        .fetch_one(db.pool())
        .await
        .context("check organization code")?;
    Ok(count > 0)
}

pub async fn update_organization(
    db: &Database,
    id: &str,
    changes: &UpdateOrganizationRequest,
) -> Result<bool, StoreError> {
    let sql = db.sql(
        "UPDATE organizations SET \
            name = COALESCE(?, name), \
            company_name = COALESCE(?, company_name), \
            address = COALESCE(?, address), \
            city = COALESCE(?, city), \
            province = COALESCE(?, province), \
            phone = COALESCE(?, phone), \
            email = COALESCE(?, email), \
            updated_at = ? \
         WHERE id = ?",
    );
    let result = sqlx::query(&sql)
        .bind(&changes.name)
        .bind(&changes.company_name)
        .bind(&changes.address)
        .bind(&changes.city)
        .bind(&changes.province)
        .bind(&changes.phone)
        .bind(&changes.email)
        .bind(time::now())
        .bind(id)
        .execute(db.pool())
        .await
        .context("update organization")?;
    Ok(result.rows_affected() > 0)
}

/// The user's membership, active or not
pub async fn membership_for_user(db: &Database, user_id: &str) -> Result<Option<Membership>, StoreError> {
    let sql = db.sql(
        "SELECT id, organization_id, user_id, role, is_active, created_at, updated_at \
         FROM organization_users WHERE user_id = ?",
    );
    sqlx::query_as::<_, Membership>(&sql)
        .bind(user_id)
        .fetch_optional(db.pool())
        .await
        .context("load membership")
}

#[derive(sqlx::FromRow)]
struct ActiveMembershipRow {
    organization_id: String,
    organization_name: String,
    role: String,
    created_by: String,
}

/// The organization the user currently acts for; inactive memberships and
/// unknown roles resolve to `None`.
pub async fn active_membership(
    db: &Database,
    user_id: &str,
) -> Result<Option<ActiveMembership>, StoreError> {
    let sql = db.sql(
        "SELECT ou.organization_id, o.name AS organization_name, ou.role, o.created_by \
         FROM organization_users ou \
         JOIN organizations o ON o.id = ou.organization_id \
         WHERE ou.user_id = ? AND ou.is_active = 1",
    );
    let row = sqlx::query_as::<_, ActiveMembershipRow>(&sql)
        .bind(user_id)
        .fetch_optional(db.pool())
        .await
        .context("load active membership")?;

    Ok(row.and_then(|row| {
        let role = match row.role.parse::<Role>() {
            Ok(role) if role.is_member_role() => role,
            _ => {
                tracing::warn!("Ignoring membership with unexpected role {:?}", row.role);
                return None;
            }
        };
        Some(ActiveMembership {
            is_owner: row.created_by == user_id,
            organization_id: row.organization_id,
            organization_name: row.organization_name,
            role,
        })
    }))
}

pub async fn list_members(db: &Database, organization_id: &str) -> Result<Vec<MemberRow>, StoreError> {
    let sql = db.sql(
        "SELECT u.id AS user_id, u.username, u.fullname, u.email, u.phone, ou.role, ou.is_active, \
                ou.created_at AS joined_at \
         FROM organization_users ou \
         JOIN users u ON u.id = ou.user_id \
         WHERE ou.organization_id = ? AND u.deleted_at IS NULL \
         ORDER BY ou.created_at, u.username",
    );
    sqlx::query_as::<_, MemberRow>(&sql)
        .bind(organization_id)
        .fetch_all(db.pool())
        .await
        .context("list members")
}

pub async fn find_member(
    db: &Database,
    organization_id: &str,
    user_id: &str,
) -> Result<Option<MemberRow>, StoreError> {
    let sql = db.sql(
        "SELECT u.id AS user_id, u.username, u.fullname, u.email, u.phone, ou.role, ou.is_active, \
                ou.created_at AS joined_at \
         FROM organization_users ou \
         JOIN users u ON u.id = ou.user_id \
         WHERE ou.organization_id = ? AND ou.user_id = ? AND u.deleted_at IS NULL",
    );
    sqlx::query_as::<_, MemberRow>(&sql)
        .bind(organization_id)
        .bind(user_id)
        .fetch_optional(db.pool())
        .await
        .context("load member")
}

/// Change role and/or active flag of a membership within one organization.
pub async fn update_member(
    db: &Database,
    organization_id: &str,
    user_id: &str,
    role: Option<Role>,
    is_active: Option<bool>,
) -> Result<bool, StoreError> {
    let sql = db.sql(
        "UPDATE organization_users SET \
            role = COALESCE(?, role), \
            is_active = COALESCE(?, is_active), \
            updated_at = ? \
         WHERE organization_id = ? AND user_id = ?",
    );
    let result = sqlx::query(&sql)
        .bind(role.map(|r| r.as_str().to_string()))
        .bind(is_active.map(i64::from))
        .bind(time::now())
        .bind(organization_id)
        .bind(user_id)
        .execute(db.pool())
        .await
        .context("update member")?;
    Ok(result.rows_affected() > 0)
}

pub async fn remove_member(db: &Database, organization_id: &str, user_id: &str) -> Result<bool, StoreError> {
    let sql = db.sql("DELETE FROM organization_users WHERE organization_id = ? AND user_id = ?");
    let result = sqlx::query(&sql)
        .bind(organization_id)
        .bind(user_id)
        .execute(db.pool())
        .await
        .context("remove member")?;
    Ok(result.rows_affected() > 0)
}

pub async fn count_members(db: &Database, organization_id: &str) -> Result<i64, StoreError> {
    let sql = db.sql(
        "SELECT COUNT(*) FROM organization_users ou JOIN users u ON u.id = ou.user_id \
         WHERE ou.organization_id = ? AND u.deleted_at IS NULL",
    );
    let (count,): (i64,) = sqlx::query_as(&sql)
        .bind(organization_id)
        .fetch_one(db.pool())
        .await
        .context("count members")?;
    Ok(count)
}
