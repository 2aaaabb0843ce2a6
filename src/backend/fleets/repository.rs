/**
 * Fleet Database Operations
 *
 * Every statement is scoped by `organization_id`; a fleet of another tenant
 * is indistinguishable from a missing one.
 */

use crate::backend::db::{Database, StoreContext, StoreError};
use crate::backend::extract::ListParams;
use crate::backend::fleets::models::{Fleet, UpdateFleetRequest};
use crate::shared::time;

const FLEET_COLUMNS: &str = "id, organization_id, name, fleet_type, plate_number, capacity, \
     price_per_day, description, image, is_available, created_by, created_at, updated_by, updated_at";

pub async fn insert(db: &Database, fleet: &Fleet) -> Result<(), StoreError> {
    let sql = db.sql(&format!(
        "INSERT INTO fleets ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        FLEET_COLUMNS
    ));
    sqlx::query(&sql)
        .bind(&fleet.id)
        .bind(&fleet.organization_id)
        .bind(&fleet.name)
        .bind(&fleet.fleet_type)
        .bind(&fleet.plate_number)
        .bind(fleet.capacity)
        .bind(fleet.price_per_day)
        .bind(&fleet.description)
        .bind(&fleet.image)
        .bind(fleet.is_available)
        .bind(&fleet.created_by)
        .bind(fleet.created_at)
        .bind(&fleet.updated_by)
        .bind(fleet.updated_at)
        .execute(db.pool())
        .await
        .context("insert fleet")?;
    Ok(())
}

pub async fn find(db: &Database, organization_id: &str, id: &str) -> Result<Option<Fleet>, StoreError> {
    let sql = db.sql(&format!(
        "SELECT {} FROM fleets WHERE organization_id = ? AND id = ?",
        FLEET_COLUMNS
    ));
    sqlx::query_as::<_, Fleet>(&sql)
        .bind(organization_id)
        .bind(id)
        .fetch_optional(db.pool())
        .await
        .context("load fleet")
}

/// One page of fleets, newest first, plus the total match count
pub async fn list(
    db: &Database,
    organization_id: &str,
    params: &ListParams,
) -> Result<(Vec<Fleet>, i64), StoreError> {
    let pattern = params.pattern();
    let filter = if pattern.is_some() {
        "organization_id = ? AND (LOWER(name) LIKE ? OR LOWER(fleet_type) LIKE ?)"
    } else {
        "organization_id = ?"
    };

    let count_sql = db.sql(&format!("SELECT COUNT(*) FROM fleets WHERE {}", filter));
    let mut count = sqlx::query_as::<_, (i64,)>(&count_sql).bind(organization_id);
    if let Some(pattern) = &pattern {
        count = count.bind(pattern.clone()).bind(pattern.clone());
    }
    let (total,) = count.fetch_one(db.pool()).await.context("count fleets")?;

    let sql = db.sql(&format!(
        "SELECT {} FROM fleets WHERE {} ORDER BY created_at DESC, name LIMIT ? OFFSET ?",
        FLEET_COLUMNS, filter
    ));
    let mut query = sqlx::query_as::<_, Fleet>(&sql).bind(organization_id);
    if let Some(pattern) = &pattern {
        query = query.bind(pattern.clone()).bind(pattern.clone());
    }
    let fleets = query
        .bind(i64::from(params.limit))
        .bind(params.offset())
        .fetch_all(db.pool())
        .await
        .context("list fleets")?;

    Ok((fleets, total))
}

pub async fn update(
    db: &Database,
    organization_id: &str,
    id: &str,
    changes: &UpdateFleetRequest,
    updated_by: &str,
) -> Result<bool, StoreError> {
    let sql = db.sql(
        "UPDATE fleets SET \
            name = COALESCE(?, name), \
            fleet_type = COALESCE(?, fleet_type), \
            plate_number = COALESCE(?, plate_number), \
            capacity = COALESCE(?, capacity), \
            price_per_day = COALESCE(?, price_per_day), \
            description = COALESCE(?, description), \
            image = COALESCE(?, image), \
            is_available = COALESCE(?, is_available), \
            updated_by = ?, \
            updated_at = ? \
         WHERE organization_id = ? AND id = ?",
    );
    let result = sqlx::query(&sql)
        .bind(changes.name.as_deref().map(str::trim))
        .bind(changes.fleet_type.as_deref().map(str::trim))
        .bind(&changes.plate_number)
        .bind(changes.capacity)
        .bind(changes.price_per_day)
        .bind(&changes.description)
        .bind(&changes.image)
        .bind(changes.is_available.map(i64::from))
        .bind(updated_by)
        .bind(time::now())
        .bind(organization_id)
        .bind(id)
        .execute(db.pool())
        .await
        .context("update fleet")?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete(db: &Database, organization_id: &str, id: &str) -> Result<bool, StoreError> {
    let sql = db.sql("DELETE FROM fleets WHERE organization_id = ? AND id = ?");
    let result = sqlx::query(&sql)
        .bind(organization_id)
        .bind(id)
        .execute(db.pool())
        .await
        .context("delete fleet")?;
    Ok(result.rows_affected() > 0)
}

pub async fn count(db: &Database, organization_id: &str) -> Result<i64, StoreError> {
    let sql = db.sql("SELECT COUNT(*) FROM fleets WHERE organization_id = ?");
    let (count,): (i64,) = sqlx::query_as(&sql)
        .bind(organization_id)
        .fetch_one(db.pool())
        .await
        .context("count fleets")?;
    Ok(count)
}
