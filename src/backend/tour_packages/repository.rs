/**
 * Tour Package Database Operations
 *
 * Scoped by `organization_id` like every catalogue table. Partner callers
 * pass `published_only` so drafts stay internal.
 */

use crate::backend::db::{Database, StoreContext, StoreError};
use crate::backend::extract::ListParams;
use crate::backend::tour_packages::models::{TourPackage, UpdateTourPackageRequest};
use crate::shared::time;

const PACKAGE_COLUMNS: &str = "id, organization_id, name, destination, description, duration_days, \
     price, max_participants, image, is_published, created_by, created_at, updated_by, updated_at";

pub async fn insert(db: &Database, package: &TourPackage) -> Result<(), StoreError> {
    let sql = db.sql(&format!(
        "INSERT INTO tour_packages ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        PACKAGE_COLUMNS
    ));
    sqlx::query(&sql)
        .bind(&package.id)
        .bind(&package.organization_id)
        .bind(&package.name)
        .bind(&package.destination)
        .bind(&package.description)
        .bind(package.duration_days)
        .bind(package.price)
        .bind(package.max_participants)
        .bind(&package.image)
        .bind(package.is_published)
        .bind(&package.created_by)
        .bind(package.created_at)
        .bind(&package.updated_by)
        .bind(package.updated_at)
        .execute(db.pool())
        .await
        .context("insert tour package")?;
    Ok(())
}

pub async fn find(
    db: &Database,
    organization_id: &str,
    id: &str,
    published_only: bool,
) -> Result<Option<TourPackage>, StoreError> {
    let sql = db.sql(&format!(
        "SELECT {} FROM tour_packages WHERE organization_id = ? AND id = ?{}",
        PACKAGE_COLUMNS,
        if published_only { " AND is_published = 1" } else { "" }
    ));
    sqlx::query_as::<_, TourPackage>(&sql)
        .bind(organization_id)
        .bind(id)
        .fetch_optional(db.pool())
        .await
        .context("load tour package")
}

pub async fn list(
    db: &Database,
    organization_id: &str,
    params: &ListParams,
    published_only: bool,
) -> Result<(Vec<TourPackage>, i64), StoreError> {
    let pattern = params.pattern();
    let mut filter = String::from("organization_id = ?");
    if published_only {
        filter.push_str(" AND is_published = 1");
    }
    if pattern.is_some() {
        filter.push_str(" AND (LOWER(name) LIKE ? OR LOWER(destination) LIKE ?)");
    }

    let count_sql = db.sql(&format!("SELECT COUNT(*) FROM tour_packages WHERE {}", filter));
    let mut count = sqlx::query_as::<_, (i64,)>(&count_sql).bind(organization_id);
    if let Some(pattern) = &pattern {
        count = count.bind(pattern.clone()).bind(pattern.clone());
    }
    let (total,) = count.fetch_one(db.pool()).await.context("count tour packages")?;

    let sql = db.sql(&format!(
        "SELECT {} FROM tour_packages WHERE {} ORDER BY created_at DESC, name LIMIT ? OFFSET ?",
        PACKAGE_COLUMNS, filter
    ));
    let mut query = sqlx::query_as::<_, TourPackage>(&sql).bind(organization_id);
    if let Some(pattern) = &pattern {
        query = query.bind(pattern.clone()).bind(pattern.clone());
    }
    let packages = query
        .bind(i64::from(params.limit))
        .bind(params.offset())
        .fetch_all(db.pool())
        .await
        .context("list tour packages")?;

    Ok((packages, total))
}

pub async fn update(
    db: &Database,
    organization_id: &str,
    id: &str,
    changes: &UpdateTourPackageRequest,
    updated_by: &str,
) -> Result<bool, StoreError> {
    let sql = db.sql(
        "UPDATE tour_packages SET \
            name = COALESCE(?, name), \
            destination = COALESCE(?, destination), \
            description = COALESCE(?, description), \
            duration_days = COALESCE(?, duration_days), \
            price = COALESCE(?, price), \
            max_participants = COALESCE(?, max_participants), \
            image = COALESCE(?, image), \
            is_published = COALESCE(?, is_published), \
            updated_by = ?, \
            updated_at = ? \
         WHERE organization_id = ? AND id = ?",
    );
    let result = sqlx::query(&sql)
        .bind(changes.name.as_deref().map(str::trim))
        .bind(changes.destination.as_deref().map(str::trim))
        .bind(&changes.description)
        .bind(changes.duration_days)
        .bind(changes.price)
        .bind(changes.max_participants)
        .bind(&changes.image)
        .bind(changes.is_published.map(i64::from))
        .bind(updated_by)
        .bind(time::now())
        .bind(organization_id)
        .bind(id)
        .execute(db.pool())
        .await
        .context("update tour package")?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete(db: &Database, organization_id: &str, id: &str) -> Result<bool, StoreError> {
    let sql = db.sql("DELETE FROM tour_packages WHERE organization_id = ? AND id = ?");
    let result = sqlx::query(&sql)
        .bind(organization_id)
        .bind(id)
        .execute(db.pool())
        .await
        .context("delete tour package")?;
    Ok(result.rows_affected() > 0)
}

pub async fn count(db: &Database, organization_id: &str) -> Result<i64, StoreError> {
    let sql = db.sql("SELECT COUNT(*) FROM tour_packages WHERE organization_id = ?");
    let (count,): (i64,) = sqlx::query_as(&sql)
        .bind(organization_id)
        .fetch_one(db.pool())
        .await
        .context("count tour packages")?;
    Ok(count)
}
