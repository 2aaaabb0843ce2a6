/**
 * Content Database Operations
 */

use crate::backend::content::models::Content;
use crate::backend::db::{Database, StoreContext, StoreError};
use crate::backend::extract::ListParams;
use crate::shared::time;

const CONTENT_COLUMNS: &str = "id, organization_id, kind, title, slug, body, status, metadata, \
     created_by, created_at, updated_by, updated_at";

/// Column values for a partial update; `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct ContentChanges {
    pub kind: Option<String>,
    pub title: Option<String>,
    pub slug: Option<String>,
    pub body: Option<String>,
    pub status: Option<String>,
    pub metadata: Option<String>,
}

pub async fn insert(db: &Database, content: &Content) -> Result<(), StoreError> {
    let sql = db.sql(&format!(
        "INSERT INTO contents ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        CONTENT_COLUMNS
    ));
    sqlx::query(&sql)
        .bind(&content.id)
        .bind(&content.organization_id)
        .bind(&content.kind)
        .bind(&content.title)
        .bind(&content.slug)
        .bind(&content.body)
        .bind(&content.status)
        .bind(&content.metadata)
        .bind(&content.created_by)
        .bind(content.created_at)
        .bind(&content.updated_by)
        .bind(content.updated_at)
        .execute(db.pool())
        .await
        .context("insert content")?;
    Ok(())
}

/// `status` restricts the lookup to one status, e.g. published for partners
pub async fn find(
    db: &Database,
    organization_id: &str,
    id: &str,
    status: Option<&str>,
) -> Result<Option<Content>, StoreError> {
    let sql = db.sql(&format!(
        "SELECT {} FROM contents WHERE organization_id = ? AND id = ?{}",
        CONTENT_COLUMNS,
        if status.is_some() { " AND status = ?" } else { "" }
    ));
    let mut query = sqlx::query_as::<_, Content>(&sql).bind(organization_id).bind(id);
    if let Some(status) = status {
        query = query.bind(status);
    }
    query.fetch_optional(db.pool()).await.context("load content")
}

pub async fn list(
    db: &Database,
    organization_id: &str,
    params: &ListParams,
    status: Option<&str>,
    kind: Option<&str>,
) -> Result<(Vec<Content>, i64), StoreError> {
    let pattern = params.pattern();
    let mut filter = String::from("organization_id = ?");
    if status.is_some() {
        filter.push_str(" AND status = ?");
    }
    if kind.is_some() {
        filter.push_str(" AND kind = ?");
    }
    if pattern.is_some() {
        filter.push_str(" AND LOWER(title) LIKE ?");
    }

    let count_sql = db.sql(&format!("SELECT COUNT(*) FROM contents WHERE {}", filter));
    let mut count = sqlx::query_as::<_, (i64,)>(&count_sql).bind(organization_id);
    if let Some(status) = status {
        count = count.bind(status);
    }
    if let Some(kind) = kind {
        count = count.bind(kind);
    }
    if let Some(pattern) = &pattern {
        count = count.bind(pattern.clone());
    }
    let (total,) = count.fetch_one(db.pool()).await.context("count contents")?;

    let sql = db.sql(&format!(
        "SELECT {} FROM contents WHERE {} ORDER BY created_at DESC, title LIMIT ? OFFSET ?",
        CONTENT_COLUMNS, filter
    ));
    let mut query = sqlx::query_as::<_, Content>(&sql).bind(organization_id);
    if let Some(status) = status {
        query = query.bind(status);
    }
    if let Some(kind) = kind {
        query = query.bind(kind);
    }
    if let Some(pattern) = &pattern {
        query = query.bind(pattern.clone());
    }
    let contents = query
        .bind(i64::from(params.limit))
        .bind(params.offset())
        .fetch_all(db.pool())
        .await
        .context("list contents")?;

    Ok((contents, total))
}

pub async fn update(
    db: &Database,
    organization_id: &str,
    id: &str,
    changes: &ContentChanges,
    updated_by: &str,
) -> Result<bool, StoreError> {
    let sql = db.sql(
        "UPDATE contents SET \
            kind = COALESCE(?, kind), \
            title = COALESCE(?, title), \
            slug = COALESCE(?, slug), \
            body = COALESCE(?, body), \
            status = COALESCE(?, status), \
            metadata = COALESCE(?, metadata), \
            updated_by = ?, \
            updated_at = ? \
         WHERE organization_id = ? AND id = ?",
    );
    let result = sqlx::query(&sql)
        .bind(&changes.kind)
        .bind(&changes.title)
        .bind(&changes.slug)
        .bind(&changes.body)
        .bind(&changes.status)
        .bind(&changes.metadata)
        .bind(updated_by)
        .bind(time::now())
        .bind(organization_id)
        .bind(id)
        .execute(db.pool())
        .await
        .context("update content")?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete(db: &Database, organization_id: &str, id: &str) -> Result<bool, StoreError> {
    let sql = db.sql("DELETE FROM contents WHERE organization_id = ? AND id = ?");
    let result = sqlx::query(&sql)
        .bind(organization_id)
        .bind(id)
        .execute(db.pool())
        .await
        .context("delete content")?;
    Ok(result.rows_affected() > 0)
}
