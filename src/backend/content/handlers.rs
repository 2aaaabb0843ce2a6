/**
 * Content Handlers
 *
 * Bearer token or API key. Partners only see published entries.
 *
 * - `GET /api/contents?kind=&search=&page=&limit=`, `GET /api/contents/{id}` - read
 * - `POST /api/contents`, `PUT /api/contents/{id}` - admin, staff
 * - `DELETE /api/contents/{id}` - admin
 *
 * A slug already used in the organization gives `409 Conflict`.
 */

use axum::extract::{Path, Query, State};
use serde::Deserialize;

use crate::backend::content::models::{
    Content, ContentView, CreateContentRequest, UpdateContentRequest, PUBLISHED,
};
use crate::backend::content::repository::{self, ContentChanges};
use crate::backend::db::{Database, StoreError};
use crate::backend::error::ApiError;
use crate::backend::extract::{ListParams, ValidJson};
use crate::backend::middleware::{AuthUser, Identity};
use crate::backend::response::{ApiResponse, ApiResult, Page};
use crate::shared::time;

#[derive(Debug, Default, Deserialize)]
pub struct ContentFilter {
    pub kind: Option<String>,
}

fn not_found() -> ApiError {
    ApiError::not_found("content not found")
}

fn slug_conflict(err: StoreError) -> ApiError {
    if err.is_unique_violation() {
        ApiError::conflict("slug is already used by another content")
    } else {
        err.into()
    }
}

fn visible_status(identity: &Identity) -> Option<&'static str> {
    identity.is_partner().then_some(PUBLISHED)
}

fn metadata_text(metadata: &serde_json::Map<String, serde_json::Value>) -> Result<String, ApiError> {
    serde_json::to_string(metadata).map_err(|e| ApiError::internal(format!("encode metadata: {}", e)))
}

pub async fn list_contents(
    State(db): State<Database>,
    AuthUser(identity): AuthUser,
    Query(filter): Query<ContentFilter>,
    params: ListParams,
) -> ApiResult<Page<ContentView>> {
    let organization_id = identity.organization_id()?;
    let kind = filter.kind.as_deref().map(str::trim).filter(|k| !k.is_empty());
    let (contents, total) =
        repository::list(&db, organization_id, &params, visible_status(&identity), kind).await?;
    Ok(ApiResponse::ok(
        "contents loaded",
        Page {
            items: contents.into_iter().map(ContentView::from).collect(),
            page: params.page,
            limit: params.limit,
            total,
        },
    ))
}

pub async fn create_content(
    State(db): State<Database>,
    AuthUser(identity): AuthUser,
    ValidJson(request): ValidJson<CreateContentRequest>,
) -> ApiResult<ContentView> {
    let organization_id = identity.require_writer()?;
    let actor = identity.actor();
    let now = time::now();

    let content = Content {
        id: uuid::Uuid::new_v4().to_string(),
        organization_id: organization_id.to_string(),
        kind: request.kind.trim().to_string(),
        title: request.title.trim().to_string(),
        slug: request.slug(),
        body: request.body,
        status: request.status,
        metadata: metadata_text(&request.metadata)?,
        created_by: actor.clone(),
        created_at: now,
        updated_by: actor,
        updated_at: now,
    };
    repository::insert(&db, &content).await.map_err(slug_conflict)?;
    tracing::info!("Content {} ({}) created in organization {}", content.id, content.slug, organization_id);

    Ok(ApiResponse::created("content created", content.into()))
}

pub async fn get_content(
    State(db): State<Database>,
    AuthUser(identity): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<ContentView> {
    let organization_id = identity.organization_id()?;
    let content = repository::find(&db, organization_id, &id, visible_status(&identity))
        .await?
        .ok_or_else(not_found)?;
    Ok(ApiResponse::ok("content loaded", content.into()))
}

pub async fn update_content(
    State(db): State<Database>,
    AuthUser(identity): AuthUser,
    Path(id): Path<String>,
    ValidJson(request): ValidJson<UpdateContentRequest>,
) -> ApiResult<ContentView> {
    let organization_id = identity.require_writer()?;
    let changes = ContentChanges {
        kind: request.kind.map(|k| k.trim().to_string()),
        title: request.title.map(|t| t.trim().to_string()),
        slug: request.slug.map(|s| s.trim().to_string()),
        body: request.body,
        status: request.status,
        metadata: request.metadata.as_ref().map(metadata_text).transpose()?,
    };

    let updated = repository::update(&db, organization_id, &id, &changes, &identity.actor())
        .await
        .map_err(slug_conflict)?;
    if !updated {
        return Err(not_found());
    }
    let content = repository::find(&db, organization_id, &id, None)
        .await?
        .ok_or_else(not_found)?;
    tracing::info!("Content {} updated by {}", id, identity.actor());
    Ok(ApiResponse::ok("content updated", content.into()))
}

pub async fn delete_content(
    State(db): State<Database>,
    AuthUser(identity): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let organization_id = identity.require_admin()?;
    if !repository::delete(&db, organization_id, &id).await? {
        return Err(not_found());
    }
    tracing::info!("Content {} deleted by {}", id, identity.actor());
    Ok(ApiResponse::message("content deleted"))
}
