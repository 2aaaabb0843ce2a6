/**
 * Tour Package Handlers
 *
 * Bearer token or API key. Partners only see published packages.
 *
 * - `GET /api/tour-packages`, `GET /api/tour-packages/{id}` - read
 * - `POST /api/tour-packages`, `PUT /api/tour-packages/{id}` - admin, staff
 * - `DELETE /api/tour-packages/{id}` - admin
 */

use axum::extract::{Path, State};

use crate::backend::db::Database;
use crate::backend::error::ApiError;
use crate::backend::extract::{ListParams, ValidJson};
use crate::backend::middleware::AuthUser;
use crate::backend::response::{ApiResponse, ApiResult, Page};
use crate::backend::tour_packages::models::{
    CreateTourPackageRequest, TourPackage, TourPackageView, UpdateTourPackageRequest,
};
use crate::backend::tour_packages::repository;
use crate::shared::time;

fn not_found() -> ApiError {
    ApiError::not_found("tour package not found")
}

pub async fn list_tour_packages(
    State(db): State<Database>,
    AuthUser(identity): AuthUser,
    params: ListParams,
) -> ApiResult<Page<TourPackageView>> {
    let organization_id = identity.organization_id()?;
    let (packages, total) =
        repository::list(&db, organization_id, &params, identity.is_partner()).await?;
    Ok(ApiResponse::ok(
        "tour packages loaded",
        Page {
            items: packages.into_iter().map(TourPackageView::from).collect(),
            page: params.page,
            limit: params.limit,
            total,
        },
    ))
}

pub async fn create_tour_package(
    State(db): State<Database>,
    AuthUser(identity): AuthUser,
    ValidJson(request): ValidJson<CreateTourPackageRequest>,
) -> ApiResult<TourPackageView> {
    let organization_id = identity.require_writer()?;
    let actor = identity.actor();
    let now = time::now();

    let package = TourPackage {
        id: uuid::Uuid::new_v4().to_string(),
        organization_id: organization_id.to_string(),
        name: request.name.trim().to_string(),
        destination: request.destination.trim().to_string(),
        description: request.description,
        duration_days: request.duration_days,
        price: request.price,
        max_participants: request.max_participants,
        image: request.image,
        is_published: i64::from(request.is_published),
        created_by: actor.clone(),
        created_at: now,
        updated_by: actor,
        updated_at: now,
    };
    repository::insert(&db, &package).await?;
    tracing::info!("Tour package {} created in organization {}", package.id, organization_id);

    Ok(ApiResponse::created("tour package created", package.into()))
}

pub async fn get_tour_package(
    State(db): State<Database>,
    AuthUser(identity): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<TourPackageView> {
    let organization_id = identity.organization_id()?;
    let package = repository::find(&db, organization_id, &id, identity.is_partner())
        .await?
        .ok_or_else(not_found)?;
    Ok(ApiResponse::ok("tour package loaded", package.into()))
}

pub async fn update_tour_package(
    State(db): State<Database>,
    AuthUser(identity): AuthUser,
    Path(id): Path<String>,
    ValidJson(request): ValidJson<UpdateTourPackageRequest>,
) -> ApiResult<TourPackageView> {
    let organization_id = identity.require_writer()?;
    if !repository::update(&db, organization_id, &id, &request, &identity.actor()).await? {
        return Err(not_found());
    }
    let package = repository::find(&db, organization_id, &id, false)
        .await?
        .ok_or_else(not_found)?;
    tracing::info!("Tour package {} updated by {}", id, identity.actor());
    Ok(ApiResponse::ok("tour package updated", package.into()))
}

pub async fn delete_tour_package(
    State(db): State<Database>,
    AuthUser(identity): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let organization_id = identity.require_admin()?;
    if !repository::delete(&db, organization_id, &id).await? {
        return Err(not_found());
    }
    tracing::info!("Tour package {} deleted by {}", id, identity.actor());
    Ok(ApiResponse::message("tour package deleted"))
}
