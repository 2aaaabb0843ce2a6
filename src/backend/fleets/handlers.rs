/**
 * Fleet Handlers
 *
 * Bearer token or API key.
 *
 * - `GET /api/fleets` - list (any member or partner)
 * - `POST /api/fleets` - create (admin, staff)
 * - `GET /api/fleets/{id}` - one fleet (any member or partner)
 * - `PUT /api/fleets/{id}` - update (admin, staff)
 * - `DELETE /api/fleets/{id}` - delete (admin)
 */

use axum::extract::{Path, State};

use crate::backend::db::Database;
use crate::backend::error::ApiError;
use crate::backend::extract::{ListParams, ValidJson};
use crate::backend::fleets::models::{CreateFleetRequest, Fleet, FleetView, UpdateFleetRequest};
use crate::backend::fleets::repository;
use crate::backend::middleware::AuthUser;
use crate::backend::response::{ApiResponse, ApiResult, Page};
use crate::shared::time;

fn not_found() -> ApiError {
    ApiError::not_found("fleet not found")
}

pub async fn list_fleets(
    State(db): State<Database>,
    AuthUser(identity): AuthUser,
    params: ListParams,
) -> ApiResult<Page<FleetView>> {
    let organization_id = identity.organization_id()?;
    let (fleets, total) = repository::list(&db, organization_id, &params).await?;
    Ok(ApiResponse::ok(
        "fleets loaded",
        Page {
            items: fleets.into_iter().map(FleetView::from).collect(),
            page: params.page,
            limit: params.limit,
            total,
        },
    ))
}

pub async fn create_fleet(
    State(db): State<Database>,
    AuthUser(identity): AuthUser,
    ValidJson(request): ValidJson<CreateFleetRequest>,
) -> ApiResult<FleetView> {
    let organization_id = identity.require_writer()?;
    let actor = identity.actor();
    let now = time::now();

    let fleet = Fleet {
        id: uuid::Uuid::new_v4().to_string(),
        organization_id: organization_id.to_string(),
        name: request.name.trim().to_string(),
        fleet_type: request.fleet_type.trim().to_string(),
        plate_number: request.plate_number.map(|p| p.trim().to_string()),
        capacity: request.capacity,
        price_per_day: request.price_per_day,
        description: request.description,
        image: request.image,
        is_available: i64::from(request.is_available),
        created_by: actor.clone(),
        created_at: now,
        updated_by: actor,
        updated_at: now,
    };
    repository::insert(&db, &fleet).await?;
    tracing::info!("Fleet {} created in organization {}", fleet.id, organization_id);

    Ok(ApiResponse::created("fleet created", fleet.into()))
}

pub async fn get_fleet(
    State(db): State<Database>,
    AuthUser(identity): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<FleetView> {
    let organization_id = identity.organization_id()?;
    let fleet = repository::find(&db, organization_id, &id)
        .await?
        .ok_or_else(not_found)?;
    Ok(ApiResponse::ok("fleet loaded", fleet.into()))
}

pub async fn update_fleet(
    State(db): State<Database>,
    AuthUser(identity): AuthUser,
    Path(id): Path<String>,
    ValidJson(request): ValidJson<UpdateFleetRequest>,
) -> ApiResult<FleetView> {
    let organization_id = identity.require_writer()?;
    if !repository::update(&db, organization_id, &id, &request, &identity.actor()).await? {
        return Err(not_found());
    }
    let fleet = repository::find(&db, organization_id, &id)
        .await?
        .ok_or_else(not_found)?;
    tracing::info!("Fleet {} updated by {}", id, identity.actor());
    Ok(ApiResponse::ok("fleet updated", fleet.into()))
}

pub async fn delete_fleet(
    State(db): State<Database>,
    AuthUser(identity): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let organization_id = identity.require_admin()?;
    if !repository::delete(&db, organization_id, &id).await? {
        return Err(not_found());
    }
    tracing::info!("Fleet {} deleted by {}", id, identity.actor());
    Ok(ApiResponse::message("fleet deleted"))
}
