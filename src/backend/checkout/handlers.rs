/**
 * Checkout and Order Handlers
 *
 * Bearer token or API key.
 *
 * - `POST /api/checkout/summary` - price an item without ordering
 * - `POST /api/orders` - place a pending order
 * - `GET /api/orders?status=&search=&page=&limit=` - list
 * - `GET /api/orders/{id}` - one order
 * - `PUT /api/orders/{id}/status` - move along the status machine (admin, staff)
 */

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use serde::Deserialize;

use crate::backend::checkout::models::{
    CreateOrderRequest, OrderStatus, OrderView, Summary, SummaryRequest, UpdateOrderStatusRequest,
};
use crate::backend::checkout::{repository, service};
use crate::backend::db::Database;
use crate::backend::error::ApiError;
use crate::backend::extract::{ListParams, ValidJson};
use crate::backend::middleware::AuthUser;
use crate::backend::response::{ApiResponse, ApiResult, Page};
use crate::shared::config::AppConfig;

#[derive(Debug, Default, Deserialize)]
pub struct OrderFilter {
    pub status: Option<String>,
}

pub async fn checkout_summary(
    State(db): State<Database>,
    State(config): State<Arc<AppConfig>>,
    AuthUser(identity): AuthUser,
    ValidJson(request): ValidJson<SummaryRequest>,
) -> ApiResult<Summary> {
    let organization_id = identity.organization_id()?;
    let summary =
        service::summarize(&db, organization_id, &request, config.checkout.tax_percent).await?;
    Ok(ApiResponse::ok("checkout summary", summary))
}

pub async fn create_order(
    State(db): State<Database>,
    State(config): State<Arc<AppConfig>>,
    AuthUser(identity): AuthUser,
    ValidJson(request): ValidJson<CreateOrderRequest>,
) -> ApiResult<OrderView> {
    let order = service::place_order(&db, &identity, request, config.checkout.tax_percent).await?;
    Ok(ApiResponse::created("order placed", order.into()))
}

pub async fn list_orders(
    State(db): State<Database>,
    AuthUser(identity): AuthUser,
    Query(filter): Query<OrderFilter>,
    params: ListParams,
) -> ApiResult<Page<OrderView>> {
    // Orders carry customer contact details; partners only place them.
    let organization_id = identity.require_writer()?;
    let status = filter
        .status
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse::<OrderStatus>)
        .transpose()
        .map_err(ApiError::bad_request)?;

    let (orders, total) = repository::list(&db, organization_id, &params, status).await?;
    Ok(ApiResponse::ok(
        "orders loaded",
        Page {
            items: orders.into_iter().map(OrderView::from).collect(),
            page: params.page,
            limit: params.limit,
            total,
        },
    ))
}

pub async fn get_order(
    State(db): State<Database>,
    AuthUser(identity): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<OrderView> {
    let organization_id = identity.require_writer()?;
    let order = repository::find(&db, organization_id, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("order not found"))?;
    Ok(ApiResponse::ok("order loaded", order.into()))
}

pub async fn update_order_status(
    State(db): State<Database>,
    AuthUser(identity): AuthUser,
    Path(id): Path<String>,
    ValidJson(request): ValidJson<UpdateOrderStatusRequest>,
) -> ApiResult<OrderView> {
    let next: OrderStatus = request.status.parse().map_err(ApiError::bad_request)?;
    let order = service::change_status(&db, &identity, &id, next).await?;
    Ok(ApiResponse::ok("order status updated", order.into()))
}
