/**
 * Checkout Service
 *
 * Prices an item of the caller's organization and turns a priced summary
 * into a pending order. Fleets are priced per unit per day; tour packages
 * per participant for the whole trip, so their `days` is always 1.
 */

use crate::backend::checkout::models::{
    CreateOrderRequest, ItemKind, Order, OrderStatus, Summary, SummaryRequest,
};
use crate::backend::checkout::pricing::price;
use crate::backend::checkout::repository;
use crate::backend::db::Database;
use crate::backend::error::ApiError;
use crate::backend::fleets::repository as fleets;
use crate::backend::middleware::Identity;
use crate::backend::tour_packages::repository as tour_packages;
use crate::shared::strings::normalize_email;
use crate::shared::time;

pub async fn summarize(
    db: &Database,
    organization_id: &str,
    request: &SummaryRequest,
    tax_percent: u32,
) -> Result<Summary, ApiError> {
    let (item_name, unit_price, days) = match request.item_kind {
        ItemKind::Fleet => {
            let fleet = fleets::find(db, organization_id, &request.item_id)
                .await?
                .ok_or_else(|| ApiError::not_found("fleet not found"))?;
            if !fleet.is_available() {
                return Err(ApiError::bad_request("fleet is not available"));
            }
            let days = request
                .days
                .ok_or_else(|| ApiError::bad_request("days is required for fleet rentals"))?;
            (fleet.name, fleet.price_per_day, days)
        }
        ItemKind::TourPackage => {
            let package = tour_packages::find(db, organization_id, &request.item_id, true)
                .await?
                .ok_or_else(|| ApiError::not_found("tour package not found"))?;
            if request.quantity > package.max_participants {
                return Err(ApiError::bad_request(format!(
                    "quantity exceeds the maximum of {} participants",
                    package.max_participants
                )));
            }
            (package.name, package.price, 1)
        }
    };

    let amounts = price(unit_price, request.quantity, days, tax_percent)
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    Ok(Summary {
        item_kind: request.item_kind,
        item_id: request.item_id.clone(),
        item_name,
        unit_price,
        quantity: request.quantity,
        days,
        subtotal: amounts.subtotal,
        tax_percent,
        tax: amounts.tax,
        total: amounts.total,
    })
}

pub async fn place_order(
    db: &Database,
    identity: &Identity,
    request: CreateOrderRequest,
    tax_percent: u32,
) -> Result<Order, ApiError> {
    let organization_id = identity.organization_id()?;
    let summary = summarize(db, organization_id, &request.item, tax_percent).await?;

    let now = time::now();
    let order = Order {
        id: uuid::Uuid::new_v4().to_string(),
        organization_id: organization_id.to_string(),
        item_kind: summary.item_kind.as_str().to_string(),
        item_id: summary.item_id,
        item_name: summary.item_name,
        quantity: summary.quantity,
        days: summary.days,
        unit_price: summary.unit_price,
        subtotal: summary.subtotal,
        tax: summary.tax,
        total: summary.total,
        customer_name: request.customer_name.trim().to_string(),
        customer_email: normalize_email(&request.customer_email),
        customer_phone: request.customer_phone.trim().to_string(),
        start_date: request
            .start_date
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty()),
        status: OrderStatus::Pending.as_str().to_string(),
        placed_by: identity.user_id.clone(),
        created_at: now,
        updated_at: now,
    };
    repository::insert(db, &order).await?;
    tracing::info!(
        "Order {} placed in organization {} by {} (total {})",
        order.id,
        organization_id,
        identity.actor(),
        order.total
    );
    Ok(order)
}

pub async fn change_status(
    db: &Database,
    identity: &Identity,
    id: &str,
    next: OrderStatus,
) -> Result<Order, ApiError> {
    let organization_id = identity.require_writer()?;
    let order = repository::find(db, organization_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("order not found"))?;

    let current: OrderStatus = order.status.parse().map_err(ApiError::internal)?;
    if !current.can_become(next) {
        return Err(ApiError::bad_request(format!(
            "order cannot move from {} to {}",
            current, next
        )));
    }
    if !repository::update_status(db, organization_id, id, current, next).await? {
        return Err(ApiError::conflict("order status changed concurrently, reload and retry"));
    }

    tracing::info!("Order {} moved {} -> {} by {}", id, current, next, identity.actor());
    repository::find(db, organization_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("order not found"))
}
