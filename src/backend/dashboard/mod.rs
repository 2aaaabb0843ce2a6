//! Dashboard Module
//!
//! `GET /api/dashboard` (bearer, members only): catalogue and member counts,
//! plus orders and revenue for the current calendar month (UTC) against the
//! previous one.

pub mod stats;

use axum::extract::State;
use chrono::Utc;

use crate::backend::checkout::repository as orders;
use crate::backend::db::Database;
use crate::backend::fleets::repository as fleets;
use crate::backend::middleware::AuthUser;
use crate::backend::organizations::repository as organizations;
use crate::backend::response::{ApiResponse, ApiResult};
use crate::backend::tour_packages::repository as tour_packages;
use crate::shared::time;

pub use stats::{percent_change, Comparison, DashboardStats};

pub async fn get_dashboard(
    State(db): State<Database>,
    AuthUser(identity): AuthUser,
) -> ApiResult<DashboardStats> {
    let organization_id = identity.organization_id()?;
    let (month_start, previous_start) = time::month_bounds(Utc::now());

    let current = orders::period_totals(&db, organization_id, month_start, i64::MAX).await?;
    let previous = orders::period_totals(&db, organization_id, previous_start, month_start).await?;

    let stats = DashboardStats {
        fleets: fleets::count(&db, organization_id).await?,
        tour_packages: tour_packages::count(&db, organization_id).await?,
        members: organizations::count_members(&db, organization_id).await?,
        orders: Comparison::new(current.orders, previous.orders),
        revenue: Comparison::new(current.revenue, previous.revenue),
    };
    Ok(ApiResponse::ok("dashboard loaded", stats))
}
