/**
 * Order Database Operations
 */

use crate::backend::checkout::models::{Order, OrderStatus};
use crate::backend::db::{Database, StoreContext, StoreError};
use crate::backend::extract::ListParams;
use crate::shared::time;

const ORDER_COLUMNS: &str = "id, organization_id, item_kind, item_id, item_name, quantity, days, \
     unit_price, subtotal, tax, total, customer_name, customer_email, customer_phone, start_date, \
     status, placed_by, created_at, updated_at";

/// Orders placed in a period and the revenue of those not cancelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, sqlx::FromRow)]
pub struct PeriodTotals {
    pub orders: i64,
    pub revenue: i64,
}

pub async fn insert(db: &Database, order: &Order) -> Result<(), StoreError> {
    let sql = db.sql(&format!(
        "INSERT INTO orders ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        ORDER_COLUMNS
    ));
    sqlx::query(&sql)
        .bind(&order.id)
        .bind(&order.organization_id)
        .bind(&order.item_kind)
        .bind(&order.item_id)
        .bind(&order.item_name)
        .bind(order.quantity)
        .bind(order.days)
        .bind(order.unit_price)
        .bind(order.subtotal)
        .bind(order.tax)
        .bind(order.total)
        .bind(&order.customer_name)
        .bind(&order.customer_email)
        .bind(&order.customer_phone)
        .bind(&order.start_date)
        .bind(&order.status)
        .bind(&order.placed_by)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(db.pool())
        .await
        .context("insert order")?;
    Ok(())
}

pub async fn find(db: &Database, organization_id: &str, id: &str) -> Result<Option<Order>, StoreError> {
    let sql = db.sql(&format!(
        "SELECT {} FROM orders WHERE organization_id = ? AND id = ?",
        ORDER_COLUMNS
    ));
    sqlx::query_as::<_, Order>(&sql)
        .bind(organization_id)
        .bind(id)
        .fetch_optional(db.pool())
        .await
        .context("load order")
}

pub async fn list(
    db: &Database,
    organization_id: &str,
    params: &ListParams,
    status: Option<OrderStatus>,
) -> Result<(Vec<Order>, i64), StoreError> {
    let pattern = params.pattern();
    let mut filter = String::from("organization_id = ?");
    if status.is_some() {
        filter.push_str(" AND status = ?");
    }
    if pattern.is_some() {
        filter.push_str(" AND (LOWER(customer_name) LIKE ? OR LOWER(item_name) LIKE ?)");
    }

    let count_sql = db.sql(&format!("SELECT COUNT(*) FROM orders WHERE {}", filter));
    let mut count = sqlx::query_as::<_, (i64,)>(&count_sql).bind(organization_id);
    if let Some(status) = status {
        count = count.bind(status.as_str());
    }
    if let Some(pattern) = &pattern {
        count = count.bind(pattern.clone()).bind(pattern.clone());
    }
    let (total,) = count.fetch_one(db.pool()).await.context("count orders")?;

    let sql = db.sql(&format!(
        "SELECT {} FROM orders WHERE {} ORDER BY created_at DESC, id LIMIT ? OFFSET ?",
        ORDER_COLUMNS, filter
    ));
    let mut query = sqlx::query_as::<_, Order>(&sql).bind(organization_id);
    if let Some(status) = status {
        query = query.bind(status.as_str());
    }
    if let Some(pattern) = &pattern {
        query = query.bind(pattern.clone()).bind(pattern.clone());
    }
    let orders = query
        .bind(i64::from(params.limit))
        .bind(params.offset())
        .fetch_all(db.pool())
        .await
        .context("list orders")?;

    Ok((orders, total))
}

/// Move an order from `from` to `to`; false when it was no longer in `from`.
pub async fn update_status(
    db: &Database,
    organization_id: &str,
    id: &str,
    from: OrderStatus,
    to: OrderStatus,
) -> Result<bool, StoreError> {
    let sql = db.sql(
        "UPDATE orders SET status = ?, updated_at = ? \
         WHERE organization_id = ? AND id = ? AND status = ?",
    );
    let result = sqlx::query(&sql)
        .bind(to.as_str())
        .bind(time::now())
        .bind(organization_id)
        .bind(id)
        .bind(from.as_str())
        .execute(db.pool())
        .await
        .context("update order status")?;
    Ok(result.rows_affected() > 0)
}

/// Non-cancelled order count and revenue for orders created in `[start, end)`
pub async fn period_totals(
    db: &Database,
    organization_id: &str,
    start: i64,
    end: i64,
) -> Result<PeriodTotals, StoreError> {
    let sql = db.sql(
        "SELECT CAST(COALESCE(SUM(CASE WHEN status <> 'cancelled' THEN 1 ELSE 0 END), 0) AS BIGINT) AS orders, \
                CAST(COALESCE(SUM(CASE WHEN status <> 'cancelled' THEN total ELSE 0 END), 0) AS BIGINT) AS revenue \
         FROM orders \
         WHERE organization_id = ? AND created_at >= ? AND created_at < ?",
    );
    sqlx::query_as::<_, PeriodTotals>(&sql)
        .bind(organization_id)
        .bind(start)
        .bind(end)
        .fetch_one(db.pool())
        .await
        .context("order totals")
}
