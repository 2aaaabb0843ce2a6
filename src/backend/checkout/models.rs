/**
 * Checkout and Order Models
 */

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::shared::error::{FieldErrors, SharedError, Validate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Fleet,
    TourPackage,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fleet => "fleet",
            Self::TourPackage => "tour_package",
        }
    }
}

impl FromStr for ItemKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "fleet" => Ok(Self::Fleet),
            "tour_package" => Ok(Self::TourPackage),
            other => Err(format!("unknown item kind: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
    Completed,
    Cancelled,
}

pub const ORDER_STATUSES: &[&str] = &["pending", "paid", "completed", "cancelled"];

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// `pending -> paid -> completed`, and `pending | paid -> cancelled`
    pub fn can_become(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Paid)
                | (Self::Paid, Self::Completed)
                | (Self::Pending, Self::Cancelled)
                | (Self::Paid, Self::Cancelled)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(format!("unknown order status: {}", other)),
        }
    }
}

/// What is being priced
#[derive(Debug, Clone, Deserialize)]
pub struct SummaryRequest {
    pub item_kind: ItemKind,
    pub item_id: String,
    pub quantity: i64,
    /// Rental days; required for fleets, ignored for tour packages
    pub days: Option<i64>,
}

impl SummaryRequest {
    fn check(&self, errors: &mut FieldErrors) {
        errors.required("item_id", &self.item_id);
        errors.positive("quantity", self.quantity);
        if let Some(days) = self.days {
            errors.positive("days", days);
        }
    }
}

impl Validate for SummaryRequest {
    fn validate(&self) -> Result<(), SharedError> {
        let mut errors = FieldErrors::new();
        self.check(&mut errors);
        errors.into_result()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub item_kind: ItemKind,
    pub item_id: String,
    pub item_name: String,
    pub unit_price: i64,
    pub quantity: i64,
    pub days: i64,
    pub subtotal: i64,
    pub tax_percent: u32,
    pub tax: i64,
    pub total: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(flatten)]
    pub item: SummaryRequest,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    /// `YYYY-MM-DD`
    pub start_date: Option<String>,
}

impl Validate for CreateOrderRequest {
    fn validate(&self) -> Result<(), SharedError> {
        let mut errors = FieldErrors::new();
        self.item.check(&mut errors);
        if errors.required("customer_name", &self.customer_name) {
            errors.length("customer_name", self.customer_name.trim(), 1, 100);
        }
        if errors.required("customer_email", &self.customer_email) {
            errors.email("customer_email", self.customer_email.trim());
        }
        if errors.required("customer_phone", &self.customer_phone) {
            errors.phone("customer_phone", self.customer_phone.trim());
        }
        if let Some(date) = &self.start_date {
            errors.date("start_date", date.trim());
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
}

impl Validate for UpdateOrderStatusRequest {
    fn validate(&self) -> Result<(), SharedError> {
        let mut errors = FieldErrors::new();
        errors.one_of("status", &self.status, ORDER_STATUSES);
        errors.into_result()
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Order {
    pub id: String,
    pub organization_id: String,
    pub item_kind: String,
    pub item_id: String,
    pub item_name: String,
    pub quantity: i64,
    pub days: i64,
    pub unit_price: i64,
    pub subtotal: i64,
    pub tax: i64,
    pub total: i64,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub start_date: Option<String>,
    pub status: String,
    /// `None` for orders placed with an API key
    pub placed_by: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
    pub id: String,
    pub item_kind: String,
    pub item_id: String,
    pub item_name: String,
    pub quantity: i64,
    pub days: i64,
    pub unit_price: i64,
    pub subtotal: i64,
    pub tax: i64,
    pub total: i64,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub start_date: Option<String>,
    pub status: String,
    pub placed_by: Option<String>,
    #[serde(with = "crate::shared::time::rfc3339")]
    pub created_at: i64,
    #[serde(with = "crate::shared::time::rfc3339")]
    pub updated_at: i64,
}

impl From<Order> for OrderView {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            item_kind: order.item_kind,
            item_id: order.item_id,
            item_name: order.item_name,
            quantity: order.quantity,
            days: order.days,
            unit_price: order.unit_price,
            subtotal: order.subtotal,
            tax: order.tax,
            total: order.total,
            customer_name: order.customer_name,
            customer_email: order.customer_email,
            customer_phone: order.customer_phone,
            start_date: order.start_date,
            status: order.status,
            placed_by: order.placed_by,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}
