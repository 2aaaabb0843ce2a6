/**
 * Fleet Models
 */

use serde::{Deserialize, Serialize};

use crate::shared::error::{FieldErrors, SharedError, Validate};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Fleet {
    pub id: String,
    pub organization_id: String,
    pub name: String,
    /// car, van, bus, motorcycle, boat, ...
    pub fleet_type: String,
    pub plate_number: Option<String>,
    /// Seats
    pub capacity: i64,
    /// Whole currency units
    pub price_per_day: i64,
    pub description: Option<String>,
    pub image: Option<String>,
    pub is_available: i64,
    pub created_by: String,
    pub created_at: i64,
    pub updated_by: String,
    pub updated_at: i64,
}

impl Fleet {
    pub fn is_available(&self) -> bool {
        self.is_available != 0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FleetView {
    pub id: String,
    pub name: String,
    pub fleet_type: String,
    pub plate_number: Option<String>,
    pub capacity: i64,
    pub price_per_day: i64,
    pub description: Option<String>,
    pub image: Option<String>,
    pub is_available: bool,
    pub created_by: String,
    #[serde(with = "crate::shared::time::rfc3339")]
    pub created_at: i64,
    pub updated_by: String,
    #[serde(with = "crate::shared::time::rfc3339")]
    pub updated_at: i64,
}

impl From<Fleet> for FleetView {
    fn from(fleet: Fleet) -> Self {
        let is_available = fleet.is_available();
        Self {
            id: fleet.id,
            name: fleet.name,
            fleet_type: fleet.fleet_type,
            plate_number: fleet.plate_number,
            capacity: fleet.capacity,
            price_per_day: fleet.price_per_day,
            description: fleet.description,
            image: fleet.image,
            is_available,
            created_by: fleet.created_by,
            created_at: fleet.created_at,
            updated_by: fleet.updated_by,
            updated_at: fleet.updated_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateFleetRequest {
    pub name: String,
    pub fleet_type: String,
    pub plate_number: Option<String>,
    pub capacity: i64,
    pub price_per_day: i64,
    pub description: Option<String>,
    pub image: Option<String>,
    #[serde(default = "available_by_default")]
    pub is_available: bool,
}

fn available_by_default() -> bool {
    true
}

impl Validate for CreateFleetRequest {
    fn validate(&self) -> Result<(), SharedError> {
        let mut errors = FieldErrors::new();
        if errors.required("name", &self.name) {
            errors.length("name", self.name.trim(), 2, 100);
        }
        if errors.required("fleet_type", &self.fleet_type) {
            errors.length("fleet_type", self.fleet_type.trim(), 2, 50);
        }
        if let Some(plate) = &self.plate_number {
            errors.length("plate_number", plate.trim(), 1, 20);
        }
        errors.positive("capacity", self.capacity);
        errors.non_negative("price_per_day", self.price_per_day);
        errors.into_result()
    }
}

/// Partial update; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateFleetRequest {
    pub name: Option<String>,
    pub fleet_type: Option<String>,
    pub plate_number: Option<String>,
    pub capacity: Option<i64>,
    pub price_per_day: Option<i64>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub is_available: Option<bool>,
}

impl Validate for UpdateFleetRequest {
    fn validate(&self) -> Result<(), SharedError> {
        let mut errors = FieldErrors::new();
        if let Some(name) = &self.name {
            errors.length("name", name.trim(), 2, 100);
        }
        if let Some(fleet_type) = &self.fleet_type {
            errors.length("fleet_type", fleet_type.trim(), 2, 50);
        }
        if let Some(capacity) = self.capacity {
            errors.positive("capacity", capacity);
        }
        if let Some(price) = self.price_per_day {
            errors.non_negative("price_per_day", price);
        }
        errors.into_result()
    }
}
