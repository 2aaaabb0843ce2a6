/**
 * Tour Package Models
 */

use serde::{Deserialize, Serialize};

use crate::shared::error::{FieldErrors, SharedError, Validate};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TourPackage {
    pub id: String,
    pub organization_id: String,
    pub name: String,
    pub destination: String,
    pub description: Option<String>,
    pub duration_days: i64,
    /// Per participant
    pub price: i64,
    pub max_participants: i64,
    pub image: Option<String>,
    pub is_published: i64,
    pub created_by: String,
    pub created_at: i64,
    pub updated_by: String,
    pub updated_at: i64,
}

impl TourPackage {
    pub fn is_published(&self) -> bool {
        self.is_published != 0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TourPackageView {
    pub id: String,
    pub name: String,
    pub destination: String,
    pub description: Option<String>,
    pub duration_days: i64,
    pub price: i64,
    pub max_participants: i64,
    pub image: Option<String>,
    pub is_published: bool,
    pub created_by: String,
    #[serde(with = "crate::shared::time::rfc3339")]
    pub created_at: i64,
    pub updated_by: String,
    #[serde(with = "crate::shared::time::rfc3339")]
    pub updated_at: i64,
}

impl From<TourPackage> for TourPackageView {
    fn from(package: TourPackage) -> Self {
        let is_published = package.is_published();
        Self {
            id: package.id,
            name: package.name,
            destination: package.destination,
            description: package.description,
            duration_days: package.duration_days,
            price: package.price,
            max_participants: package.max_participants,
            image: package.image,
            is_published,
            created_by: package.created_by,
            created_at: package.created_at,
            updated_by: package.updated_by,
            updated_at: package.updated_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTourPackageRequest {
    pub name: String,
    pub destination: String,
    pub description: Option<String>,
    pub duration_days: i64,
    pub price: i64,
    pub max_participants: i64,
    pub image: Option<String>,
    #[serde(default)]
    pub is_published: bool,
}

impl Validate for CreateTourPackageRequest {
    fn validate(&self) -> Result<(), SharedError> {
        let mut errors = FieldErrors::new();
        if errors.required("name", &self.name) {
            errors.length("name", self.name.trim(), 3, 150);
        }
        if errors.required("destination", &self.destination) {
            errors.length("destination", self.destination.trim(), 2, 150);
        }
        errors.positive("duration_days", self.duration_days);
        errors.non_negative("price", self.price);
        errors.positive("max_participants", self.max_participants);
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTourPackageRequest {
    pub name: Option<String>,
    pub destination: Option<String>,
    pub description: Option<String>,
    pub duration_days: Option<i64>,
    pub price: Option<i64>,
    pub max_participants: Option<i64>,
    pub image: Option<String>,
    pub is_published: Option<bool>,
}

impl Validate for UpdateTourPackageRequest {
    fn validate(&self) -> Result<(), SharedError> {
        let mut errors = FieldErrors::new();
        if let Some(name) = &self.name {
            errors.length("name", name.trim(), 3, 150);
        }
        if let Some(destination) = &self.destination {
            errors.length("destination", destination.trim(), 2, 150);
        }
        if let Some(days) = self.duration_days {
            errors.positive("duration_days", days);
        }
        if let Some(price) = self.price {
            errors.non_negative("price", price);
        }
        if let Some(max) = self.max_participants {
            errors.positive("max_participants", max);
        }
        errors.into_result()
    }
}
