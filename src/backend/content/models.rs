/**
 * Content Models
 *
 * Articles, pages, banners and similar entries published by an
 * organization. `metadata` is a free-form JSON object stored as text.
 */

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::shared::error::{FieldErrors, SharedError, Validate};
use crate::shared::strings::slugify;

pub const STATUSES: &[&str] = &["draft", "published", "archived"];
pub const PUBLISHED: &str = "published";

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Content {
    pub id: String,
    pub organization_id: String,
    pub kind: String,
    pub title: String,
    /// Unique within the organization
    pub slug: String,
    pub body: String,
    pub status: String,
    /// JSON object text
    pub metadata: String,
    pub created_by: String,
    pub created_at: i64,
    pub updated_by: String,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContentView {
    pub id: String,
    pub kind: String,
    pub title: String,
    pub slug: String,
    pub body: String,
    pub status: String,
    pub metadata: Value,
    pub created_by: String,
    #[serde(with = "crate::shared::time::rfc3339")]
    pub created_at: i64,
    pub updated_by: String,
    #[serde(with = "crate::shared::time::rfc3339")]
    pub updated_at: i64,
}

impl From<Content> for ContentView {
    fn from(content: Content) -> Self {
        let metadata = serde_json::from_str(&content.metadata).unwrap_or_else(|e| {
            tracing::warn!("Content {} has unreadable metadata: {}", content.id, e);
            Value::Object(Map::new())
        });
        Self {
            id: content.id,
            kind: content.kind,
            title: content.title,
            slug: content.slug,
            body: content.body,
            status: content.status,
            metadata,
            created_by: content.created_by,
            created_at: content.created_at,
            updated_by: content.updated_by,
            updated_at: content.updated_at,
        }
    }
}

fn check_slug(errors: &mut FieldErrors, slug: &str) {
    if slugify(slug) != slug {
        errors.push("slug", "slug may only contain lowercase letters, numbers and single dashes");
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateContentRequest {
    pub kind: String,
    pub title: String,
    /// Derived from the title when absent
    pub slug: Option<String>,
    #[serde(default)]
    pub body: String,
    #[serde(default = "draft")]
    pub status: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

fn draft() -> String {
    "draft".to_string()
}

impl CreateContentRequest {
    pub fn slug(&self) -> String {
        match self.slug.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(slug) => slug.to_string(),
            None => slugify(&self.title),
        }
    }
}

impl Validate for CreateContentRequest {
    fn validate(&self) -> Result<(), SharedError> {
        let mut errors = FieldErrors::new();
        if errors.required("kind", &self.kind) {
            errors.length("kind", self.kind.trim(), 2, 30);
        }
        if errors.required("title", &self.title) {
            errors.length("title", self.title.trim(), 1, 200);
        }
        let slug = self.slug();
        if slug.is_empty() {
            errors.push("slug", "slug could not be derived from the title");
        } else {
            check_slug(&mut errors, &slug);
        }
        errors.one_of("status", &self.status, STATUSES);
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateContentRequest {
    pub kind: Option<String>,
    pub title: Option<String>,
    pub slug: Option<String>,
    pub body: Option<String>,
    pub status: Option<String>,
    /// Replaces the stored object
    pub metadata: Option<Map<String, Value>>,
}

impl Validate for UpdateContentRequest {
    fn validate(&self) -> Result<(), SharedError> {
        let mut errors = FieldErrors::new();
        if let Some(kind) = &self.kind {
            errors.length("kind", kind.trim(), 2, 30);
        }
        if let Some(title) = &self.title {
            errors.length("title", title.trim(), 1, 200);
        }
        if let Some(slug) = &self.slug {
            if errors.required("slug", slug) {
                check_slug(&mut errors, slug.trim());
            }
        }
        if let Some(status) = &self.status {
            errors.one_of("status", status, STATUSES);
        }
        errors.into_result()
    }
}
