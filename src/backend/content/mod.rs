//! Content Module
//!
//! Organization-authored entries (articles, pages, banners, ...) addressed
//! by a per-organization slug, with a free-form JSON `metadata` object.

pub mod handlers;
pub mod models;
pub mod repository;
