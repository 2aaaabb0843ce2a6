//! Tour Packages Module
//!
//! Guided trips sold per participant. Drafts (`is_published = false`) are
//! visible to members only.

pub mod handlers;
pub mod models;
pub mod repository;
