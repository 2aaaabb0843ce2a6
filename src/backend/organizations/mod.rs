//! Organizations Module
//!
//! Tenants of the marketplace and their memberships.
//!
//! - **`models`** - rows, views and request bodies
//! - **`repository`** - SQL for organizations and `organization_users`
//! - **`service`** - founding, joining and member management rules
//! - **`handlers`** - `/api/organization` routes
//!
//! Session tokens snapshot the membership at issue time. Role or activation
//! changes take effect on the member's next login.

pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;
