//! Routes Module
//!
//! - **`router`** - top-level router, outer layers, health and fallback
//! - **`api_routes`** - `/api` route groups and their auth guards

pub mod api_routes;
pub mod router;

pub use router::create_router;
