//! Backend Module
//!
//! All server-side code for the tourfleet marketplace API: an Axum HTTP
//! server in front of application services and SQL repositories.
//!
//! # Overview
//!
//! - **`server`** - configuration loading, handle construction, `AppState`
//! - **`routes`** - router assembly and layer ordering
//! - **`middleware`** - transaction ids, audit capture, dual authentication
//! - **`auth`** - registration, OTP verification, login, password reset
//! - **`users`**, **`organizations`** - accounts and tenants
//! - **`fleets`**, **`tour_packages`**, **`content`** - tenant-scoped catalogues
//! - **`checkout`**, **`dashboard`**, **`uploads`** - orders, statistics, files
//! - **`db`**, **`cache`**, **`email`**, **`audit`** - infrastructure handles
//! - **`error`**, **`response`**, **`extract`** - the response envelope
//!
//! # Request Flow
//!
//! ```text
//! request -> transaction middleware -> (auth middleware) -> handler
//!         -> service -> repository / cache / mailer
//!         -> envelope (+ audit entry on error)
//! ```

pub mod audit;
pub mod auth;
pub mod cache;
pub mod checkout;
pub mod content;
pub mod dashboard;
pub mod db;
pub mod email;
pub mod error;
pub mod extract;
pub mod fleets;
pub mod middleware;
pub mod organizations;
pub mod response;
pub mod routes;
pub mod server;
pub mod tour_packages;
pub mod uploads;
pub mod users;

pub use error::ApiError;
pub use server::{create_app, AppState};
