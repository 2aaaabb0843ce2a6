//! Middleware Module
//!
//! - **`transaction`** - transaction ids, JSON body capture and the audit
//!   trail for failed requests; wraps the whole API
//! - **`auth`** - dual (API key or bearer) and bearer-only authentication,
//!   plus the [`Identity`] role checks handlers use
//!
//! # Example
//!
//! ```rust,no_run
//! use axum::{middleware, routing::get, Router};
//! use tourfleet::backend::middleware::require_bearer;
//! use tourfleet::backend::server::AppState;
//!
//! fn protected(state: AppState) -> Router<AppState> {
//!     Router::new()
//!         .route("/api/auth/me", get(|| async { "me" }))
//!         .route_layer(middleware::from_fn_with_state(state, require_bearer))
//! }
//! ```

pub mod auth;
pub mod transaction;

pub use auth::{require_auth, require_bearer, AuthUser, Identity, API_KEY_HEADER};
pub use transaction::{transaction_middleware, TRANSACTION_HEADER};
