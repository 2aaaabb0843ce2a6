//! Tourfleet - Main Library
//!
//! Tourfleet is the backend of a multi-tenant travel and rental marketplace.
//! Organizations list their fleets (vehicles) and tour packages, publish
//! content, and take orders; users register with an emailed one-time code
//! and authenticate with signed session tokens or organization API keys.
//!
//! # Module Structure
//!
//! - **`shared`** - Types with no server dependencies
//!   - Configuration loading (JSON file + environment overrides)
//!   - Field validation errors
//!   - String and timestamp helpers
//!
//! - **`backend`** - Server-side code (only compiled with `ssr` feature)
//!   - Axum router, middleware and the response envelope
//!   - Authentication: password hashing, token codec, OTP, sessions
//!   - Domain modules: users, organizations, fleets, tour packages,
//!     content, checkout, dashboard, uploads
//!   - Infrastructure handles: database, code cache, mailer, audit log
//!
//! # Feature Flags
//!
//! - **`ssr`** (default) - Enables the backend modules and the server binary.
//!
//! # Usage
//!
//! ```rust,no_run
//! use tourfleet::backend::server::init::create_app;
//! use tourfleet::shared::config::AppConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load()?;
//! let app = create_app(config).await?;
//! // Serve `app` with axum::serve
//! # Ok(())
//! # }
//! ```

/// Shared types and helpers
pub mod shared;

/// Backend server-side code
#[cfg(feature = "ssr")]
pub mod backend;
