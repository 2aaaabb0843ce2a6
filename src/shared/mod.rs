//! Shared Module
//!
//! This module contains types and helpers that have no dependency on the
//! HTTP server: configuration, validation errors, string helpers and the
//! timestamp representation used by every stored record.

/// Shared error types
pub mod error;

/// Application configuration
pub mod config;

/// String and placeholder helpers
pub mod strings;

/// Unix timestamp helpers
pub mod time;

/// Re-export commonly used types for convenience
pub use error::{FieldError, SharedError};
pub use config::{AppConfig, ConfigError};
