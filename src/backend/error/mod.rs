//! Backend Error Module
//!
//! - **`types`** - [`ApiError`], its status codes and envelope messages
//! - **`conversion`** - `From` impls for layer errors and `IntoResponse`
//!
//! Handlers return `Result<ApiResponse<T>, ApiError>`; every error leaves the
//! server as the same JSON envelope as a success, with `success: false`.

/// Error type definitions
pub mod types;

/// Error conversion implementations
pub mod conversion;

pub use conversion::ErrorRecord;
pub use types::ApiError;
