//! Server Module
//!
//! - **`config`** - builds the database, cache and mailer handles
//! - **`state`** - `AppState` and its `FromRef` projections
//! - **`init`** - `create_app`, the entry point used by the binary and tests

pub mod config;
pub mod init;
pub mod state;

pub use config::StartupError;
pub use init::create_app;
pub use state::AppState;
