//! Authentication Handlers
//!
//! - **`types`** - request bodies and validation
//! - **`register`** - `POST /api/auth/register`
//! - **`otp`** - `POST /api/auth/verify-otp`, `POST /api/auth/resend-otp`
//! - **`login`** - `POST /api/auth/login`
//! - **`password`** - `POST /api/auth/reset-password`, `POST /api/auth/update-password`
//! - **`me`** - `GET /api/auth/me`

pub mod login;
pub mod me;
pub mod otp;
pub mod password;
pub mod register;
pub mod types;

pub use login::login;
pub use me::get_me;
pub use otp::{resend_otp, verify_otp};
pub use password::{reset_password, update_password};
pub use register::register;
