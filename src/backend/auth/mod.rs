//! Authentication Module
//!
//! Registration with OTP email verification, login, password reset and the
//! token formats that carry identity between requests.
//!
//! # Module Structure
//!
//! ```text
//! auth/
//! ├── mod.rs       - Module exports and documentation
//! ├── users.rs     - User model and database operations
//! ├── password.rs  - bcrypt hashing
//! ├── cipher.rs    - ChaCha20-Poly1305 payload sealing
//! ├── sessions.rs  - signed tokens, reset tokens, API keys
//! ├── roles.rs     - membership roles
//! ├── otp.rs       - one-time codes in the code cache
//! ├── service.rs   - the account lifecycle
//! └── handlers/    - HTTP handlers
//! ```
//!
//! # Authentication Flow
//!
//! 1. **Register**: account created unverified, OTP emailed, verification token returned
//! 2. **Verify OTP**: verification token + code activate the account
//! 3. **Login**: email or phone + password return a session token
//! 4. **Reset**: reset link emailed; reset or session token rotates the password
//!
//! # Security
//!
//! - Passwords are hashed with bcrypt before storage
//! - Session tokens expose only display names; identifiers are sealed
//! - Invalid credentials return 401 whether or not the account exists
//! - The signing secret has no fallback; startup fails without it

pub mod cipher;
pub mod handlers;
pub mod otp;
pub mod password;
pub mod roles;
pub mod service;
pub mod sessions;
pub mod users;

pub use roles::Role;
pub use service::{AuthError, AuthService};
pub use sessions::TokenCodec;
