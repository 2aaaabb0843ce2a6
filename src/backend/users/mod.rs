//! Users Module
//!
//! Profile updates for the signed-in user and account management for
//! organization admins. The `users` table and its queries live in
//! [`crate::backend::auth::users`].

pub mod handlers;
pub mod models;
pub mod service;
