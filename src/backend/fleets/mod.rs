//! Fleets Module
//!
//! Vehicles an organization rents out, priced per day.

pub mod handlers;
pub mod models;
pub mod repository;
