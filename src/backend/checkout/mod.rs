//! Checkout Module
//!
//! Pricing summaries and orders for fleets and tour packages.
//!
//! - **`pricing`** - subtotal, tax and total arithmetic
//! - **`models`** - item kinds, the order status machine, request bodies
//! - **`repository`** - the `orders` table
//! - **`service`** - summary and order placement rules
//! - **`handlers`** - `/api/checkout` and `/api/orders` routes

pub mod handlers;
pub mod models;
pub mod pricing;
pub mod repository;
pub mod service;
