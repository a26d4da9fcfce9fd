//! Route handlers for the catalog API
//!
//! Organized by concern:
//! - catalog: generic CRUD over the allow-listed tables
//! - health: health check endpoint

pub mod catalog;
pub mod health;

pub use catalog::*;
pub use health::*;
