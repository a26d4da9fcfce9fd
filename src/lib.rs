//! mustwatch-server: HTTP CRUD service for the MustWatch TV series catalog
//!
//! A thin axum layer over a generic table accessor: each request names an
//! allow-listed catalog table, the accessor builds the corresponding SQL
//! statement and runs it over a request-scoped SQLite connection.

pub mod accessor;
pub mod catalog;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod server;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use server::{run_server, ServerArgs};
pub use state::AppState;
