//! Application state shared across handlers

use std::sync::Arc;
use std::time::Instant;

use crate::catalog::TableRegistry;
use crate::db::SqliteDatabase;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    db: SqliteDatabase,
    registry: Arc<TableRegistry>,
    started_at: Instant,
}

impl AppState {
    pub fn new(db: SqliteDatabase, registry: TableRegistry) -> Self {
        Self {
            db,
            registry: Arc::new(registry),
            started_at: Instant::now(),
        }
    }

    pub fn db(&self) -> &SqliteDatabase {
        &self.db
    }

    pub fn registry(&self) -> &TableRegistry {
        &self.registry
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }
}
