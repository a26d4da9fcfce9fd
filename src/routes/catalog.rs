//! Catalog routes - generic CRUD over the allow-listed tables
//!
//! Each request builds one accessor and runs exactly one operation; the
//! accessor owns validation and error classification.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::accessor::{Item, TableAccessor};
use crate::db::Row;
use crate::error::ApiResult;
use crate::models::MutationResponse;
use crate::state::AppState;

/// GET /catalog/:table - List all rows of a table
pub async fn list_rows(
    State(state): State<AppState>,
    Path(table): Path<String>,
) -> ApiResult<Json<Vec<Row>>> {
    let accessor = TableAccessor::new(state.registry(), &table, None);
    let rows = accessor.query(state.db(), None)?;
    Ok(Json(rows))
}

/// GET /catalog/:table/:id - Get the rows matching the primary key
pub async fn get_row(
    State(state): State<AppState>,
    Path((table, id)): Path<(String, i64)>,
) -> ApiResult<Json<Vec<Row>>> {
    let accessor = TableAccessor::new(state.registry(), &table, None);
    let rows = accessor.query(state.db(), Some(id))?;
    Ok(Json(rows))
}

/// POST /catalog/:table - Insert a row built from the JSON body
pub async fn insert_row(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Json(item): Json<Item>,
) -> ApiResult<Json<MutationResponse>> {
    let accessor = TableAccessor::new(state.registry(), &table, Some(item));
    accessor.insert(state.db())?;

    tracing::info!(table = %table, "row inserted");
    Ok(Json(MutationResponse::ok(format!(
        "Row inserted into '{}'",
        table
    ))))
}

/// PUT /catalog/:table/:id - Update the row matching the primary key
pub async fn update_row(
    State(state): State<AppState>,
    Path((table, id)): Path<(String, i64)>,
    Json(item): Json<Item>,
) -> ApiResult<Json<MutationResponse>> {
    let accessor = TableAccessor::new(state.registry(), &table, Some(item));
    accessor.update(state.db(), id)?;

    tracing::info!(table = %table, id, "row updated");
    Ok(Json(MutationResponse::ok(format!(
        "Row {} updated in '{}'",
        id, table
    ))))
}

/// DELETE /catalog/:table/:id - Remove the row matching the primary key
pub async fn remove_row(
    State(state): State<AppState>,
    Path((table, id)): Path<(String, i64)>,
) -> ApiResult<Json<MutationResponse>> {
    let accessor = TableAccessor::new(state.registry(), &table, None);
    accessor.remove(state.db(), id)?;

    tracing::info!(table = %table, id, "row removed");
    Ok(Json(MutationResponse::ok(format!(
        "Row {} removed from '{}'",
        id, table
    ))))
}
