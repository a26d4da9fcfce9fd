//! Generic CRUD accessor over the allow-listed catalog tables.
//!
//! One accessor is built per request. Every operation follows the same
//! linear sequence: acquire a connection, validate, build one SQL statement,
//! execute it, release the connection on every exit path, and translate
//! failures into [`ApiError`] kinds.

use serde_json::{Map, Value};

use crate::catalog::TableRegistry;
use crate::db::{Database, DbError, Row, SqlParam};
use crate::error::{ApiError, ApiResult};

/// Ordered column-to-value mapping supplied by the caller.
///
/// Key order drives the generated statement: columns appear in insertion
/// order and parameters follow the same order exactly.
pub type Item = Map<String, Value>;

/// Per-request accessor for one catalog table.
pub struct TableAccessor {
    table_name: String,
    item: Option<Item>,
    primary_key_column: Option<&'static str>,
}

impl TableAccessor {
    /// Resolve `table_name` against the registry.
    ///
    /// An unknown table leaves the primary-key column unset; the operations
    /// then reject it with `Forbidden`.
    pub fn new(
        registry: &TableRegistry,
        table_name: impl Into<String>,
        item: Option<Item>,
    ) -> Self {
        let table_name = table_name.into();
        let primary_key_column = registry.primary_key(&table_name);
        Self {
            table_name,
            item,
            primary_key_column,
        }
    }

    /// SELECT all rows, or the rows matching the primary key when `row_id`
    /// is given. An empty result set is a `NotFound`.
    pub fn query(&self, db: &dyn Database, row_id: Option<i64>) -> ApiResult<Vec<Row>> {
        db.connect().map_err(internal)?;
        let result = self.run_query(db, row_id);
        db.disconnect();
        result
    }

    /// INSERT the supplied mapping. The column list and placeholder list are
    /// derived from the mapping keys in insertion order.
    pub fn insert(&self, db: &dyn Database) -> ApiResult<()> {
        db.connect().map_err(internal)?;
        let result = self.run_insert(db);
        db.disconnect();
        result
    }

    /// DELETE the row matching the primary key.
    pub fn remove(&self, db: &dyn Database, row_id: i64) -> ApiResult<()> {
        db.connect().map_err(internal)?;
        let result = self.run_remove(db, row_id);
        db.disconnect();
        result
    }

    /// UPDATE the row matching the primary key, setting each supplied column
    /// in insertion order. Parameter order is all values, then the row id.
    pub fn update(&self, db: &dyn Database, row_id: i64) -> ApiResult<()> {
        db.connect().map_err(internal)?;
        let result = self.run_update(db, row_id);
        db.disconnect();
        result
    }

    fn run_query(&self, db: &dyn Database, row_id: Option<i64>) -> ApiResult<Vec<Row>> {
        let pk = self.require_allowed()?;

        let (sql, params) = match row_id {
            None => (format!("SELECT * FROM {}", self.table_name), Vec::new()),
            Some(id) => (
                format!("SELECT * FROM {} WHERE {} = ?", self.table_name, pk),
                vec![SqlParam::Integer(id)],
            ),
        };

        let rows = db
            .execute(&sql, &params, true)
            .map_err(internal)?
            .unwrap_or_default();

        if rows.is_empty() {
            return Err(ApiError::NotFound(format!(
                "No matching rows in '{}'",
                self.table_name
            )));
        }

        Ok(rows)
    }

    fn run_insert(&self, db: &dyn Database) -> ApiResult<()> {
        // Payload check comes first: an empty insert is a BadRequest no
        // matter which table was named.
        let item = self.require_item("insert")?;
        self.require_allowed()?;

        let columns = item.keys().cloned().collect::<Vec<_>>().join(", ");
        let placeholders = vec!["?"; item.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table_name, columns, placeholders
        );
        let params = params_from(item)?;

        db.execute(&sql, &params, false).map_err(internal)?;
        Ok(())
    }

    fn run_remove(&self, db: &dyn Database, row_id: i64) -> ApiResult<()> {
        let pk = self.require_allowed()?;

        let sql = format!("DELETE FROM {} WHERE {} = ?", self.table_name, pk);
        db.execute(&sql, &[SqlParam::Integer(row_id)], false)
            .map_err(internal)?;
        Ok(())
    }

    fn run_update(&self, db: &dyn Database, row_id: i64) -> ApiResult<()> {
        let pk = self.require_allowed()?;
        let item = self.require_item("update")?;

        let set_clause = item
            .keys()
            .map(|column| format!("{} = ?", column))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ?",
            self.table_name, set_clause, pk
        );

        let mut params = params_from(item)?;
        params.push(SqlParam::Integer(row_id));

        db.execute(&sql, &params, false).map_err(internal)?;
        Ok(())
    }

    fn require_allowed(&self) -> ApiResult<&'static str> {
        self.primary_key_column.ok_or_else(|| {
            ApiError::Forbidden(format!("Table '{}' is not allowed", self.table_name))
        })
    }

    fn require_item(&self, verb: &str) -> ApiResult<&Item> {
        let item = match &self.item {
            Some(item) if !item.is_empty() => item,
            _ => {
                return Err(ApiError::BadRequest(format!(
                    "No data provided to {}",
                    verb
                )))
            }
        };

        // Column names are spliced into the statement text, so they must be
        // plain identifiers.
        for column in item.keys() {
            if !valid_identifier(column) {
                return Err(ApiError::BadRequest(format!(
                    "Invalid column name '{}'",
                    column
                )));
            }
        }

        Ok(item)
    }
}

fn params_from(item: &Item) -> ApiResult<Vec<SqlParam>> {
    item.values()
        .map(|value| {
            SqlParam::from_json(value).map_err(|err| ApiError::BadRequest(err.to_string()))
        })
        .collect()
}

fn internal(err: DbError) -> ApiError {
    ApiError::Internal(err.to_string())
}

fn valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
