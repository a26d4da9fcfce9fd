//! SQLite database layer for the catalog.
//!
//! The accessor talks to the engine through the [`Database`] trait: a
//! connect/disconnect pair plus one `execute` entry point taking positional
//! parameters. Production uses [`SqliteDatabase`]; tests substitute
//! recording fakes of the same trait.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rusqlite::types::{Value as SqliteValue, ValueRef};
use rusqlite::Connection;
use serde_json::{Map, Value};
use thiserror::Error;

/// A fetched row: column name to JSON value, in statement column order.
pub type Row = Map<String, Value>;

/// Positional statement parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Bool(bool),
}

impl SqlParam {
    /// Convert a JSON scalar into a statement parameter.
    ///
    /// Arrays and objects have no SQL scalar representation and are rejected.
    pub fn from_json(value: &Value) -> DbResult<Self> {
        match value {
            Value::Null => Ok(SqlParam::Null),
            Value::Bool(b) => Ok(SqlParam::Bool(*b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(SqlParam::Integer(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(SqlParam::Real(f))
                } else {
                    Err(DbError::UnsupportedValue(value.clone()))
                }
            }
            Value::String(s) => Ok(SqlParam::Text(s.clone())),
            Value::Array(_) | Value::Object(_) => Err(DbError::UnsupportedValue(value.clone())),
        }
    }
}

impl From<&SqlParam> for SqliteValue {
    fn from(param: &SqlParam) -> Self {
        match param {
            SqlParam::Null => SqliteValue::Null,
            SqlParam::Integer(i) => SqliteValue::Integer(*i),
            SqlParam::Real(f) => SqliteValue::Real(*f),
            SqlParam::Text(s) => SqliteValue::Text(s.clone()),
            SqlParam::Bool(b) => SqliteValue::Integer(i64::from(*b)),
        }
    }
}

/// Database-layer failures.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not connected")]
    NotConnected,

    #[error("value has no SQL representation: {0}")]
    UnsupportedValue(Value),
}

pub type DbResult<T> = Result<T, DbError>;

/// Contract between the accessor and the underlying engine.
pub trait Database: Send + Sync {
    /// Establish a connection. Calling on an open connection is a no-op.
    fn connect(&self) -> DbResult<()>;

    /// Release the current connection, if any.
    fn disconnect(&self);

    /// Run a parameterized statement. Returns rows only when `fetch` is true.
    fn execute(&self, sql: &str, params: &[SqlParam], fetch: bool) -> DbResult<Option<Vec<Row>>>;
}

/// SQLite implementation of the [`Database`] contract.
///
/// Holds at most one open connection behind a mutex. Operations are
/// request-scoped: the accessor connects, runs one statement, and
/// disconnects, so the slot is empty between requests.
#[derive(Clone)]
pub struct SqliteDatabase {
    path: PathBuf,
    conn: Arc<Mutex<Option<Connection>>>,
    keep_alive: bool,
}

impl SqliteDatabase {
    /// Database backed by a file on disk.
    ///
    /// Creates the parent directory if needed and fails fast when the path
    /// is unusable; per-operation connects reopen it afterwards.
    pub fn open(path: impl Into<PathBuf>) -> DbResult<Self> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        Connection::open(&path)?;

        Ok(Self {
            path,
            conn: Arc::new(Mutex::new(None)),
            keep_alive: false,
        })
    }

    /// In-memory database (for testing).
    ///
    /// The connection is held open across connect/disconnect cycles so that
    /// state survives between operations, which is how an on-disk database
    /// behaves.
    pub fn in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn: Arc::new(Mutex::new(Some(conn))),
            keep_alive: true,
        })
    }

    /// Get the database file path
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Get database file size in bytes
    pub fn size_bytes(&self) -> Option<u64> {
        std::fs::metadata(&self.path).ok().map(|m| m.len())
    }
}

impl Database for SqliteDatabase {
    fn connect(&self) -> DbResult<()> {
        let mut conn = self.conn.lock().unwrap();
        if conn.is_none() {
            *conn = Some(Connection::open(&self.path)?);
        }
        Ok(())
    }

    fn disconnect(&self) {
        if self.keep_alive {
            return;
        }
        *self.conn.lock().unwrap() = None;
    }

    fn execute(&self, sql: &str, params: &[SqlParam], fetch: bool) -> DbResult<Option<Vec<Row>>> {
        let guard = self.conn.lock().unwrap();
        let conn = guard.as_ref().ok_or(DbError::NotConnected)?;

        tracing::debug!(sql, params = params.len(), fetch, "executing statement");

        let mut stmt = conn.prepare(sql)?;
        let values: Vec<SqliteValue> = params.iter().map(SqliteValue::from).collect();

        if !fetch {
            stmt.execute(rusqlite::params_from_iter(values))?;
            return Ok(None);
        }

        let column_names: Vec<String> = stmt
            .column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();

        let mut rows = stmt.query(rusqlite::params_from_iter(values))?;
        let mut fetched = Vec::new();

        while let Some(row) = rows.next()? {
            let mut record = Row::new();
            for (idx, name) in column_names.iter().enumerate() {
                record.insert(name.clone(), json_from_sqlite(row.get_ref(idx)?));
            }
            fetched.push(record);
        }

        Ok(Some(fetched))
    }
}

fn json_from_sqlite(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Value::from(f),
        ValueRef::Text(text) => Value::from(String::from_utf8_lossy(text).into_owned()),
        ValueRef::Blob(blob) => Value::from(BASE64.encode(blob)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn memory_db_with_schema() -> SqliteDatabase {
        let db = SqliteDatabase::in_memory().unwrap();
        db.execute(
            "CREATE TABLE serie (idserie INTEGER PRIMARY KEY, nome TEXT, ano INTEGER)",
            &[],
            false,
        )
        .unwrap();
        db
    }

    #[test]
    fn execute_round_trip() {
        let db = memory_db_with_schema();

        db.execute(
            "INSERT INTO serie (nome, ano) VALUES (?, ?)",
            &[SqlParam::Text("Dark".into()), SqlParam::Integer(2017)],
            false,
        )
        .unwrap();

        let rows = db
            .execute("SELECT * FROM serie", &[], true)
            .unwrap()
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["nome"], json!("Dark"));
        assert_eq!(rows[0]["ano"], json!(2017));
        // Column order follows the statement
        let columns: Vec<&String> = rows[0].keys().collect();
        assert_eq!(columns, ["idserie", "nome", "ano"]);
    }

    #[test]
    fn fetch_false_returns_no_rows() {
        let db = memory_db_with_schema();
        let result = db
            .execute(
                "INSERT INTO serie (nome) VALUES (?)",
                &[SqlParam::Text("Mindhunter".into())],
                false,
            )
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn null_and_bool_params() {
        let db = memory_db_with_schema();

        db.execute(
            "INSERT INTO serie (nome, ano) VALUES (?, ?)",
            &[SqlParam::Null, SqlParam::Bool(true)],
            false,
        )
        .unwrap();

        let rows = db
            .execute("SELECT nome, ano FROM serie", &[], true)
            .unwrap()
            .unwrap();
        assert_eq!(rows[0]["nome"], Value::Null);
        // Booleans are stored as integers
        assert_eq!(rows[0]["ano"], json!(1));
    }

    #[test]
    fn sql_param_from_json_scalars() {
        assert_eq!(SqlParam::from_json(&json!(null)).unwrap(), SqlParam::Null);
        assert_eq!(
            SqlParam::from_json(&json!(true)).unwrap(),
            SqlParam::Bool(true)
        );
        assert_eq!(
            SqlParam::from_json(&json!(42)).unwrap(),
            SqlParam::Integer(42)
        );
        assert_eq!(
            SqlParam::from_json(&json!(1.5)).unwrap(),
            SqlParam::Real(1.5)
        );
        assert_eq!(
            SqlParam::from_json(&json!("x")).unwrap(),
            SqlParam::Text("x".into())
        );
    }

    #[test]
    fn sql_param_rejects_nested_values() {
        assert!(SqlParam::from_json(&json!([1, 2])).is_err());
        assert!(SqlParam::from_json(&json!({"a": 1})).is_err());
    }

    #[test]
    fn execute_without_connection_fails() {
        let dir = tempfile::tempdir().unwrap();
        let db = SqliteDatabase::open(dir.path().join("catalog.db")).unwrap();

        let err = db.execute("SELECT 1", &[], true).unwrap_err();
        assert!(matches!(err, DbError::NotConnected));
    }

    #[test]
    fn connect_disconnect_cycle_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let db = SqliteDatabase::open(dir.path().join("catalog.db")).unwrap();

        db.connect().unwrap();
        db.execute("CREATE TABLE categoria (idcategoria INTEGER PRIMARY KEY, nome TEXT)", &[], false)
            .unwrap();
        db.disconnect();

        // State persists across a reconnect
        db.connect().unwrap();
        let rows = db
            .execute("SELECT * FROM categoria", &[], true)
            .unwrap()
            .unwrap();
        db.disconnect();
        assert!(rows.is_empty());
    }

    #[test]
    fn connect_is_idempotent() {
        let db = memory_db_with_schema();
        db.connect().unwrap();
        db.connect().unwrap();
        assert!(db.execute("SELECT * FROM serie", &[], true).is_ok());
    }
}
