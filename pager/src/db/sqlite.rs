//! SQLite-backed document store.
//!
//! Each document is one row keyed by its full path, with the parent
//! collection denormalised for listing and the fields kept as JSON text.
//! Equality filters and ordering run through `json_extract`.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use serde_json::Value;
use uuid::Uuid;

use super::store::{
    check_collection, doc_path, split_doc_path, Direction, DocumentStore, Fields, Filter, OrderBy,
    StoredDocument,
};
use crate::error::{PagerError, Result};

/// Document store persisted in a single SQLite file.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create the store at a specific path.
    pub fn open_at(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                PagerError::Store(format!(
                    "Failed to create directory {}: {e}",
                    parent.display()
                ))
            })?;
        }
        let conn = Connection::open(path).map_err(|e| {
            PagerError::Store(format!("Failed to open database at {}: {e}", path.display()))
        })?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize()?;
        Ok(store)
    }

    /// Initialize the database schema.
    fn initialize(&self) -> Result<()> {
        self.conn()?.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS documents (
                path TEXT PRIMARY KEY,
                collection TEXT NOT NULL,
                data TEXT NOT NULL,
                written_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection);
            ",
        )?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| PagerError::Store("sqlite connection lock poisoned".to_string()))
    }

    fn write(conn: &Connection, path: &str, collection: &str, fields: &Fields) -> Result<()> {
        let data = serde_json::to_string(fields)?;
        conn.execute(
            r"INSERT INTO documents (path, collection, data, written_at)
              VALUES (?1, ?2, ?3, ?4)
              ON CONFLICT(path) DO UPDATE SET data = excluded.data, written_at = excluded.written_at",
            params![path, collection, data, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

/// JSON path expression addressing a top-level field.
fn json_field(field: &str) -> String {
    format!("$.\"{}\"", field.replace('"', ""))
}

/// Convert a filter value into what `json_extract` yields for it.
fn sql_value(value: &Value) -> Result<SqlValue> {
    match value {
        Value::String(s) => Ok(SqlValue::Text(s.clone())),
        Value::Bool(b) => Ok(SqlValue::Integer(i64::from(*b))),
        Value::Number(n) => n.as_i64().map_or_else(
            || {
                n.as_f64()
                    .map(SqlValue::Real)
                    .ok_or_else(|| PagerError::Store(format!("Unsupported number: {n}")))
            },
            |i| Ok(SqlValue::Integer(i)),
        ),
        other => Err(PagerError::Store(format!(
            "Unsupported filter value: {other}"
        ))),
    }
}

fn parse_fields(path: &str, data: &str) -> Result<Fields> {
    match serde_json::from_str::<Value>(data)? {
        Value::Object(fields) => Ok(fields),
        _ => Err(PagerError::MalformedDocument(format!(
            "{path} is not a JSON object"
        ))),
    }
}

impl DocumentStore for SqliteStore {
    fn get(&self, path: &str) -> Result<Fields> {
        split_doc_path(path)?;
        let data: Option<String> = self
            .conn()?
            .query_row(
                "SELECT data FROM documents WHERE path = ?1",
                params![path],
                |row| row.get(0),
            )
            .optional()?;

        match data {
            Some(data) => parse_fields(path, &data),
            None => Err(PagerError::NotFound(path.to_string())),
        }
    }

    fn set(&self, path: &str, fields: &Fields) -> Result<()> {
        let (collection, _) = split_doc_path(path)?;
        Self::write(&*self.conn()?, path, collection, fields)
    }

    fn add(&self, collection: &str, fields: &Fields) -> Result<String> {
        check_collection(collection)?;
        let path = doc_path(collection, &Uuid::now_v7().simple().to_string());
        Self::write(&*self.conn()?, &path, collection, fields)?;
        Ok(path)
    }

    fn delete(&self, path: &str) -> Result<()> {
        split_doc_path(path)?;
        self.conn()?
            .execute("DELETE FROM documents WHERE path = ?1", params![path])?;
        Ok(())
    }

    fn query(
        &self,
        collection: &str,
        filters: &[Filter],
        order_by: &OrderBy,
    ) -> Result<Vec<StoredDocument>> {
        check_collection(collection)?;

        let mut sql = String::from("SELECT path, data FROM documents WHERE collection = ?1");
        let mut bind: Vec<SqlValue> = vec![SqlValue::Text(collection.to_string())];

        for filter in filters {
            bind.push(SqlValue::Text(json_field(&filter.field)));
            let field_idx = bind.len();
            bind.push(sql_value(&filter.value)?);
            let value_idx = bind.len();
            sql.push_str(&format!(
                " AND json_extract(data, ?{field_idx}) = ?{value_idx}"
            ));
        }

        bind.push(SqlValue::Text(json_field(&order_by.field)));
        let order_idx = bind.len();
        let direction = match order_by.direction {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        };
        sql.push_str(&format!(
            " ORDER BY json_extract(data, ?{order_idx}) {direction}, path {direction}"
        ));

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(bind.iter()), |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut docs = Vec::new();
        for row in rows {
            let (path, data) = row?;
            let fields = parse_fields(&path, &data)?;
            docs.push(StoredDocument { path, fields });
        }
        Ok(docs)
    }
}
