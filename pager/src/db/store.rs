//! The document store boundary.
//!
//! Documents live in a hierarchical namespace: `collection/id`, where a
//! collection path may itself be nested (`inbound/pager/sessions`). Stores
//! hold loosely-typed field maps; typing happens in `models`.

use std::cmp::Ordering;

use serde_json::Value;

use crate::error::{PagerError, Result};

/// A document's fields as stored.
pub type Fields = serde_json::Map<String, Value>;

/// Equality filter on a top-level field.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub value: Value,
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Whether the given fields satisfy this filter.
    pub fn matches(&self, fields: &Fields) -> bool {
        fields.get(&self.field) == Some(&self.value)
    }
}

/// Sort direction for queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// Ordering applied to query results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

impl OrderBy {
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Desc,
        }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Asc,
        }
    }
}

/// A document returned by a query, with the path it lives at.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub path: String,
    pub fields: Fields,
}

/// Abstract document store.
///
/// All calls are blocking round trips. A missing document is reported by
/// `get` as [`PagerError::NotFound`]; every other failure is
/// [`PagerError::Store`].
pub trait DocumentStore: Send + Sync {
    /// Point lookup.
    fn get(&self, path: &str) -> Result<Fields>;

    /// Full overwrite of the document at `path`, creating it if absent.
    fn set(&self, path: &str, fields: &Fields) -> Result<()>;

    /// Create a document in `collection` under a store-assigned id.
    /// Returns the new document's path.
    fn add(&self, collection: &str, fields: &Fields) -> Result<String>;

    /// Delete the document at `path`. Deleting a missing document is not an error.
    fn delete(&self, path: &str) -> Result<()>;

    /// Documents directly inside `collection` matching every filter, sorted.
    fn query(
        &self,
        collection: &str,
        filters: &[Filter],
        order_by: &OrderBy,
    ) -> Result<Vec<StoredDocument>>;
}

/// Join a collection path and a document id.
pub fn doc_path(collection: &str, id: &str) -> String {
    format!("{}/{id}", collection.trim_end_matches('/'))
}

/// Split a document path into its collection and id.
pub fn split_doc_path(path: &str) -> Result<(&str, &str)> {
    match path.rsplit_once('/') {
        Some((collection, id))
            if !id.is_empty() && !collection.is_empty() && !collection.split('/').any(str::is_empty) =>
        {
            Ok((collection, id))
        }
        _ => Err(PagerError::Store(format!("Invalid doc path: {path}"))),
    }
}

/// Validate a collection path (non-empty segments only).
pub fn check_collection(collection: &str) -> Result<()> {
    if collection.is_empty() || collection.split('/').any(str::is_empty) {
        return Err(PagerError::Store(format!(
            "Invalid collection path: {collection}"
        )));
    }
    Ok(())
}

/// Total order over field values used for in-process sorting.
///
/// Missing fields sort first, then null, bool, number, string; values of
/// other shapes compare equal.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None => 0,
            Some(Value::Null) => 1,
            Some(Value::Bool(_)) => 2,
            Some(Value::Number(_)) => 3,
            Some(Value::String(_)) => 4,
            Some(Value::Array(_)) => 5,
            Some(Value::Object(_)) => 6,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}
