//! In-process document store.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use uuid::Uuid;

use super::store::{
    check_collection, compare_values, doc_path, split_doc_path, Direction, DocumentStore, Fields,
    Filter, OrderBy, StoredDocument,
};
use crate::error::{PagerError, Result};

/// Document store held entirely in memory. Contents are lost on drop.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: Mutex<BTreeMap<String, Fields>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, Fields>>> {
        self.docs
            .lock()
            .map_err(|_| PagerError::Store("memory store lock poisoned".to_string()))
    }

    /// Number of documents across all collections.
    #[cfg(test)]
    pub fn document_count(&self) -> usize {
        self.lock().map(|d| d.len()).unwrap_or_default()
    }
}

impl DocumentStore for MemoryStore {
    fn get(&self, path: &str) -> Result<Fields> {
        split_doc_path(path)?;
        self.lock()?
            .get(path)
            .cloned()
            .ok_or_else(|| PagerError::NotFound(path.to_string()))
    }

    fn set(&self, path: &str, fields: &Fields) -> Result<()> {
        split_doc_path(path)?;
        self.lock()?.insert(path.to_string(), fields.clone());
        Ok(())
    }

    fn add(&self, collection: &str, fields: &Fields) -> Result<String> {
        check_collection(collection)?;
        let path = doc_path(collection, &Uuid::now_v7().simple().to_string());
        self.lock()?.insert(path.clone(), fields.clone());
        Ok(path)
    }

    fn delete(&self, path: &str) -> Result<()> {
        split_doc_path(path)?;
        self.lock()?.remove(path);
        Ok(())
    }

    fn query(
        &self,
        collection: &str,
        filters: &[Filter],
        order_by: &OrderBy,
    ) -> Result<Vec<StoredDocument>> {
        check_collection(collection)?;
        let docs = self.lock()?;

        let mut results: Vec<StoredDocument> = docs
            .iter()
            .filter(|(path, _)| {
                split_doc_path(path).is_ok_and(|(parent, _)| parent == collection)
            })
            .filter(|(_, fields)| filters.iter().all(|f| f.matches(fields)))
            .map(|(path, fields)| StoredDocument {
                path: path.clone(),
                fields: fields.clone(),
            })
            .collect();

        results.sort_by(|a, b| {
            let ord = compare_values(
                a.fields.get(&order_by.field),
                b.fields.get(&order_by.field),
            )
            .then_with(|| a.path.cmp(&b.path));
            match order_by.direction {
                Direction::Asc => ord,
                Direction::Desc => ord.reverse(),
            }
        });

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(v: serde_json::Value) -> Fields {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn get_missing_is_not_found() {
        let store = MemoryStore::new();
        let err = store.get("inbound/pager/sessions/ABC123").unwrap_err();
        assert!(matches!(err, PagerError::NotFound(_)));
    }

    #[test]
    fn set_then_get_overwrites() {
        let store = MemoryStore::new();
        let path = "inbound/pager/sessions/ABC123";
        store.set(path, &fields(json!({"a": 1, "b": 2}))).unwrap();
        store.set(path, &fields(json!({"a": 3}))).unwrap();
        assert_eq!(store.get(path).unwrap(), fields(json!({"a": 3})));
    }

    #[test]
    fn add_assigns_path_in_collection() {
        let store = MemoryStore::new();
        let path = store
            .add("inbound/pager/textLogs", &fields(json!({"statusCode": 201})))
            .unwrap();
        assert!(path.starts_with("inbound/pager/textLogs/"));
        assert_eq!(store.get(&path).unwrap()["statusCode"], json!(201));
    }

    #[test]
    fn query_filters_direct_children_and_sorts() {
        let store = MemoryStore::new();
        store
            .set("c/a", &fields(json!({"owner": "x", "createdAt": "2024-01-01"})))
            .unwrap();
        store
            .set("c/b", &fields(json!({"owner": "x", "createdAt": "2024-03-01"})))
            .unwrap();
        store
            .set("c/c", &fields(json!({"owner": "y", "createdAt": "2024-05-01"})))
            .unwrap();
        store
            .set("c/sub/d", &fields(json!({"owner": "x", "createdAt": "2024-09-01"})))
            .unwrap();

        let results = store
            .query("c", &[Filter::eq("owner", "x")], &OrderBy::desc("createdAt"))
            .unwrap();
        let paths: Vec<_> = results.iter().map(|d| d.path.as_str()).collect();
        assert_eq!(paths, vec!["c/b", "c/a"]);
    }

    #[test]
    fn equal_sort_keys_order_by_path_in_direction() {
        let store = MemoryStore::new();
        for id in ["AAAAAA", "CCCCCC", "BBBBBB"] {
            store
                .set(&format!("c/{id}"), &fields(json!({"createdAt": "2024-01-01"})))
                .unwrap();
        }

        let desc = store.query("c", &[], &OrderBy::desc("createdAt")).unwrap();
        let paths: Vec<_> = desc.iter().map(|d| d.path.as_str()).collect();
        assert_eq!(paths, vec!["c/CCCCCC", "c/BBBBBB", "c/AAAAAA"]);

        let asc = store.query("c", &[], &OrderBy::asc("createdAt")).unwrap();
        assert_eq!(asc[0].path, "c/AAAAAA");
    }

    #[test]
    fn delete_missing_is_ok() {
        let store = MemoryStore::new();
        store.delete("c/nothing").unwrap();
    }
}
