//! Document store implementations.

mod memory;
mod sqlite;
mod store;

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::{Config, StoreKind};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use store::{doc_path, DocumentStore, Fields, Filter, OrderBy, StoredDocument};

/// Open the store the configuration names.
///
/// The handle is shared for the life of the process.
pub fn open_store(config: &Config) -> Result<Arc<dyn DocumentStore>> {
    match config.store {
        StoreKind::Memory => Ok(Arc::new(MemoryStore::new())),
        StoreKind::Sqlite => {
            let path = config
                .database_path()
                .context("Could not determine database path")?;
            let store = SqliteStore::open_at(&path)
                .with_context(|| format!("Failed to open store at {}", path.display()))?;
            Ok(Arc::new(store))
        }
    }
}
