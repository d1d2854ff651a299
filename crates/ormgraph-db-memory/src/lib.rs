//! In-memory row store for ormgraph.
//!
//! This crate provides an in-memory implementation of the `ModelStore` trait
//! from `ormgraph-storage`, using papaya lock-free hash maps. It is the
//! backend used by the integration tests and by `ormgraph exec`.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use ormgraph_db_memory::InMemoryStore;
//! use ormgraph_storage::{Instance, ModelStore};
//!
//! let store = InMemoryStore::new(Arc::new(catalog));
//! let user = store
//!     .insert(Instance::new("User").with_value("name", json!("Ann")))
//!     .await?;
//! ```

mod storage;
mod value;

pub use ormgraph_storage::{ModelStore, StorageError};
pub use storage::InMemoryStore;

/// Creates a shareable in-memory store for `catalog`.
pub fn create_store(
    catalog: std::sync::Arc<ormgraph_model::Catalog>,
) -> ormgraph_storage::DynStore {
    std::sync::Arc::new(InMemoryStore::new(catalog))
}
