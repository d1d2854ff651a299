//! # ormgraph-storage
//!
//! The row store contract behind the generated GraphQL schema.
//!
//! The schema generator never executes SQL. Resolvers describe what they need
//! with the types in this crate and hand them to a [`ModelStore`]
//! implementation. The in-memory backend lives in `ormgraph-db-memory`.
//!
//! ## Example
//!
//! ```ignore
//! use ormgraph_storage::{Comparator, Filter, ModelStore, OrderBy, Query};
//! use serde_json::json;
//!
//! async fn adults(store: &dyn ModelStore) -> Result<Vec<Row>, StorageError> {
//!     let query = Query::new()
//!         .with_filter(Filter::compare("age", Comparator::Ge, json!(18)))
//!         .with_order(OrderBy::asc("name"))
//!         .with_limit(10);
//!
//!     Ok(store.query("User", &query).await?.rows)
//! }
//! ```

mod error;
mod traits;
mod types;

pub use error::{ErrorCategory, StorageError};
pub use traits::ModelStore;
pub use types::{
    Attached, Comparator, Filter, Instance, OrderBy, Query, QueryResult, Row, RowKey,
    render_value,
};

/// Type alias for a storage result.
pub type StorageResult<T> = Result<T, StorageError>;

/// Shared store handle.
pub type DynStore = std::sync::Arc<dyn ModelStore>;
