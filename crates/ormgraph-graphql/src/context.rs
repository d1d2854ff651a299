//! GraphQL execution context.
//!
//! The context holds the row store and per-request state. It is added to
//! each request as data and read by every resolver.
//!
//! # Example
//!
//! ```ignore
//! use ormgraph_graphql::GraphQLContextBuilder;
//!
//! let context = GraphQLContextBuilder::new()
//!     .with_store(store.clone())
//!     .with_request_id("req-123")
//!     .build()?;
//!
//! let response = schema.execute(async_graphql::Request::new(query).data(context)).await;
//! ```

use ormgraph_storage::DynStore;

/// GraphQL execution context.
///
/// Cheap to clone: the store is shared through an `Arc`.
#[derive(Clone)]
pub struct GraphQLContext {
    /// Row store the resolvers read from and write to.
    pub store: DynStore,

    /// Request ID for tracing and correlation.
    pub request_id: String,
}

impl GraphQLContext {
    /// Creates a new builder for GraphQLContext.
    #[must_use]
    pub fn builder() -> GraphQLContextBuilder {
        GraphQLContextBuilder::default()
    }
}

impl std::fmt::Debug for GraphQLContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphQLContext")
            .field("store", &self.store.backend_name())
            .field("request_id", &self.request_id)
            .finish()
    }
}

/// Builder for constructing GraphQLContext.
#[derive(Default)]
pub struct GraphQLContextBuilder {
    store: Option<DynStore>,
    request_id: Option<String>,
}

impl GraphQLContextBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the row store.
    #[must_use]
    pub fn with_store(mut self, store: DynStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the request ID.
    #[must_use]
    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    /// Builds the GraphQLContext.
    ///
    /// # Errors
    ///
    /// Returns an error if required fields are missing.
    pub fn build(self) -> Result<GraphQLContext, ContextBuilderError> {
        let store = self.store.ok_or(ContextBuilderError::MissingField("store"))?;

        let request_id = self
            .request_id
            .ok_or(ContextBuilderError::MissingField("request_id"))?;

        Ok(GraphQLContext { store, request_id })
    }
}

/// Errors that can occur when building a GraphQLContext.
#[derive(Debug, thiserror::Error)]
pub enum ContextBuilderError {
    /// A required field was not provided.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use ormgraph_db_memory::InMemoryStore;
    use ormgraph_model::Catalog;

    #[test]
    fn test_builder_missing_store() {
        let result = GraphQLContextBuilder::new().with_request_id("req-123").build();

        assert!(matches!(result, Err(ContextBuilderError::MissingField("store"))));
    }

    #[test]
    fn test_builder_missing_request_id() {
        let store = Arc::new(InMemoryStore::new(Arc::new(Catalog::default())));
        let result = GraphQLContext::builder().with_store(store).build();

        assert!(matches!(result, Err(ContextBuilderError::MissingField("request_id"))));
    }

    #[test]
    fn test_builder_complete() {
        let store = Arc::new(InMemoryStore::new(Arc::new(Catalog::default())));
        let context = GraphQLContext::builder()
            .with_store(store)
            .with_request_id("req-1")
            .build()
            .unwrap();

        assert_eq!(context.request_id, "req-1");
        assert_eq!(context.store.backend_name(), "memory");
    }

    #[test]
    fn test_clones_share_store() {
        let store = ormgraph_db_memory::create_store(crate::test_support::post_catalog());
        let context = GraphQLContext::builder()
            .with_store(store)
            .with_request_id("req-1")
            .build()
            .unwrap();
        let clone = context.clone();

        let ann = ormgraph_storage::Instance::new("User")
            .with_value("full_name", serde_json::json!("Ann"));
        tokio_test::block_on(context.store.insert(ann)).unwrap();

        let key = ormgraph_storage::RowKey::new("User", vec![serde_json::json!(1)]);
        assert!(tokio_test::block_on(clone.store.get(&key)).unwrap().is_some());
    }
}
