//! # ormgraph-graphql
//!
//! GraphQL schema generation from ORM model metadata.
//!
//! This crate turns a [`ormgraph_model::Catalog`] into an async-graphql
//! dynamic schema. It supports:
//!
//! - Object types with relationship fields and Relay connections
//! - Input types for create, edit, delete, filter and filter-by arguments
//! - Column type conversion through a per-family rule table
//! - Bounded integer, `DateTime` and `JSONString` scalars, and enums
//! - Relay `Node` global ids and the `node` root field
//! - Generated query and mutation roots backed by a
//!   [`ormgraph_storage::ModelStore`]
//!
//! ## Overview
//!
//! ```ignore
//! let schema = OrmSchemaBuilder::new(catalog.clone(), GraphQLConfig::default()).build()?;
//!
//! let context = GraphQLContext::builder()
//!     .with_store(ormgraph_db_memory::create_store(catalog))
//!     .with_request_id("req-1")
//!     .build()?;
//!
//! let query = "{ users(first: 5) { edges { node { id fullName } } } }";
//! let response = schema
//!     .execute(async_graphql::Request::new(query).data(context))
//!     .await;
//! ```
//!
//! ## Configuration
//!
//! Add to `ormgraph.toml`:
//!
//! ```toml
//! [graphql]
//! max_depth = 15
//! max_complexity = 500
//! introspection = true
//! relay_node = true
//! exclude_models = ["AuditLog"]
//! ```
//!
//! ## Modules
//!
//! - [`config`] - Configuration options
//! - [`convert`] - Column type conversion rules and enum cache
//! - [`types`] - Shared scalars, comparator inputs, `Node` and `PageInfo`
//! - [`schema`] - Type generation, registries and the schema builder
//! - [`resolvers`] - Query and mutation resolvers
//! - [`input`] / [`query`] - Argument to store value conversion
//! - [`context`] - GraphQL execution context
//! - [`error`] - Error types for generation and GraphQL operations

pub mod config;
pub mod context;
pub mod convert;
pub mod error;
pub mod input;
pub mod query;
pub mod resolvers;
pub mod schema;
pub mod types;

#[cfg(test)]
mod test_support;

// Re-export main types
pub use config::GraphQLConfig;
pub use context::{ContextBuilderError, GraphQLContext, GraphQLContextBuilder};
pub use convert::{
    ConversionRule, ConversionTable, ConvertInput, EnumDef, EnumRegistry, FamilyKind, FieldType,
};
pub use error::GraphQLError;
pub use resolvers::{SchemaIndex, value_field};
pub use schema::{
    ConnectionKind, FamilyStrategy, OrmSchemaBuilder, Registry, SchemaBuilderConfig, SchemaContext,
    SchemaType, TypeOptions,
};

/// Result type for GraphQL operations.
pub type Result<T> = std::result::Result<T, GraphQLError>;
