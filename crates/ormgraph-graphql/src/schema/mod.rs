//! GraphQL schema generation.
//!
//! The schema is generated in two phases:
//!
//! 1. **Generation** - For each model and family, [`SchemaContext::generate`]
//!    runs the family's [`FamilyStrategy`] and the conversion table over the
//!    model's properties and registers a [`SchemaType`]. Relationship fields
//!    stay symbolic references to the target model.
//! 2. **Materialization** - [`OrmSchemaBuilder::build`] turns the registered
//!    types into async-graphql dynamic types, resolves relationship
//!    references within each family, adds the roots and finishes the schema.
//!
//! ## Components
//!
//! - [`SchemaContext`] - Conversion table, composite converters, enum cache,
//!   strategies and registry, threaded through generation
//! - [`Registry`] - At most one schema type per model per family
//! - [`OrmSchemaBuilder`] - Builds the final schema

mod autogen;
mod builder;
mod context;
mod fields;
mod input_types;
mod object_type;
mod registry;
mod strategy;

pub use autogen::RootNames;
pub use builder::{OrmSchemaBuilder, SchemaBuilderConfig};
pub use context::{CompositeConverter, SchemaContext};
pub use fields::construct_fields;
pub use registry::{Cardinality, FieldShape, FieldSpec, Registry, SchemaType, ValueKind};
pub use strategy::{
    ConnectionKind, CreateInputStrategy, DynStrategy, EditInputStrategy, FamilyStrategy,
    FilterByInputStrategy, FilterInputStrategy, FilterObjectStrategy, InputStrategy,
    KeysInputStrategy, ObjectStrategy, TypeOptions, default_strategies,
};

pub(crate) use autogen::generate_types;
