//! ORM GraphQL schema builder.
//!
//! This module provides `OrmSchemaBuilder`, which generates a GraphQL schema
//! from a model catalog. The builder uses async-graphql's dynamic schema API
//! to construct the schema at runtime.

use std::collections::HashSet;
use std::sync::Arc;

use async_graphql::dynamic::{self, Schema, SchemaBuilder};
use ormgraph_model::{Catalog, Composite};
use tracing::{debug, trace};

use crate::config::GraphQLConfig;
use crate::convert::{ConversionRule, FamilyKind, FieldType};
use crate::error::GraphQLError;
use crate::resolvers::SchemaIndex;
use crate::schema::autogen::{generate_types, mutation_type, query_type};
use crate::schema::context::SchemaContext;
use crate::schema::input_types::input_object;
use crate::schema::object_type::object_types;
use crate::types::{
    comparator_inputs, database_id_interface, node_interface, page_info_type, register_scalars,
};

/// Configuration for the schema builder.
#[derive(Debug, Clone)]
pub struct SchemaBuilderConfig {
    /// Maximum query depth allowed.
    pub max_depth: usize,

    /// Maximum query complexity allowed.
    pub max_complexity: usize,

    /// Whether to enable introspection queries.
    pub introspection_enabled: bool,
}

impl Default for SchemaBuilderConfig {
    fn default() -> Self {
        Self {
            max_depth: 15,
            max_complexity: 500,
            introspection_enabled: true,
        }
    }
}

/// Builds a GraphQL schema from ORM model metadata.
///
/// `OrmSchemaBuilder` generates a complete schema including:
/// - Bounded integer, `DateTime` and `JSONString` scalars
/// - Enums collected while converting columns
/// - One object type and seven input types per model
/// - Relay `Node`, connections and `PageInfo`
/// - Query and Mutation roots with the generated fields
///
/// # Example
///
/// ```ignore
/// let schema = OrmSchemaBuilder::new(catalog, GraphQLConfig::default())
///     .with_composite("Point", |_, family| {
///         Ok(FieldType::named(if family.is_input() { "PointInput" } else { "Point" }))
///     })
///     .with_type(point_type)
///     .with_type(point_input)
///     .build()?;
/// ```
pub struct OrmSchemaBuilder {
    context: SchemaContext,

    /// Types registered as given, e.g. composite types.
    extra_types: Vec<dynamic::Type>,
}

impl OrmSchemaBuilder {
    /// Creates a new schema builder.
    #[must_use]
    pub fn new(catalog: Arc<Catalog>, config: GraphQLConfig) -> Self {
        Self {
            context: SchemaContext::new(catalog, config),
            extra_types: Vec::new(),
        }
    }

    /// Gives access to the construction context, e.g. to generate types with
    /// custom options before the autogen roots do.
    pub fn context_mut(&mut self) -> &mut SchemaContext {
        &mut self.context
    }

    /// Registers a conversion rule for `(family, key)`.
    #[must_use]
    pub fn with_conversion(
        mut self,
        family: FamilyKind,
        key: impl Into<String>,
        rule: impl ConversionRule + 'static,
    ) -> Self {
        self.context.register_conversion(family, key, rule);
        self
    }

    /// Registers the converter of composites of `class_name`.
    #[must_use]
    pub fn with_composite<F>(mut self, class_name: impl Into<String>, converter: F) -> Self
    where
        F: Fn(&Composite, FamilyKind) -> crate::Result<FieldType> + Send + Sync + 'static,
    {
        self.context.register_composite(class_name, converter);
        self
    }

    /// Adds a type to the schema as is.
    #[must_use]
    pub fn with_type(mut self, ty: impl Into<dynamic::Type>) -> Self {
        self.extra_types.push(ty.into());
        self
    }

    /// Runs type generation without materializing the schema.
    ///
    /// # Errors
    ///
    /// Same generation errors as [`OrmSchemaBuilder::build`].
    pub fn inspect(self) -> crate::Result<SchemaIndex> {
        let mut context = self.context;
        context
            .config()
            .validate()
            .map_err(GraphQLError::SchemaBuildFailed)?;
        generate_types(&mut context)?;
        Ok(SchemaIndex::from_context(&context))
    }

    /// Builds the GraphQL schema.
    ///
    /// # Errors
    ///
    /// Returns generation errors (`NoConversionRule`, `UnknownComposite`,
    /// `AlreadyRegistered`) and `SchemaBuildFailed` when two types share a
    /// name or async-graphql rejects the schema.
    pub fn build(self) -> crate::Result<Schema> {
        let Self {
            mut context,
            extra_types,
        } = self;
        debug!(models = context.catalog().len(), "Starting GraphQL schema build");

        context
            .config()
            .validate()
            .map_err(GraphQLError::SchemaBuildFailed)?;
        let models = generate_types(&mut context)?;

        let index = Arc::new(SchemaIndex::from_context(&context));
        let available = index.registry.available();
        let output_family = index.output_family();

        let mut names = TypeNames::default();
        let mut schema_builder = {
            let mutation = index.config.mutations.then_some("Mutation");
            let builder = Schema::build("Query", mutation, None);
            register_scalars(builder)
        };

        for def in context.enums().iter() {
            names.claim(def.name())?;
            schema_builder = schema_builder.register(def.to_dynamic());
        }

        let has_nodes = index.registry.types(output_family).any(|ty| ty.is_node());
        if has_nodes {
            schema_builder = schema_builder.register(node_interface());
        }
        if index.registry.types(output_family).any(|ty| ty.has_database_id()) {
            schema_builder = schema_builder.register(database_id_interface());
        }
        schema_builder = schema_builder.register(page_info_type());
        for input in comparator_inputs() {
            schema_builder = schema_builder.register(input);
        }

        for ty in index.registry.types(output_family) {
            if !available.contains(&(ty.family, ty.model.clone())) {
                continue;
            }
            names.claim(&ty.name)?;
            if ty.connection.is_some() {
                names.claim(&ty.connection_name())?;
                names.claim(&ty.edge_name())?;
            }
            for object in object_types(&index, ty, &available) {
                schema_builder = schema_builder.register(object);
            }
        }

        for family in FamilyKind::ALL.into_iter().filter(|f| f.is_input()) {
            for ty in index.registry.types(family) {
                if !available.contains(&(family, ty.model.clone())) {
                    trace!(type_name = %ty.name, "Skipping input type without fields");
                    continue;
                }
                names.claim(&ty.name)?;
                schema_builder =
                    schema_builder.register(input_object(&index.registry, ty, &available));
            }
        }

        for ty in extra_types {
            schema_builder = schema_builder.register(ty);
        }

        schema_builder = schema_builder.register(query_type(&index, &models, &available));
        if index.config.mutations {
            let mutation = mutation_type(&index, &models, &available).ok_or_else(|| {
                GraphQLError::SchemaBuildFailed("Mutation root has no fields".into())
            })?;
            schema_builder = schema_builder.register(mutation);
        }

        let schema = finish(schema_builder, &index.config.to_schema_builder_config())?;

        debug!(types = names.len(), "GraphQL schema build complete");
        Ok(schema)
    }
}

impl std::fmt::Debug for OrmSchemaBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrmSchemaBuilder")
            .field("context", &self.context)
            .field("extra_types", &self.extra_types.len())
            .finish()
    }
}

/// Applies the limits and finishes the schema.
fn finish(builder: SchemaBuilder, config: &SchemaBuilderConfig) -> crate::Result<Schema> {
    let mut builder = builder
        .limit_depth(config.max_depth)
        .limit_complexity(config.max_complexity);

    if !config.introspection_enabled {
        builder = builder.disable_introspection();
    }

    builder
        .finish()
        .map_err(|e| GraphQLError::SchemaBuildFailed(e.to_string()))
}

/// Generated type names, which must be unique.
#[derive(Default)]
struct TypeNames(HashSet<String>);

impl TypeNames {
    fn claim(&mut self, name: &str) -> crate::Result<()> {
        if self.0.insert(name.to_string()) {
            Ok(())
        } else {
            Err(GraphQLError::SchemaBuildFailed(format!("Duplicate type name {name}")))
        }
    }

    fn len(&self) -> usize {
        self.0.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::post_catalog;

    #[test]
    fn test_default_config() {
        let config = SchemaBuilderConfig::default();
        assert_eq!(config.max_depth, 15);
        assert_eq!(config.max_complexity, 500);
        assert!(config.introspection_enabled);
    }

    #[test]
    fn test_build_schema() {
        let schema = OrmSchemaBuilder::new(post_catalog(), GraphQLConfig::default())
            .build()
            .unwrap();
        let sdl = schema.sdl();

        assert!(sdl.contains("type User implements Node"));
        assert!(sdl.contains("input PostCreateInput"));
        assert!(sdl.contains("type PostConnection"));
        assert!(sdl.contains("scalar SignedInt8"));
        assert!(sdl.contains("enum user_status_enum"));
    }

    #[test]
    fn test_invalid_config() {
        let config = GraphQLConfig {
            max_depth: 0,
            ..Default::default()
        };
        let err = OrmSchemaBuilder::new(post_catalog(), config).build().unwrap_err();
        assert_eq!(err.error_code(), "SCHEMA_BUILD_FAILED");
    }

    #[test]
    fn test_duplicate_type_names() {
        let mut builder = OrmSchemaBuilder::new(post_catalog(), GraphQLConfig::default());
        builder
            .context_mut()
            .generate(
                "Post",
                FamilyKind::Object,
                &crate::schema::TypeOptions::new().name("User"),
            )
            .unwrap();

        let err = builder.build().unwrap_err();
        assert_eq!(err.to_string(), "Failed to build GraphQL schema: Duplicate type name User");
    }

    #[test]
    fn test_inspect() {
        let index = OrmSchemaBuilder::new(post_catalog(), GraphQLConfig::default())
            .inspect()
            .unwrap();
        assert_eq!(index.registry.len(), 16);
        assert!(index.registry.by_name("PostFilterByInput").is_some());
    }

    #[test]
    fn test_without_mutations() {
        let config = GraphQLConfig {
            mutations: false,
            ..Default::default()
        };
        let schema = OrmSchemaBuilder::new(post_catalog(), config).build().unwrap();
        assert!(!schema.sdl().contains("type Mutation"));
    }
}
