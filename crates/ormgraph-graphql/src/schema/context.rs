//! The explicit context threaded through schema construction.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use ormgraph_model::{Catalog, Composite};
use tracing::debug;

use crate::config::GraphQLConfig;
use crate::convert::{ConversionRule, ConversionTable, EnumRegistry, FamilyKind, FieldType};
use crate::error::GraphQLError;
use crate::schema::fields::construct_fields;
use crate::schema::registry::{Registry, SchemaType};
use crate::schema::strategy::{DynStrategy, TypeOptions, default_strategies};
use crate::types::NODE;

/// Converts a composite attribute to a GraphQL type for a family.
pub type CompositeConverter =
    Arc<dyn Fn(&Composite, FamilyKind) -> crate::Result<FieldType> + Send + Sync>;

/// Holds everything schema generation reads and writes: the model catalog,
/// conversion rules, composite converters, the enum cache, family
/// strategies and the registry of generated types.
pub struct SchemaContext {
    pub(crate) catalog: Arc<Catalog>,
    pub(crate) config: GraphQLConfig,
    pub(crate) conversions: ConversionTable,
    pub(crate) composites: HashMap<String, CompositeConverter>,
    pub(crate) enums: EnumRegistry,
    pub(crate) registry: Registry,
    strategies: HashMap<FamilyKind, DynStrategy>,
}

impl SchemaContext {
    /// Creates a context with the built-in conversion rules and strategies.
    #[must_use]
    pub fn new(catalog: Arc<Catalog>, config: GraphQLConfig) -> Self {
        let strategies = default_strategies(&config)
            .into_iter()
            .map(|strategy| (strategy.kind(), strategy))
            .collect();

        Self {
            catalog,
            config,
            conversions: ConversionTable::with_builtins(),
            composites: HashMap::new(),
            enums: EnumRegistry::new(),
            registry: Registry::new(),
            strategies,
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    #[must_use]
    pub fn config(&self) -> &GraphQLConfig {
        &self.config
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    #[must_use]
    pub fn enums(&self) -> &EnumRegistry {
        &self.enums
    }

    #[must_use]
    pub fn conversions(&self) -> &ConversionTable {
        &self.conversions
    }

    /// Registers a conversion rule, overriding built-ins for `(family, key)`.
    pub fn register_conversion(
        &mut self,
        family: FamilyKind,
        key: impl Into<String>,
        rule: impl ConversionRule + 'static,
    ) {
        self.conversions.register(family, key, rule);
    }

    /// Registers the converter for composites of `class_name`.
    pub fn register_composite<F>(&mut self, class_name: impl Into<String>, converter: F)
    where
        F: Fn(&Composite, FamilyKind) -> crate::Result<FieldType> + Send + Sync + 'static,
    {
        self.composites.insert(class_name.into(), Arc::new(converter));
    }

    /// Replaces the strategy of its family.
    pub fn set_strategy(&mut self, strategy: DynStrategy) {
        self.strategies.insert(strategy.kind(), strategy);
    }

    /// Returns the strategy of `family`.
    ///
    /// # Errors
    ///
    /// Returns `GraphQLError::Internal` if no strategy is installed.
    pub fn strategy(&self, family: FamilyKind) -> crate::Result<DynStrategy> {
        self.strategies
            .get(&family)
            .cloned()
            .ok_or_else(|| GraphQLError::Internal(format!("No strategy for the {family} family")))
    }

    /// Generates the schema type of `model` in `family`.
    ///
    /// Generation is idempotent: once a type is registered for the model and
    /// family, it is returned as is and `options` are ignored.
    ///
    /// # Errors
    ///
    /// Returns `GraphQLError::UnknownModel` for models missing from the
    /// catalog, plus conversion errors from field construction.
    pub fn generate(
        &mut self,
        model: &str,
        family: FamilyKind,
        options: &TypeOptions,
    ) -> crate::Result<Arc<SchemaType>> {
        if let Some(existing) = self.registry.get(family, model) {
            return Ok(Arc::clone(existing));
        }

        let catalog = Arc::clone(&self.catalog);
        let model = catalog
            .get(model)
            .ok_or_else(|| GraphQLError::UnknownModel(model.to_string()))?;
        let strategy = self.strategy(family)?;

        let mut fields = construct_fields(self, model, strategy.as_ref(), options)?;
        let interfaces = strategy.interfaces(options);
        if interfaces.iter().any(|i| i == NODE) {
            // The global id replaces a column named `id`.
            fields.retain(|field| field.name != "id");
        }

        let ty = SchemaType {
            name: strategy.type_name(model, options),
            model: model.name.clone(),
            family,
            description: options.description.clone().or_else(|| model.doc.clone()),
            fields,
            interfaces,
            connection: strategy.connection(options),
        };

        debug!(
            model = %ty.model,
            family = %family,
            name = %ty.name,
            fields = ty.fields.len(),
            "Generated schema type"
        );
        self.registry.register(Arc::new(ty))
    }

    /// Registers an already built schema type.
    ///
    /// # Errors
    ///
    /// Returns `GraphQLError::AlreadyRegistered` if a different type exists
    /// for the model and family.
    pub fn register(&mut self, ty: Arc<SchemaType>) -> crate::Result<Arc<SchemaType>> {
        self.registry.register(ty)
    }
}

impl fmt::Debug for SchemaContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaContext")
            .field("models", &self.catalog.len())
            .field("conversions", &self.conversions)
            .field("composites", &self.composites.keys().collect::<Vec<_>>())
            .field("enums", &self.enums.len())
            .field("types", &self.registry.len())
            .finish_non_exhaustive()
    }
}
