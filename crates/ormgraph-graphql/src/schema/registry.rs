//! Generated schema types and the per-family registry.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use indexmap::IndexMap;
use ormgraph_model::{IntWidth, PropertyKind};
use tracing::trace;

use crate::convert::{FamilyKind, FieldType};
use crate::error::GraphQLError;
use crate::schema::strategy::ConnectionKind;
use crate::types::{self, ComparatorSet, DATABASE_ID, DATE_TIME, JSON_STRING, NODE};

/// How a stored value is presented to and read from GraphQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueKind {
    Plain,
    /// `ID` values are strings on the wire.
    Id,
    Enum,
    /// JSON documents travel as serialized strings.
    Json,
    BoundedInt(IntWidth, bool),
    /// A comparator input object.
    Comparator,
    /// A composite attribute spanning several columns.
    Composite(Vec<String>),
    /// A date-time string.
    DateTime,
}

impl ValueKind {
    /// Derives the value kind from a converted field type.
    pub(crate) fn of(ty: &FieldType, is_enum: impl Fn(&str) -> bool) -> Self {
        let name = ty.inner_name();
        match name {
            "ID" => Self::Id,
            JSON_STRING => Self::Json,
            DATE_TIME => Self::DateTime,
            _ if ComparatorSet::get(name).is_some() => Self::Comparator,
            _ if is_enum(name) => Self::Enum,
            _ => match types::parse_bounded_int_name(name) {
                Some((width, unsigned)) => Self::BoundedInt(width, unsigned),
                None => Self::Plain,
            },
        }
    }
}

/// Whether a relationship field holds one row or many.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    Single,
    Many,
}

/// The shape of a generated field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldShape {
    /// A value field: column, composite or computed property.
    Scalar { ty: FieldType, value: ValueKind },
    /// A reference to the type of `target` in the same family, resolved when
    /// the schema is materialized.
    Relationship { target: String, cardinality: Cardinality },
}

/// One field of a generated schema type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// GraphQL field name.
    pub name: String,
    /// ORM property the field reads or writes.
    pub property: String,
    pub kind: PropertyKind,
    pub shape: FieldShape,
    pub nullable: bool,
    pub description: Option<String>,
}

impl FieldSpec {
    #[must_use]
    pub fn is_relationship(&self) -> bool {
        matches!(self.shape, FieldShape::Relationship { .. })
    }

    /// Returns the value kind of a scalar field.
    #[must_use]
    pub fn value_kind(&self) -> Option<&ValueKind> {
        match &self.shape {
            FieldShape::Scalar { value, .. } => Some(value),
            FieldShape::Relationship { .. } => None,
        }
    }
}

/// A generated schema type for one model in one family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaType {
    pub name: String,
    pub model: String,
    pub family: FamilyKind,
    pub description: Option<String>,
    pub fields: Vec<FieldSpec>,
    pub interfaces: Vec<String>,
    pub connection: Option<ConnectionKind>,
}

impl SchemaType {
    /// Returns whether the type implements `Node`.
    #[must_use]
    pub fn is_node(&self) -> bool {
        self.interfaces.iter().any(|i| i == NODE)
    }

    /// Returns whether the type implements `DatabaseId`.
    #[must_use]
    pub fn has_database_id(&self) -> bool {
        self.interfaces.iter().any(|i| i == DATABASE_ID)
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    #[must_use]
    pub fn field_for_property(&self, property: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.property == property)
    }

    #[must_use]
    pub fn connection_name(&self) -> String {
        format!("{}Connection", self.name)
    }

    #[must_use]
    pub fn edge_name(&self) -> String {
        format!("{}Edge", self.name)
    }
}

/// At most one schema type per model per family.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    families: HashMap<FamilyKind, IndexMap<String, Arc<SchemaType>>>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a schema type for its model and family.
    ///
    /// Registering the same `Arc` again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `GraphQLError::AlreadyRegistered` when a different type is
    /// already registered for the model in that family.
    pub fn register(&mut self, ty: Arc<SchemaType>) -> crate::Result<Arc<SchemaType>> {
        let family = self.families.entry(ty.family).or_default();
        if let Some(existing) = family.get(&ty.model) {
            if Arc::ptr_eq(existing, &ty) {
                return Ok(Arc::clone(existing));
            }
            return Err(GraphQLError::AlreadyRegistered {
                family: ty.family,
                model: ty.model.clone(),
                existing: existing.name.clone(),
            });
        }

        trace!(family = %ty.family, model = %ty.model, name = %ty.name, "Registered schema type");
        family.insert(ty.model.clone(), Arc::clone(&ty));
        Ok(ty)
    }

    #[must_use]
    pub fn get(&self, family: FamilyKind, model: &str) -> Option<&Arc<SchemaType>> {
        self.families.get(&family)?.get(model)
    }

    /// Iterates over the types of a family in registration order.
    pub fn types(&self, family: FamilyKind) -> impl Iterator<Item = &Arc<SchemaType>> {
        self.families.get(&family).into_iter().flat_map(IndexMap::values)
    }

    /// Iterates over all types, family by family.
    pub fn all(&self) -> impl Iterator<Item = &Arc<SchemaType>> {
        FamilyKind::ALL
            .into_iter()
            .flat_map(move |family| self.types(family))
    }

    /// Finds a type by its GraphQL name.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&Arc<SchemaType>> {
        self.all().find(|ty| ty.name == name)
    }

    /// Returns the types that can be materialized, keyed by family and
    /// model.
    ///
    /// GraphQL types need at least one field. A type qualifies when it
    /// implements `Node`, has a value field, or has a relationship field whose
    /// target qualifies; relationship fields to other types are dropped.
    #[must_use]
    pub fn available(&self) -> HashSet<(FamilyKind, String)> {
        let mut available = HashSet::new();
        loop {
            let before = available.len();
            for ty in self.all() {
                let key = (ty.family, ty.model.clone());
                if available.contains(&key) {
                    continue;
                }
                let usable = ty.is_node()
                    || ty.fields.iter().any(|field| match &field.shape {
                        FieldShape::Scalar { .. } => true,
                        FieldShape::Relationship { target, .. } => {
                            available.contains(&(ty.family, target.clone()))
                        }
                    });
                if usable {
                    available.insert(key);
                }
            }
            if available.len() == before {
                return available;
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.families.values().map(IndexMap::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
