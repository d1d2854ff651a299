//! Column type conversion.
//!
//! A [`ConversionTable`] maps `(family, SQL type key)` pairs to conversion
//! rules. Lookup walks two declared chains:
//!
//! 1. the family chain, most derived first (`DeleteInput`, `KeysInput`,
//!    `Input`);
//! 2. for each family, the SQL type's ancestry, most derived first (a
//!    `Custom` type, then its bases).
//!
//! Family specificity dominates type specificity: a rule for the base type
//! in the derived family wins over a rule for the derived type in the base
//! family.

mod enums;
mod rules;

pub use enums::{EnumDef, EnumRegistry};

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_graphql::dynamic::TypeRef;
use ormgraph_model::{Column, Model, SqlType};
use tracing::trace;

use crate::error::GraphQLError;

/// A kind of generated schema type.
///
/// Each family has its own registry and naming strategy. Families form a
/// tree through [`FamilyKind::parent`]; conversion rules registered on a
/// family are inherited by its descendants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FamilyKind {
    Object,
    FilterObject,
    Input,
    CreateInput,
    EditInput,
    KeysInput,
    DeleteInput,
    FilterInput,
    FilterByInput,
}

impl FamilyKind {
    /// All families, parents before children.
    pub const ALL: [FamilyKind; 9] = [
        FamilyKind::Object,
        FamilyKind::FilterObject,
        FamilyKind::Input,
        FamilyKind::CreateInput,
        FamilyKind::EditInput,
        FamilyKind::KeysInput,
        FamilyKind::DeleteInput,
        FamilyKind::FilterInput,
        FamilyKind::FilterByInput,
    ];

    /// Returns the family this one derives from.
    #[must_use]
    pub fn parent(self) -> Option<FamilyKind> {
        match self {
            Self::Object | Self::Input => None,
            Self::FilterObject => Some(Self::Object),
            Self::CreateInput
            | Self::EditInput
            | Self::KeysInput
            | Self::FilterInput
            | Self::FilterByInput => Some(Self::Input),
            Self::DeleteInput => Some(Self::KeysInput),
        }
    }

    /// Returns this family followed by its ancestors.
    #[must_use]
    pub fn chain(self) -> Vec<FamilyKind> {
        let mut chain = vec![self];
        let mut current = self;
        while let Some(parent) = current.parent() {
            chain.push(parent);
            current = parent;
        }
        chain
    }

    /// Returns whether this family generates input objects.
    #[must_use]
    pub fn is_input(self) -> bool {
        self.chain().contains(&Self::Input)
    }

    /// Suffix appended to the model name to form the type name.
    #[must_use]
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Object | Self::FilterObject => "",
            Self::Input => "Input",
            Self::CreateInput => "CreateInput",
            Self::EditInput => "EditInput",
            Self::KeysInput => "KeysInput",
            Self::DeleteInput => "DeleteInput",
            Self::FilterInput => "FilterInput",
            Self::FilterByInput => "FilterByInput",
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Object => "object",
            Self::FilterObject => "filter_object",
            Self::Input => "input",
            Self::CreateInput => "create_input",
            Self::EditInput => "edit_input",
            Self::KeysInput => "keys_input",
            Self::DeleteInput => "delete_input",
            Self::FilterInput => "filter_input",
            Self::FilterByInput => "filter_by_input",
        }
    }
}

impl fmt::Display for FamilyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The GraphQL type a conversion produces, without nullability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Named(String),
    List(Box<FieldType>),
}

impl FieldType {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn list(item: FieldType) -> Self {
        Self::List(Box::new(item))
    }

    /// Returns the innermost named type.
    #[must_use]
    pub fn inner_name(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::List(item) => item.inner_name(),
        }
    }

    #[must_use]
    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    /// Builds the type reference. List items are always nullable.
    #[must_use]
    pub fn to_type_ref(&self, nullable: bool) -> TypeRef {
        let inner = match self {
            Self::Named(name) => TypeRef::Named(name.clone().into()),
            Self::List(item) => TypeRef::List(Box::new(item.to_type_ref(true))),
        };
        if nullable {
            inner
        } else {
            TypeRef::NonNull(Box::new(inner))
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::List(item) => write!(f, "[{item}]"),
        }
    }
}

/// Everything a conversion rule may look at.
pub struct ConvertInput<'a> {
    pub model: &'a Model,
    pub column: &'a Column,
    /// The type being converted. Equals the column type except while
    /// converting array items.
    pub sql_type: &'a SqlType,
    pub family: FamilyKind,
    pub table: &'a ConversionTable,
}

impl ConvertInput<'_> {
    /// Converts another type of the same column, e.g. an array item.
    ///
    /// # Errors
    ///
    /// Returns `GraphQLError::NoConversionRule` when nothing matches.
    pub fn convert(
        &self,
        sql_type: &SqlType,
        enums: &mut EnumRegistry,
    ) -> crate::Result<FieldType> {
        self.table
            .convert_type(self.model, self.column, sql_type, self.family, enums)
    }
}

/// A rule turning a column into a GraphQL type.
pub trait ConversionRule: Send + Sync {
    /// Converts the column.
    ///
    /// # Errors
    ///
    /// Returns an error if the column cannot be represented.
    fn convert(
        &self,
        input: &ConvertInput<'_>,
        enums: &mut EnumRegistry,
    ) -> crate::Result<FieldType>;
}

impl<F> ConversionRule for F
where
    F: Fn(&ConvertInput<'_>, &mut EnumRegistry) -> crate::Result<FieldType> + Send + Sync,
{
    fn convert(
        &self,
        input: &ConvertInput<'_>,
        enums: &mut EnumRegistry,
    ) -> crate::Result<FieldType> {
        self(input, enums)
    }
}

/// Shared conversion rule.
pub type DynConversionRule = Arc<dyn ConversionRule>;

/// The `(family, type key)` to rule table.
#[derive(Clone, Default)]
pub struct ConversionTable {
    rules: HashMap<(FamilyKind, String), DynConversionRule>,
}

impl ConversionTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table holding the built-in rules.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut table = Self::new();
        rules::register_builtins(&mut table);
        table
    }

    /// Registers `rule` for `(family, key)`, replacing any previous rule.
    pub fn register(
        &mut self,
        family: FamilyKind,
        key: impl Into<String>,
        rule: impl ConversionRule + 'static,
    ) {
        self.register_shared(family, key, Arc::new(rule));
    }

    /// Registers an already shared rule.
    pub fn register_shared(
        &mut self,
        family: FamilyKind,
        key: impl Into<String>,
        rule: DynConversionRule,
    ) {
        self.rules.insert((family, key.into()), rule);
    }

    /// Registers one rule for several type keys.
    pub fn register_all(&mut self, family: FamilyKind, keys: &[&str], rule: DynConversionRule) {
        for key in keys {
            self.register_shared(family, *key, Arc::clone(&rule));
        }
    }

    /// Returns whether a rule is registered for exactly `(family, key)`.
    #[must_use]
    pub fn contains(&self, family: FamilyKind, key: &str) -> bool {
        self.rules.contains_key(&(family, key.to_string()))
    }

    /// Returns the number of registered rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Finds the best rule for `sql_type` in `family`.
    ///
    /// Returns the family and type key the rule was registered under.
    #[must_use]
    pub fn resolve(
        &self,
        family: FamilyKind,
        sql_type: &SqlType,
    ) -> Option<(FamilyKind, String, &DynConversionRule)> {
        let ancestry = sql_type.ancestry();
        for candidate in family.chain() {
            for ty in &ancestry {
                let key = (candidate, ty.key().into_owned());
                if let Some(rule) = self.rules.get(&key) {
                    return Some((key.0, key.1, rule));
                }
            }
        }
        None
    }

    /// Converts a column in `family`.
    ///
    /// # Errors
    ///
    /// Returns `GraphQLError::NoConversionRule` when no rule matches after
    /// walking both chains.
    pub fn convert(
        &self,
        model: &Model,
        column: &Column,
        family: FamilyKind,
        enums: &mut EnumRegistry,
    ) -> crate::Result<FieldType> {
        self.convert_type(model, column, &column.sql_type, family, enums)
    }

    pub(crate) fn convert_type(
        &self,
        model: &Model,
        column: &Column,
        sql_type: &SqlType,
        family: FamilyKind,
        enums: &mut EnumRegistry,
    ) -> crate::Result<FieldType> {
        let Some((found_family, key, rule)) = self.resolve(family, sql_type) else {
            return Err(GraphQLError::NoConversionRule {
                family,
                model: model.name.clone(),
                column: column.name.clone(),
                sql_type: sql_type.to_string(),
            });
        };

        trace!(
            model = %model.name,
            column = %column.name,
            family = %family,
            rule_family = %found_family,
            rule_key = %key,
            "Resolved conversion rule"
        );

        let input = ConvertInput {
            model,
            column,
            sql_type,
            family,
            table: self,
        };
        rule.convert(&input, enums)
    }
}

impl fmt::Debug for ConversionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.rules.keys().collect();
        keys.sort();
        f.debug_struct("ConversionTable").field("rules", &keys).finish()
    }
}
