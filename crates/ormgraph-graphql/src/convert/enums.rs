//! Enum types generated from enum and choice columns.

use async_graphql::dynamic::{Enum, EnumItem};
use indexmap::IndexMap;
use tracing::trace;

/// One generated GraphQL enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDef {
    name: String,
    description: Option<String>,
    items: Vec<(String, Option<String>)>,
}

impl EnumDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            items: Vec::new(),
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn value(mut self, name: impl Into<String>) -> Self {
        self.items.push((name.into(), None));
        self
    }

    /// Adds a value with a human readable label as its description.
    #[must_use]
    pub fn described_value(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.items.push((name.into(), Some(description.into())));
        self
    }

    #[must_use]
    pub fn values(self, names: impl IntoIterator<Item = String>) -> Self {
        names.into_iter().fold(self, Self::value)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Iterates over `(value name, description)` pairs in declaration order.
    pub fn items(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.items.iter().map(|(name, desc)| (name.as_str(), desc.as_deref()))
    }

    #[must_use]
    pub fn contains(&self, value: &str) -> bool {
        self.items.iter().any(|(name, _)| name == value)
    }

    pub(crate) fn to_dynamic(&self) -> Enum {
        let mut ty = Enum::new(&self.name);
        if let Some(description) = &self.description {
            ty = ty.description(description);
        }
        for (name, description) in &self.items {
            let mut item = EnumItem::new(name);
            if let Some(description) = description {
                item = item.description(description);
            }
            ty = ty.item(item);
        }
        ty
    }
}

/// Enum types by name.
///
/// An enum is generated once per name; later columns with the same enum
/// name reuse the first definition.
#[derive(Debug, Clone, Default)]
pub struct EnumRegistry {
    enums: IndexMap<String, EnumDef>,
}

impl EnumRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `def` unless an enum with that name exists, and returns the
    /// enum name.
    pub fn register(&mut self, def: EnumDef) -> String {
        let name = def.name.clone();
        if !self.enums.contains_key(&name) {
            trace!(name = %name, values = def.items.len(), "Registered enum type");
            self.enums.insert(name.clone(), def);
        }
        name
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&EnumDef> {
        self.enums.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.enums.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EnumDef> {
        self.enums.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.enums.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.enums.is_empty()
    }
}
