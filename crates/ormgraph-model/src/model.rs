//! Mapped models and their properties.

use serde::{Deserialize, Serialize};

use crate::{Column, Relationship};

/// A composite attribute built from several columns (an ORM `composite()`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Composite {
    pub name: String,
    /// Name of the value class; composite converters are registered by it.
    pub class_name: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub doc: Option<String>,
}

/// A computed (hybrid) property with no stored column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Computed {
    pub name: String,
    #[serde(default)]
    pub doc: Option<String>,
}

/// Borrowed view over one property of a model.
#[derive(Debug, Clone, Copy)]
pub enum OrmProperty<'a> {
    Column(&'a Column),
    Composite(&'a Composite),
    Computed(&'a Computed),
    Relationship(&'a Relationship),
}

/// Property kinds, used when a strategy needs to reason about a property
/// without holding it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    Column,
    Composite,
    Computed,
    Relationship,
}

impl<'a> OrmProperty<'a> {
    /// Attribute name on the model.
    #[must_use]
    pub fn name(&self) -> &'a str {
        match self {
            Self::Column(c) => &c.name,
            Self::Composite(c) => &c.name,
            Self::Computed(c) => &c.name,
            Self::Relationship(r) => &r.key,
        }
    }

    #[must_use]
    pub fn kind(&self) -> PropertyKind {
        match self {
            Self::Column(_) => PropertyKind::Column,
            Self::Composite(_) => PropertyKind::Composite,
            Self::Computed(_) => PropertyKind::Computed,
            Self::Relationship(_) => PropertyKind::Relationship,
        }
    }

    #[must_use]
    pub fn doc(&self) -> Option<&'a str> {
        match self {
            Self::Column(c) => c.doc.as_deref(),
            Self::Composite(c) => c.doc.as_deref(),
            Self::Computed(c) => c.doc.as_deref(),
            Self::Relationship(r) => r.doc.as_deref(),
        }
    }
}

/// A mapped table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    /// Model (class) name. Used as the base of every generated type name.
    pub name: String,

    /// Table name.
    pub table: String,

    #[serde(default)]
    pub doc: Option<String>,

    #[serde(default)]
    pub columns: Vec<Column>,

    #[serde(default)]
    pub composites: Vec<Composite>,

    #[serde(default)]
    pub computed: Vec<Computed>,

    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

impl Model {
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            doc: None,
            columns: Vec::new(),
            composites: Vec::new(),
            computed: Vec::new(),
            relationships: Vec::new(),
        }
    }

    #[must_use]
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    #[must_use]
    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    #[must_use]
    pub fn composite(mut self, composite: Composite) -> Self {
        self.composites.push(composite);
        self
    }

    #[must_use]
    pub fn computed(mut self, name: impl Into<String>, doc: Option<&str>) -> Self {
        self.computed.push(Computed {
            name: name.into(),
            doc: doc.map(str::to_string),
        });
        self
    }

    #[must_use]
    pub fn relationship(mut self, relationship: Relationship) -> Self {
        self.relationships.push(relationship);
        self
    }

    /// Returns all properties: columns, composites, computed properties and
    /// relationships, each group in declaration order.
    pub fn properties(&self) -> impl Iterator<Item = OrmProperty<'_>> {
        self.columns
            .iter()
            .map(OrmProperty::Column)
            .chain(self.composites.iter().map(OrmProperty::Composite))
            .chain(self.computed.iter().map(OrmProperty::Computed))
            .chain(self.relationships.iter().map(OrmProperty::Relationship))
    }

    #[must_use]
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    #[must_use]
    pub fn get_relationship(&self, key: &str) -> Option<&Relationship> {
        self.relationships.iter().find(|r| r.key == key)
    }

    /// Primary key columns in declaration order.
    pub fn primary_key(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.primary_key)
    }

    /// Returns the many-to-one relationship joined through `column`.
    #[must_use]
    pub fn relationship_for_column(&self, column: &str) -> Option<&Relationship> {
        self.relationships.iter().find(|r| {
            r.direction == crate::Direction::ManyToOne
                && r.local_columns.iter().any(|c| c == column)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SqlType;
    use pretty_assertions::assert_eq;

    fn post() -> Model {
        Model::new("Post", "posts")
            .column(Column::new("id", SqlType::Integer).primary_key())
            .column(Column::new("title", SqlType::String))
            .composite(Composite {
                name: "location".into(),
                class_name: "Point".into(),
                columns: vec!["x".into(), "y".into()],
                doc: None,
            })
            .computed("summary", Some("First line of the body"))
            .relationship(
                Relationship::many_to_one("author", "User").join(["author_id"], ["id"]),
            )
    }

    #[test]
    fn test_properties_order() {
        let model = post();
        let names: Vec<_> = model.properties().map(|p| p.name()).collect();
        assert_eq!(names, vec!["id", "title", "location", "summary", "author"]);

        let kinds: Vec<_> = model.properties().map(|p| p.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                PropertyKind::Column,
                PropertyKind::Column,
                PropertyKind::Composite,
                PropertyKind::Computed,
                PropertyKind::Relationship,
            ]
        );
    }

    #[test]
    fn test_lookups() {
        let model = post();
        assert!(model.get_column("title").is_some());
        assert!(model.get_column("missing").is_none());
        assert_eq!(model.primary_key().count(), 1);
        assert_eq!(
            model.relationship_for_column("author_id").map(|r| r.key.as_str()),
            Some("author")
        );
        assert_eq!(
            model.properties().find(|p| p.name() == "summary").and_then(|p| p.doc()),
            Some("First line of the body")
        );
    }
}
