//! Relationships between models.

use serde::{Deserialize, Serialize};

/// Cardinality of a relationship as seen from its owning model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    ManyToOne,
    OneToMany,
    ManyToMany,
}

/// A relationship property.
///
/// `local_columns` and `remote_columns` are the join pairs. They may be left
/// empty in catalog documents; [`crate::Catalog::new`] infers them from the
/// foreign keys of the two models.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    /// Attribute name on the owning model.
    pub key: String,

    /// Target model name.
    pub target: String,

    pub direction: Direction,

    /// Overrides whether the relationship holds a collection.
    #[serde(default)]
    pub uselist: Option<bool>,

    #[serde(default)]
    pub local_columns: Vec<String>,

    #[serde(default)]
    pub remote_columns: Vec<String>,

    /// Association model linking both sides of a many-to-many relationship.
    #[serde(default)]
    pub secondary: Option<String>,

    #[serde(default)]
    pub doc: Option<String>,
}

impl Relationship {
    pub fn new(key: impl Into<String>, target: impl Into<String>, direction: Direction) -> Self {
        Self {
            key: key.into(),
            target: target.into(),
            direction,
            uselist: None,
            local_columns: Vec::new(),
            remote_columns: Vec::new(),
            secondary: None,
            doc: None,
        }
    }

    pub fn many_to_one(key: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(key, target, Direction::ManyToOne)
    }

    pub fn one_to_many(key: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(key, target, Direction::OneToMany)
    }

    pub fn many_to_many(key: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(key, target, Direction::ManyToMany)
    }

    #[must_use]
    pub fn uselist(mut self, uselist: bool) -> Self {
        self.uselist = Some(uselist);
        self
    }

    /// Sets explicit join columns.
    #[must_use]
    pub fn join<L, R>(mut self, local: L, remote: R) -> Self
    where
        L: IntoIterator,
        L::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        self.local_columns = local.into_iter().map(Into::into).collect();
        self.remote_columns = remote.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the association model of a many-to-many relationship.
    #[must_use]
    pub fn secondary(mut self, model: impl Into<String>) -> Self {
        self.secondary = Some(model.into());
        self
    }

    #[must_use]
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Returns whether the relationship holds a collection.
    #[must_use]
    pub fn uses_list(&self) -> bool {
        self.uselist
            .unwrap_or(!matches!(self.direction, Direction::ManyToOne))
    }

    /// Returns whether the relationship points at many rows.
    #[must_use]
    pub fn is_to_many(&self) -> bool {
        !matches!(self.direction, Direction::ManyToOne)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uses_list() {
        assert!(!Relationship::many_to_one("author", "User").uses_list());
        assert!(Relationship::one_to_many("posts", "Post").uses_list());
        assert!(Relationship::many_to_many("tags", "Tag").uses_list());

        let profile = Relationship::one_to_many("profile", "Profile").uselist(false);
        assert!(!profile.uses_list());
        assert!(profile.is_to_many());
    }

    #[test]
    fn test_deserialize_direction() {
        let rel: Relationship = toml::from_str(
            r#"
            key = "posts"
            target = "Post"
            direction = "one_to_many"
            "#,
        )
        .unwrap();
        assert_eq!(rel.direction, Direction::OneToMany);
        assert!(rel.local_columns.is_empty());
    }
}
