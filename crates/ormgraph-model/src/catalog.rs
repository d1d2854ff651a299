//! Validated model catalog.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Column, Direction, Model, ModelError, Relationship, Result, is_valid_graphql_name};

/// Serialized form of a catalog: a top-level `models` array.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub models: Vec<Model>,
}

/// An ordered, validated set of models.
///
/// Construction checks model and property names, primary keys, foreign keys
/// and relationship targets, and fills in join columns that relationships
/// leave unspecified.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    models: IndexMap<String, Model>,
}

impl Catalog {
    /// Builds a catalog from models in declaration order.
    ///
    /// # Errors
    ///
    /// Returns an error if a model is invalid or references something that
    /// does not exist.
    pub fn new(models: impl IntoIterator<Item = Model>) -> Result<Self> {
        let mut map = IndexMap::new();
        for model in models {
            if map.contains_key(&model.name) {
                return Err(ModelError::DuplicateModel(model.name));
            }
            map.insert(model.name.clone(), model);
        }

        let mut catalog = Self { models: map };
        catalog.validate()?;
        catalog.infer_joins()?;

        debug!(models = catalog.len(), "Model catalog loaded");
        Ok(catalog)
    }

    /// Parses a TOML catalog document.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Parse`] for malformed documents and a validation
    /// error for inconsistent models.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let file: CatalogFile =
            toml::from_str(source).map_err(|e| ModelError::Parse(e.to_string()))?;
        Self::new(file.models)
    }

    /// Parses a JSON catalog document.
    ///
    /// # Errors
    ///
    /// Same as [`Catalog::from_toml_str`].
    pub fn from_json_str(source: &str) -> Result<Self> {
        let file: CatalogFile =
            serde_json::from_str(source).map_err(|e| ModelError::Parse(e.to_string()))?;
        Self::new(file.models)
    }

    /// Checks model consistency without touching join columns.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<()> {
        for model in self.models.values() {
            if !is_valid_graphql_name(&model.name) {
                return Err(ModelError::InvalidName(model.name.clone()));
            }
            if model.primary_key().next().is_none() {
                return Err(ModelError::MissingPrimaryKey(model.name.clone()));
            }

            let mut seen = std::collections::HashSet::new();
            for property in model.properties() {
                let name = property.name();
                if !is_valid_graphql_name(name) {
                    return Err(ModelError::InvalidName(format!("{}.{}", model.name, name)));
                }
                if !seen.insert(name) {
                    return Err(ModelError::DuplicateProperty {
                        model: model.name.clone(),
                        property: name.to_string(),
                    });
                }
            }

            for column in &model.columns {
                for fk in &column.foreign_keys {
                    let exists = self
                        .models
                        .get(&fk.model)
                        .is_some_and(|target| target.get_column(&fk.column).is_some());
                    if !exists {
                        return Err(ModelError::UnknownForeignKey {
                            model: model.name.clone(),
                            column: column.name.clone(),
                            target: format!("{}.{}", fk.model, fk.column),
                        });
                    }
                }
            }

            for rel in &model.relationships {
                let targets = std::iter::once(&rel.target).chain(rel.secondary.iter());
                for target in targets {
                    if !self.models.contains_key(target) {
                        return Err(ModelError::UnknownTarget {
                            model: model.name.clone(),
                            relationship: rel.key.clone(),
                            target: target.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    fn infer_joins(&mut self) -> Result<()> {
        let mut inferred = Vec::new();

        for (model_idx, model) in self.models.values().enumerate() {
            for (rel_idx, rel) in model.relationships.iter().enumerate() {
                if !rel.local_columns.is_empty() || rel.direction == Direction::ManyToMany {
                    continue;
                }
                let (local, remote) = self.join_columns(model, rel)?;
                inferred.push((model_idx, rel_idx, local, remote));
            }
        }

        for (model_idx, rel_idx, local, remote) in inferred {
            if let Some((_, model)) = self.models.get_index_mut(model_idx) {
                let rel = &mut model.relationships[rel_idx];
                debug!(
                    model = %model.name,
                    relationship = %rel.key,
                    ?local,
                    ?remote,
                    "Inferred join columns"
                );
                rel.local_columns = local;
                rel.remote_columns = remote;
            }
        }
        Ok(())
    }

    fn join_columns(
        &self,
        model: &Model,
        rel: &Relationship,
    ) -> Result<(Vec<String>, Vec<String>)> {
        let ambiguous = || ModelError::AmbiguousJoin {
            model: model.name.clone(),
            relationship: rel.key.clone(),
        };
        let target = self.models.get(&rel.target).ok_or_else(ambiguous)?;

        match rel.direction {
            Direction::ManyToOne => {
                let column = pick_fk_column(model, &target.name, &format!("{}_id", rel.key))
                    .ok_or_else(ambiguous)?;
                let remote = column
                    .foreign_keys
                    .iter()
                    .filter(|fk| fk.model == target.name)
                    .map(|fk| fk.column.clone())
                    .collect::<Vec<_>>();
                Ok((vec![column.name.clone()], remote))
            }
            Direction::OneToMany => {
                let preferred = format!("{}_id", model.name.to_lowercase());
                let column =
                    pick_fk_column(target, &model.name, &preferred).ok_or_else(ambiguous)?;
                let local = column
                    .foreign_keys
                    .iter()
                    .filter(|fk| fk.model == model.name)
                    .map(|fk| fk.column.clone())
                    .collect::<Vec<_>>();
                Ok((local, vec![column.name.clone()]))
            }
            Direction::ManyToMany => Ok((Vec::new(), Vec::new())),
        }
    }

    /// Looks up a model by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Model> {
        self.models.get(name)
    }

    /// Models in declaration order.
    pub fn models(&self) -> impl Iterator<Item = &Model> {
        self.models.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.models.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

/// Picks the column of `model` referencing `target`, preferring `preferred`
/// when several do.
fn pick_fk_column<'a>(model: &'a Model, target: &str, preferred: &str) -> Option<&'a Column> {
    let candidates: Vec<&Column> = model
        .columns
        .iter()
        .filter(|c| c.foreign_keys.iter().any(|fk| fk.model == target))
        .collect();

    match candidates.as_slice() {
        [single] => Some(*single),
        [] => None,
        many => many.iter().copied().find(|c| c.name == preferred),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SqlType;
    use pretty_assertions::assert_eq;

    fn user() -> Model {
        Model::new("User", "users")
            .column(Column::new("id", SqlType::Integer).primary_key())
            .column(Column::new("name", SqlType::String).not_null())
            .relationship(Relationship::one_to_many("posts", "Post"))
    }

    fn post() -> Model {
        Model::new("Post", "posts")
            .column(Column::new("id", SqlType::Integer).primary_key())
            .column(Column::new("author_id", SqlType::Integer).foreign_key("User", "id"))
            .relationship(Relationship::many_to_one("author", "User"))
    }

    #[test]
    fn test_infers_join_columns() {
        let catalog = Catalog::new([user(), post()]).unwrap();

        let author = catalog.get("Post").unwrap().get_relationship("author").unwrap();
        assert_eq!(author.local_columns, vec!["author_id"]);
        assert_eq!(author.remote_columns, vec!["id"]);

        let posts = catalog.get("User").unwrap().get_relationship("posts").unwrap();
        assert_eq!(posts.local_columns, vec!["id"]);
        assert_eq!(posts.remote_columns, vec!["author_id"]);
    }

    #[test]
    fn test_rejects_unknown_target() {
        let err = Catalog::new([post()]).unwrap_err();
        assert!(matches!(err, ModelError::UnknownForeignKey { .. }));

        let lonely = Model::new("Lonely", "lonely")
            .column(Column::new("id", SqlType::Integer).primary_key())
            .relationship(Relationship::many_to_one("friend", "Friend"));
        let err = Catalog::new([lonely]).unwrap_err();
        assert!(matches!(err, ModelError::UnknownTarget { ref target, .. } if target == "Friend"));
    }

    #[test]
    fn test_rejects_invalid_models() {
        let err = Catalog::new([Model::new("NoKey", "no_key")
            .column(Column::new("name", SqlType::String))])
        .unwrap_err();
        assert!(matches!(err, ModelError::MissingPrimaryKey(_)));

        let err = Catalog::new([user(), user()]).unwrap_err();
        assert!(matches!(err, ModelError::DuplicateModel(_)));

        let bad = Model::new("Bad-Name", "bad")
            .column(Column::new("id", SqlType::Integer).primary_key());
        assert!(matches!(
            Catalog::new([bad]).unwrap_err(),
            ModelError::InvalidName(_)
        ));
    }

    #[test]
    fn test_ambiguous_join() {
        let post = Model::new("Post", "posts")
            .column(Column::new("id", SqlType::Integer).primary_key())
            .column(Column::new("writer", SqlType::Integer).foreign_key("User", "id"))
            .column(Column::new("editor", SqlType::Integer).foreign_key("User", "id"))
            .relationship(Relationship::many_to_one("author", "User"));
        let user = Model::new("User", "users")
            .column(Column::new("id", SqlType::Integer).primary_key());

        let err = Catalog::new([user, post]).unwrap_err();
        assert!(matches!(err, ModelError::AmbiguousJoin { .. }));
    }

    #[test]
    fn test_from_toml() {
        let catalog = Catalog::from_toml_str(
            r#"
            [[models]]
            name = "User"
            table = "users"

            [[models.columns]]
            name = "id"
            type = "integer"
            primary_key = true

            [[models.columns]]
            name = "email"
            type = "string"
            nullable = false
            "#,
        )
        .unwrap();

        assert_eq!(catalog.len(), 1);
        let user = catalog.get("User").unwrap();
        assert_eq!(user.columns.len(), 2);
        assert!(!user.get_column("email").unwrap().is_nullable());
    }

    #[test]
    fn test_from_json_parse_error() {
        let err = Catalog::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ModelError::Parse(_)));
    }
}
