//! Error types for model metadata.

/// Errors raised while building or loading a model catalog.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Two models share a name.
    #[error("Duplicate model: {0}")]
    DuplicateModel(String),

    /// A model name cannot be used as a GraphQL type name.
    #[error("Invalid model name '{0}': must match [_a-zA-Z][_a-zA-Z0-9]*")]
    InvalidName(String),

    /// A model has no primary key column.
    #[error("Model {0} has no primary key column")]
    MissingPrimaryKey(String),

    /// A model declares the same property name twice.
    #[error("Model {model} declares property '{property}' more than once")]
    DuplicateProperty {
        /// Model name.
        model: String,
        /// Property name.
        property: String,
    },

    /// A relationship targets a model that is not in the catalog.
    #[error("Relationship {model}.{relationship} targets unknown model {target}")]
    UnknownTarget {
        /// Owning model.
        model: String,
        /// Relationship key.
        relationship: String,
        /// Missing target model.
        target: String,
    },

    /// A foreign key references a model or column that does not exist.
    #[error("Foreign key {model}.{column} references unknown column {target}")]
    UnknownForeignKey {
        /// Owning model.
        model: String,
        /// Column carrying the foreign key.
        column: String,
        /// The referenced `Model.column`.
        target: String,
    },

    /// Join columns could not be inferred for a relationship.
    #[error("Cannot determine join columns for relationship {model}.{relationship}")]
    AmbiguousJoin {
        /// Owning model.
        model: String,
        /// Relationship key.
        relationship: String,
    },

    /// A catalog document could not be parsed.
    #[error("Failed to parse model catalog: {0}")]
    Parse(String),
}

impl ModelError {
    /// Returns the model the error refers to, if any.
    #[must_use]
    pub fn model(&self) -> Option<&str> {
        match self {
            Self::DuplicateModel(model)
            | Self::InvalidName(model)
            | Self::MissingPrimaryKey(model) => Some(model),
            Self::DuplicateProperty { model, .. }
            | Self::UnknownTarget { model, .. }
            | Self::UnknownForeignKey { model, .. }
            | Self::AmbiguousJoin { model, .. } => Some(model),
            Self::Parse(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ModelError::UnknownTarget {
            model: "Post".into(),
            relationship: "author".into(),
            target: "Person".into(),
        };
        assert_eq!(
            err.to_string(),
            "Relationship Post.author targets unknown model Person"
        );

        let err = ModelError::MissingPrimaryKey("Tag".into());
        assert_eq!(err.to_string(), "Model Tag has no primary key column");
    }

    #[test]
    fn test_error_model() {
        assert_eq!(ModelError::InvalidName("a-b".into()).model(), Some("a-b"));
        assert_eq!(ModelError::Parse("bad".into()).model(), None);
    }
}
