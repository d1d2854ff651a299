//! Error types for schema generation and GraphQL operations.
//!
//! Generation errors (conversion, registry, build) surface from
//! [`crate::OrmSchemaBuilder`]. Runtime errors are converted to
//! `async_graphql::Error` with an `code` extension, see
//! [`GraphQLError::into_graphql_error`].

use std::fmt;

use async_graphql::ErrorExtensions;
use ormgraph_storage::StorageError;

use crate::convert::FamilyKind;

/// Errors that can occur while generating or executing the schema.
#[derive(Debug)]
pub enum GraphQLError {
    /// No conversion rule matches a column type in a family.
    NoConversionRule {
        /// Family being generated.
        family: FamilyKind,
        /// Model name.
        model: String,
        /// Column name.
        column: String,
        /// SQL type key.
        sql_type: String,
    },

    /// A composite property has no registered converter.
    UnknownComposite {
        /// Model name.
        model: String,
        /// Composite property name.
        property: String,
        /// Composite value class.
        class_name: String,
    },

    /// A different schema type is already registered for a model.
    AlreadyRegistered {
        /// Family of the registry.
        family: FamilyKind,
        /// Model name.
        model: String,
        /// Name of the type already registered.
        existing: String,
    },

    /// A model is not part of the catalog.
    UnknownModel(String),

    /// Schema build failed.
    SchemaBuildFailed(String),

    /// A foreign key points at a missing row.
    ReferenceNotFound {
        /// Model holding the foreign key.
        model: String,
        /// Foreign key column.
        column: String,
        /// Rendered `Model/id` of the missing row.
        target: String,
    },

    /// Row not found.
    NotFound {
        /// Model name.
        model: String,
        /// Requested id.
        id: String,
    },

    /// The store rejected a write. Displayed verbatim.
    Constraint(String),

    /// Validation error.
    Validation(String),

    /// Storage error.
    Storage(String),

    /// Internal error.
    Internal(String),
}

impl fmt::Display for GraphQLError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoConversionRule {
                family,
                model,
                column,
                sql_type,
            } => {
                write!(
                    f,
                    "Don't know how to convert the database type {sql_type} \
                     of {model}.{column} for {family}"
                )
            }
            Self::UnknownComposite {
                model,
                property,
                class_name,
            } => {
                write!(
                    f,
                    "Don't know how to convert the composite field \
                     {model}.{property} ({class_name})"
                )
            }
            Self::AlreadyRegistered {
                family,
                model,
                existing,
            } => {
                write!(
                    f,
                    "Model {model} already has the {family} type {existing} registered"
                )
            }
            Self::UnknownModel(model) => {
                write!(f, "Unknown model: {model}")
            }
            Self::SchemaBuildFailed(msg) => {
                write!(f, "Failed to build GraphQL schema: {msg}")
            }
            Self::ReferenceNotFound {
                model,
                column,
                target,
            } => {
                write!(f, "Referenced {target} not found for {model}.{column}")
            }
            Self::NotFound { model, id } => {
                write!(f, "No such instance of type {model} with id {id}")
            }
            Self::Constraint(msg) => {
                write!(f, "{msg}")
            }
            Self::Validation(msg) => {
                write!(f, "Validation error: {msg}")
            }
            Self::Storage(msg) => {
                write!(f, "Storage error: {msg}")
            }
            Self::Internal(msg) => {
                write!(f, "Internal error: {msg}")
            }
        }
    }
}

impl std::error::Error for GraphQLError {}

impl GraphQLError {
    /// Returns the error code for GraphQL error extensions.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NoConversionRule { .. } => "NO_CONVERSION_RULE",
            Self::UnknownComposite { .. } => "UNKNOWN_COMPOSITE",
            Self::AlreadyRegistered { .. } => "ALREADY_REGISTERED",
            Self::UnknownModel(_) => "UNKNOWN_MODEL",
            Self::SchemaBuildFailed(_) => "SCHEMA_BUILD_FAILED",
            Self::ReferenceNotFound { .. } => "REFERENCE_NOT_FOUND",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Constraint(_) => "CONSTRAINT_VIOLATION",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns whether the error was raised while generating the schema.
    #[must_use]
    pub fn is_generation_error(&self) -> bool {
        matches!(
            self,
            Self::NoConversionRule { .. }
                | Self::UnknownComposite { .. }
                | Self::AlreadyRegistered { .. }
                | Self::UnknownModel(_)
                | Self::SchemaBuildFailed(_)
        )
    }

    /// Converts the error into a GraphQL error carrying `code` in its
    /// extensions.
    #[must_use]
    pub fn into_graphql_error(self) -> async_graphql::Error {
        let code = self.error_code();
        async_graphql::Error::new(self.to_string()).extend_with(|_, e| {
            e.set("code", code);
        })
    }
}

impl From<StorageError> for GraphQLError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { model, id } => Self::NotFound { model, id },
            StorageError::ReferenceNotFound {
                model,
                column,
                target,
            } => Self::ReferenceNotFound {
                model,
                column,
                target,
            },
            StorageError::Constraint { message } => Self::Constraint(message),
            err @ StorageError::AlreadyExists { .. } => Self::Constraint(err.to_string()),
            StorageError::InvalidRow { message } => Self::Validation(message),
            StorageError::Unsupported { message } => Self::Storage(message),
            StorageError::Internal { message } => Self::Internal(message),
        }
    }
}

impl From<ormgraph_model::ModelError> for GraphQLError {
    fn from(err: ormgraph_model::ModelError) -> Self {
        Self::SchemaBuildFailed(err.to_string())
    }
}
