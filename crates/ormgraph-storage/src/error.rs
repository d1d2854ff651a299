//! Storage error types.

use std::fmt;

/// Errors raised by a [`crate::ModelStore`].
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The requested row does not exist.
    #[error("Row not found: {model}/{id}")]
    NotFound {
        /// Model name.
        model: String,
        /// Rendered primary key.
        id: String,
    },

    /// A foreign key value points at a row that does not exist.
    #[error("Referenced {target} not found for {model}.{column}")]
    ReferenceNotFound {
        /// Model holding the foreign key.
        model: String,
        /// Foreign key column.
        column: String,
        /// Rendered `Model/id` of the missing row.
        target: String,
    },

    /// A row with the same primary key already exists.
    #[error("Row already exists: {model}/{id}")]
    AlreadyExists {
        /// Model name.
        model: String,
        /// Rendered primary key.
        id: String,
    },

    /// The store rejected a write. The message is the store's own and is
    /// passed to clients unchanged.
    #[error("{message}")]
    Constraint {
        /// Store-provided message.
        message: String,
    },

    /// The row or query is malformed for the model.
    #[error("Invalid row: {message}")]
    InvalidRow {
        /// Description of the problem.
        message: String,
    },

    /// The backend does not support the requested operation.
    #[error("Unsupported operation: {message}")]
    Unsupported {
        /// Description of the operation.
        message: String,
    },

    /// An internal storage error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl StorageError {
    #[must_use]
    pub fn not_found(model: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            model: model.into(),
            id: id.into(),
        }
    }

    #[must_use]
    pub fn reference_not_found(
        model: impl Into<String>,
        column: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self::ReferenceNotFound {
            model: model.into(),
            column: column.into(),
            target: target.into(),
        }
    }

    #[must_use]
    pub fn already_exists(model: impl Into<String>, id: impl Into<String>) -> Self {
        Self::AlreadyExists {
            model: model.into(),
            id: id.into(),
        }
    }

    #[must_use]
    pub fn constraint(message: impl Into<String>) -> Self {
        Self::Constraint {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn invalid_row(message: impl Into<String>) -> Self {
        Self::InvalidRow {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if a write was rejected by the store.
    #[must_use]
    pub fn is_constraint(&self) -> bool {
        matches!(
            self,
            Self::Constraint { .. } | Self::AlreadyExists { .. } | Self::ReferenceNotFound { .. }
        )
    }

    /// Returns the error category for logging purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::ReferenceNotFound { .. }
            | Self::AlreadyExists { .. }
            | Self::Constraint { .. } => ErrorCategory::Constraint,
            Self::InvalidRow { .. } => ErrorCategory::Validation,
            Self::Unsupported { .. } => ErrorCategory::Unsupported,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }
}

/// Categories of storage errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    NotFound,
    Constraint,
    Validation,
    Unsupported,
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::Constraint => write!(f, "constraint"),
            Self::Validation => write!(f, "validation"),
            Self::Unsupported => write!(f, "unsupported"),
            Self::Internal => write!(f, "internal"),
        }
    }
}
