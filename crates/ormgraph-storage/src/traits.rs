//! The row store contract.

use async_trait::async_trait;

use crate::error::StorageError;
use crate::types::{Instance, Query, QueryResult, Row, RowKey};

/// A store of model rows.
///
/// The GraphQL resolvers only talk to the database through this trait.
/// Implementations must be thread-safe (`Send + Sync`). Rows are plain JSON
/// maps keyed by column name.
#[async_trait]
pub trait ModelStore: Send + Sync {
    /// Inserts an instance and all of its attached children.
    ///
    /// Many-to-one children are inserted first and their keys copied into the
    /// parent's foreign key columns; to-many children are inserted after the
    /// parent with their foreign keys pointing back at it. Returns the stored
    /// parent row, including generated keys and defaults.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::AlreadyExists` for a duplicate primary key,
    /// `StorageError::ReferenceNotFound` for a dangling foreign key and
    /// `StorageError::Constraint` for other rejected writes.
    async fn insert(&self, instance: Instance) -> Result<Row, StorageError>;

    /// Merges an instance into the row with the same primary key.
    ///
    /// Columns missing from the instance keep their stored value. When no
    /// row with that key exists the instance is inserted as a new row.
    /// Attached children are always inserted, as in [`ModelStore::insert`].
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidRow` when the instance lacks a primary
    /// key column, plus the errors of [`ModelStore::insert`].
    async fn merge(&self, instance: Instance) -> Result<Row, StorageError>;

    /// Reads a row by primary key.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure issues, not for missing rows.
    async fn get(&self, key: &RowKey) -> Result<Option<Row>, StorageError>;

    /// Deletes a row and returns it.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the row does not exist and
    /// `StorageError::Constraint` if other rows still reference it.
    async fn delete(&self, key: &RowKey) -> Result<Row, StorageError>;

    /// Runs a query over the rows of `model`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidRow` for unknown columns or
    /// relationships.
    async fn query(&self, model: &str, query: &Query) -> Result<QueryResult, StorageError>;

    /// Loads the rows reached from `row` through `relationship`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidRow` for an unknown relationship.
    async fn related(
        &self,
        model: &str,
        row: &Row,
        relationship: &str,
    ) -> Result<Vec<Row>, StorageError>;

    /// Returns the name of this backend for logging.
    fn backend_name(&self) -> &'static str;
}
