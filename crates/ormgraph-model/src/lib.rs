//! # ormgraph-model
//!
//! ORM model metadata for the ormgraph schema generator.
//!
//! This crate describes database tables the way an ORM mapper exposes them:
//! columns with their SQL types, relationships between models, composite
//! attributes and computed (hybrid) properties. It contains no query logic;
//! the schema generator in `ormgraph-graphql` only ever reads these
//! structures.
//!
//! ## Overview
//!
//! - [`Catalog`] - the validated set of models, with inferred join columns
//! - [`Model`] - one mapped table
//! - [`Column`], [`SqlType`] - column metadata and the closed set of SQL types
//! - [`Relationship`], [`Composite`], [`Computed`] - the other property kinds
//! - [`OrmProperty`] - a tagged view over all property kinds of a model
//!
//! ## Example
//!
//! ```ignore
//! use ormgraph_model::{Catalog, Column, Model, Relationship, SqlType};
//!
//! let user = Model::new("User", "users")
//!     .column(Column::new("id", SqlType::Integer).primary_key())
//!     .column(Column::new("name", SqlType::String).not_null());
//!
//! let post = Model::new("Post", "posts")
//!     .column(Column::new("id", SqlType::Integer).primary_key())
//!     .column(Column::new("author_id", SqlType::Integer).foreign_key("User", "id"))
//!     .relationship(Relationship::many_to_one("author", "User"));
//!
//! let catalog = Catalog::new([user, post])?;
//! ```
//!
//! Catalogs can also be loaded from TOML or JSON documents with a top-level
//! `models` array, see [`Catalog::from_toml_str`].

mod catalog;
mod column;
mod error;
mod model;
mod relationship;
mod sql_type;

pub use catalog::{Catalog, CatalogFile};
pub use column::{Column, ForeignKey};
pub use error::ModelError;
pub use model::{Composite, Computed, Model, OrmProperty, PropertyKind};
pub use relationship::{Direction, Relationship};
pub use sql_type::{IntWidth, SqlType, TypeClass};

/// Result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;

/// Checks if a name is valid for GraphQL.
///
/// GraphQL names must match `[_a-zA-Z][_a-zA-Z0-9]*`.
pub fn is_valid_graphql_name(name: &str) -> bool {
    let mut chars = name.chars();

    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }

    chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_graphql_name() {
        assert!(is_valid_graphql_name("User"));
        assert!(is_valid_graphql_name("_internal"));
        assert!(is_valid_graphql_name("Blog_Post2"));

        assert!(!is_valid_graphql_name(""));
        assert!(!is_valid_graphql_name("2fa"));
        assert!(!is_valid_graphql_name("user-profile"));
        assert!(!is_valid_graphql_name("user.profile"));
    }
}
