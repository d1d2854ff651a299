//! Shared fixtures for unit tests.

use std::sync::Arc;

use ormgraph_model::{Catalog, Column, Model, Relationship, SqlType};

use crate::config::GraphQLConfig;
use crate::resolvers::SchemaIndex;
use crate::schema::{SchemaContext, generate_types};

/// Users with posts.
pub(crate) fn post_catalog() -> Arc<Catalog> {
    let user = Model::new("User", "users")
        .column(Column::new("id", SqlType::Integer).primary_key())
        .column(Column::new("full_name", SqlType::String).not_null())
        .column(Column::new("email", SqlType::String))
        .column(
            Column::new("status", SqlType::Enum {
                name: Some("user_status".into()),
                variants: vec!["active".into(), "banned".into()],
            })
            .not_null()
            .default_value("active".into()),
        )
        .relationship(Relationship::one_to_many("posts", "Post"));

    let post = Model::new("Post", "posts")
        .column(Column::new("id", SqlType::Integer).primary_key())
        .column(Column::new("title", SqlType::String).not_null())
        .column(Column::new("metadata", SqlType::Json))
        .column(Column::new("rating", SqlType::TinyInt))
        .column(Column::new("author_id", SqlType::Integer).foreign_key("User", "id"))
        .relationship(Relationship::many_to_one("author", "User"));

    Arc::new(Catalog::new([user, post]).unwrap())
}

/// Generates every type of `catalog` with the default configuration.
pub(crate) fn index(catalog: Arc<Catalog>) -> SchemaIndex {
    let mut ctx = SchemaContext::new(catalog, GraphQLConfig::default());
    generate_types(&mut ctx).unwrap();
    SchemaIndex::from_context(&ctx)
}
