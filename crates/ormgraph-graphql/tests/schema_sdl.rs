//! Shape of the generated schema.

use std::sync::Arc;

use ormgraph_graphql::{GraphQLConfig, OrmSchemaBuilder};
use ormgraph_model::{Catalog, Column, Model, Relationship, SqlType};

fn catalog() -> Arc<Catalog> {
    let author = Model::new("Author", "authors")
        .column(Column::new("id", SqlType::Integer).primary_key())
        .column(Column::new("name", SqlType::String).not_null())
        .column(Column::new("born_at", SqlType::DateTime))
        .relationship(Relationship::one_to_many("books", "Book"));

    let book = Model::new("Book", "books")
        .column(Column::new("id", SqlType::Integer).primary_key())
        .column(Column::new("title", SqlType::String).not_null())
        .column(Column::new("pages", SqlType::SmallInt))
        .column(Column::new("price", SqlType::Float))
        .column(Column::new("author_id", SqlType::Integer).foreign_key("Author", "id"))
        .relationship(Relationship::many_to_one("author", "Author"));

    Arc::new(Catalog::new([author, book]).unwrap())
}

fn sdl(config: GraphQLConfig) -> String {
    OrmSchemaBuilder::new(catalog(), config).build().unwrap().sdl()
}

#[test]
fn object_types_have_relay_fields() {
    let sdl = sdl(GraphQLConfig::default());

    assert!(sdl.contains("interface Node"));
    assert!(sdl.contains("type Book implements Node"));
    assert!(sdl.contains("type BookConnection"));
    assert!(sdl.contains("type BookEdge"));
    assert!(sdl.contains("totalCount: Int"));
    assert!(sdl.contains("type PageInfo"));
    assert!(sdl.contains("scalar SignedInt16"));
    assert!(sdl.contains("scalar DateTime"));
}

#[test]
fn every_input_family_is_generated() {
    let sdl = sdl(GraphQLConfig::default());

    for name in [
        "input BookInput",
        "input BookCreateInput",
        "input BookEditInput",
        "input BookKeysInput",
        "input BookDeleteInput",
        "input BookFilterInput",
        "input BookFilterByInput",
        "input StringFilterInput",
        "input SignedInt32FilterInput",
    ] {
        assert!(sdl.contains(name), "missing {name}");
    }

    assert!(sdl.contains("attachToAuthor: ID"));
    assert!(sdl.contains("createAndAttachToAuthor: AuthorCreateInput"));
}

#[test]
fn root_fields_follow_model_names() {
    let sdl = sdl(GraphQLConfig::default());

    assert!(sdl.contains("node("));
    assert!(sdl.contains("book(id: ID!): Book"));
    assert!(sdl.contains("books("));
    assert!(sdl.contains("filter: BookFilterInput"));
    assert!(sdl.contains("filterBy: BookFilterByInput"));
    assert!(sdl.contains("createBook(input: BookCreateInput!): Book"));
    assert!(sdl.contains("editBook(id: ID!, input: BookEditInput!): Book"));
    assert!(sdl.contains("deleteBook("));
}

#[test]
fn relay_node_can_be_disabled() {
    let sdl = sdl(GraphQLConfig {
        relay_node: false,
        ..Default::default()
    });

    assert!(!sdl.contains("interface Node"));
    assert!(!sdl.contains("node("));
    assert!(sdl.contains("type Book {"));
}

#[test]
fn excluded_models_are_left_out() {
    let sdl = sdl(GraphQLConfig {
        exclude_models: vec!["Author".into()],
        ..Default::default()
    });

    assert!(sdl.contains("type Book implements Node"));
    assert!(!sdl.contains("type Author "));
    assert!(!sdl.contains("authors("));
    assert!(!sdl.contains("createAndAttachToAuthor"));
}

#[test]
fn filter_objects_expose_database_ids() {
    let sdl = sdl(GraphQLConfig {
        filter_objects: true,
        ..Default::default()
    });

    assert!(sdl.contains("interface DatabaseId"));
    let book = sdl
        .lines()
        .find(|line| line.starts_with("type Book implements"))
        .unwrap();
    assert!(book.contains("Node"), "{book}");
    assert!(book.contains("DatabaseId"), "{book}");
    assert!(sdl.contains("dbId: ID!"));
    assert!(sdl.contains("totalCount: Int"));
}

#[test]
fn database_id_interface_needs_filter_objects() {
    let sdl = sdl(GraphQLConfig::default());
    assert!(!sdl.contains("DatabaseId"));
    assert!(!sdl.contains("dbId"));
}
