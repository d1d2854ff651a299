//! Behavior tests for the in-memory store.

use std::sync::Arc;

use ormgraph_db_memory::InMemoryStore;
use ormgraph_model::{Catalog, Column, Model, Relationship, SqlType};
use ormgraph_storage::{
    Comparator, Filter, Instance, ModelStore, OrderBy, Query, Row, RowKey, StorageError,
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

fn catalog() -> Arc<Catalog> {
    let user = Model::new("User", "users")
        .column(Column::new("id", SqlType::Integer).primary_key())
        .column(Column::new("name", SqlType::String).not_null())
        .column(Column::new("age", SqlType::SmallInt))
        .column(
            Column::new("created_at", SqlType::DateTime)
                .not_null()
                .server_default("now()"),
        )
        .relationship(Relationship::one_to_many("posts", "Post"));

    let post = Model::new("Post", "posts")
        .column(Column::new("id", SqlType::Integer).primary_key())
        .column(Column::new("title", SqlType::String).not_null())
        .column(Column::new("author_id", SqlType::Integer).foreign_key("User", "id"))
        .relationship(Relationship::many_to_one("author", "User"))
        .relationship(Relationship::many_to_many("tags", "Tag").secondary("PostTag"));

    let tag = Model::new("Tag", "tags")
        .column(Column::new("id", SqlType::Integer).primary_key())
        .column(Column::new("name", SqlType::String).not_null());

    let post_tag = Model::new("PostTag", "post_tags")
        .column(
            Column::new("post_id", SqlType::Integer)
                .primary_key()
                .foreign_key("Post", "id"),
        )
        .column(
            Column::new("tag_id", SqlType::Integer)
                .primary_key()
                .foreign_key("Tag", "id"),
        );

    Arc::new(Catalog::new([user, post, tag, post_tag]).unwrap())
}

fn user(name: &str, age: i64) -> Instance {
    Instance::new("User")
        .with_value("name", json!(name))
        .with_value("age", json!(age))
}

fn names(rows: &[Row]) -> Vec<&str> {
    rows.iter()
        .filter_map(|r| r.get("name").and_then(Value::as_str))
        .collect()
}

#[tokio::test]
async fn test_insert_generates_keys_and_defaults() {
    let store = InMemoryStore::new(catalog());

    let ann = store.insert(user("Ann", 31)).await.unwrap();
    let bob = store.insert(user("Bob", 25)).await.unwrap();

    assert_eq!(ann.get("id"), Some(&json!(1)));
    assert_eq!(bob.get("id"), Some(&json!(2)));
    assert!(ann.get("created_at").and_then(Value::as_str).is_some());
    assert_eq!(store.count("User"), 2);
}

#[tokio::test]
async fn test_not_null_violation_is_reported_verbatim() {
    let store = InMemoryStore::new(catalog());

    let err = store
        .insert(Instance::new("User").with_value("age", json!(3)))
        .await
        .unwrap_err();

    assert!(matches!(err, StorageError::Constraint { .. }));
    assert_eq!(err.to_string(), "NOT NULL constraint failed: users.name");
    assert_eq!(store.total_count(), 0);
}

#[tokio::test]
async fn test_dangling_foreign_key() {
    let store = InMemoryStore::new(catalog());

    let err = store
        .insert(
            Instance::new("Post")
                .with_value("title", json!("Orphan"))
                .with_value("author_id", json!(99)),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, StorageError::ReferenceNotFound { .. }));
}

#[tokio::test]
async fn test_cascade_insert_and_related() {
    let store = InMemoryStore::new(catalog());

    let post = store
        .insert(
            Instance::new("Post")
                .with_value("title", json!("Hello"))
                .attach("author", user("Ann", 31))
                .attach("tags", Instance::new("Tag").with_value("name", json!("rust")))
                .attach("tags", Instance::new("Tag").with_value("name", json!("graphql"))),
        )
        .await
        .unwrap();

    assert_eq!(post.get("author_id"), Some(&json!(1)));
    assert_eq!(store.count("PostTag"), 2);

    let author = store.related("Post", &post, "author").await.unwrap();
    assert_eq!(names(&author), vec!["Ann"]);

    let tags = store.related("Post", &post, "tags").await.unwrap();
    assert_eq!(names(&tags), vec!["rust", "graphql"]);

    let posts = store.related("User", &author[0], "posts").await.unwrap();
    assert_eq!(posts.len(), 1);
}

#[tokio::test]
async fn test_failed_cascade_rolls_back() {
    let store = InMemoryStore::new(catalog());

    let err = store
        .insert(
            Instance::new("Post")
                .with_value("title", json!("Hello"))
                .attach("author", user("Ann", 31))
                .attach("tags", Instance::new("Tag")),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, StorageError::Constraint { .. }));
    assert_eq!(store.total_count(), 0);
}

#[tokio::test]
async fn test_merge_updates_or_inserts() {
    let store = InMemoryStore::new(catalog());
    store.insert(user("Ann", 31)).await.unwrap();

    let changes = Instance::new("User")
        .with_value("id", json!("1"))
        .with_value("age", json!(32));
    let merged = store.merge(changes).await.unwrap();
    assert_eq!(merged.get("name"), Some(&json!("Ann")));
    assert_eq!(merged.get("age"), Some(&json!(32)));

    let fresh = Instance::new("User")
        .with_value("id", json!(10))
        .with_value("name", json!("Zed"));
    store.merge(fresh).await.unwrap();
    assert_eq!(store.count("User"), 2);

    // The sequence continues past explicit keys.
    let next = store.insert(user("Cy", 20)).await.unwrap();
    assert_eq!(next.get("id"), Some(&json!(11)));
}

#[tokio::test]
async fn test_merge_attaches_children_and_restores_on_failure() {
    let store = InMemoryStore::new(catalog());
    store.insert(user("Ann", 31)).await.unwrap();

    let edit = Instance::new("User")
        .with_value("id", json!(1))
        .with_value("age", json!(40))
        .attach("posts", Instance::new("Post").with_value("title", json!("Later")));
    store.merge(edit).await.unwrap();
    assert_eq!(store.count("Post"), 1);

    let broken = Instance::new("User")
        .with_value("id", json!(1))
        .with_value("age", json!(50))
        .attach("posts", Instance::new("Post"));
    let err = store.merge(broken).await.unwrap_err();
    assert!(matches!(err, StorageError::Constraint { .. }));

    let ann = store
        .get(&RowKey::new("User", vec![json!(1)]))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(ann.get("age"), Some(&json!(40)));
    assert_eq!(store.count("Post"), 1);
}

#[tokio::test]
async fn test_delete_restricts_referenced_rows() {
    let store = InMemoryStore::new(catalog());
    let post = store
        .insert(
            Instance::new("Post")
                .with_value("title", json!("Hello"))
                .attach("author", user("Ann", 31)),
        )
        .await
        .unwrap();

    let ann = RowKey::new("User", vec![json!("1")]);
    let err = store.delete(&ann).await.unwrap_err();
    assert!(matches!(err, StorageError::Constraint { .. }));

    let post_key = RowKey::new("Post", vec![post["id"].clone()]);
    store.delete(&post_key).await.unwrap();
    let deleted = store.delete(&ann).await.unwrap();
    assert_eq!(deleted.get("name"), Some(&json!("Ann")));
    assert_eq!(store.total_count(), 0);

    let err = store.delete(&ann).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_query_filter_order_page() {
    let store = InMemoryStore::new(catalog());
    for (name, age) in [("Ann", 31), ("Bob", 25), ("Cid", 40), ("Dee", 25)] {
        store.insert(user(name, age)).await.unwrap();
    }

    let query = Query::new()
        .with_filter(Filter::compare("age", Comparator::Le, json!(31)))
        .with_order(OrderBy::desc("age"));
    let result = store.query("User", &query).await.unwrap();
    assert_eq!(result.total, 3);
    assert_eq!(names(&result.rows), vec!["Ann", "Bob", "Dee"]);

    let query = Query::new().with_filter_by("age", json!("25")).with_offset(1);
    let result = store.query("User", &query).await.unwrap();
    assert_eq!(result.total, 2);
    assert_eq!(names(&result.rows), vec!["Dee"]);

    let query = Query::new()
        .with_filter(Filter::compare("name", Comparator::Like, json!("%e%")))
        .with_limit(5);
    let result = store.query("User", &query).await.unwrap();
    assert_eq!(names(&result.rows), vec!["Dee"]);
}

#[tokio::test]
async fn test_query_related_filter() {
    let store = InMemoryStore::new(catalog());
    store
        .insert(
            Instance::new("Post")
                .with_value("title", json!("Rust"))
                .attach("author", user("Ann", 31)),
        )
        .await
        .unwrap();
    store.insert(user("Bob", 25)).await.unwrap();

    let query = Query::new().with_filter(Filter::related(
        "posts",
        Filter::compare("title", Comparator::Eq, json!("Rust")),
    ));
    let result = store.query("User", &query).await.unwrap();
    assert_eq!(names(&result.rows), vec!["Ann"]);

    let err = store
        .query("User", &Query::new().with_order(OrderBy::asc("missing")))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::InvalidRow { .. }));
}

#[tokio::test]
async fn test_date_times_compare_as_instants() {
    let store = InMemoryStore::new(catalog());
    for (name, at) in [
        ("Ann", "2023-12-31T20:00:00Z"),
        ("Bob", "2024-06-01T12:00:00.5Z"),
        ("Cid", "2023-06-01T09:00:00+02:00"),
    ] {
        store
            .insert(user(name, 30).with_value("created_at", json!(at)))
            .await
            .unwrap();
    }

    // 20:00Z on Dec 31 is already past midnight at +05:00.
    let query = Query::new()
        .with_filter(Filter::compare(
            "created_at",
            Comparator::Gt,
            json!("2024-01-01T00:00+05:00"),
        ))
        .with_order(OrderBy::asc("created_at"));
    let result = store.query("User", &query).await.unwrap();
    assert_eq!(result.total, 2);
    assert_eq!(names(&result.rows), vec!["Ann", "Bob"]);

    let query = Query::new().with_filter(Filter::compare(
        "created_at",
        Comparator::Gt,
        json!("2024-06-01T12:00:00Z"),
    ));
    let result = store.query("User", &query).await.unwrap();
    assert_eq!(result.total, 1);
    assert_eq!(names(&result.rows), vec!["Bob"]);

    let query = Query::new().with_order(OrderBy::desc("created_at"));
    let result = store.query("User", &query).await.unwrap();
    assert_eq!(names(&result.rows), vec!["Bob", "Ann", "Cid"]);
    assert_eq!(
        result.rows[2].get("created_at"),
        Some(&json!("2023-06-01T07:00:00.000000Z"))
    );

    let err = store
        .insert(user("Dee", 30).with_value("created_at", json!("soon")))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::InvalidRow { .. }));
}
