//! Queries and mutations executed against the in-memory store.

use std::io;
use std::sync::{Arc, Mutex};

use async_graphql::Request;
use async_graphql::dynamic::Schema;
use ormgraph_graphql::types::encode_global_id;
use ormgraph_graphql::{GraphQLConfig, GraphQLContext, OrmSchemaBuilder};
use ormgraph_model::{Catalog, Column, Model, Relationship, SqlType};
use ormgraph_storage::DynStore;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tracing_subscriber::fmt::MakeWriter;

fn catalog() -> Arc<Catalog> {
    let user = Model::new("User", "users")
        .column(Column::new("id", SqlType::Integer).primary_key())
        .column(Column::new("full_name", SqlType::String).not_null())
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
        .column(Column::new("published_at", SqlType::DateTime))
        .column(Column::new("author_id", SqlType::Integer).foreign_key("User", "id"))
        .relationship(Relationship::many_to_one("author", "User"));

    Arc::new(Catalog::new([user, post]).unwrap())
}

struct Harness {
    schema: Schema,
    store: DynStore,
}

impl Harness {
    fn new() -> Self {
        Self::with_config(GraphQLConfig::default())
    }

    fn with_config(config: GraphQLConfig) -> Self {
        let catalog = catalog();
        let schema = OrmSchemaBuilder::new(Arc::clone(&catalog), config).build().unwrap();
        let store = ormgraph_db_memory::create_store(catalog);
        Self { schema, store }
    }

    async fn execute(&self, query: &str) -> async_graphql::Response {
        self.execute_as("test", query).await
    }

    async fn execute_as(&self, request_id: &str, query: &str) -> async_graphql::Response {
        let context = GraphQLContext::builder()
            .with_store(Arc::clone(&self.store))
            .with_request_id(request_id)
            .build()
            .unwrap();
        self.schema.execute(Request::new(query).data(context)).await
    }

    async fn data(&self, query: &str) -> Value {
        let response = self.execute(query).await;
        assert!(response.errors.is_empty(), "unexpected errors: {:?}", response.errors);
        response.data.into_json().unwrap()
    }

    async fn error(&self, query: &str) -> String {
        let response = self.execute(query).await;
        assert!(!response.errors.is_empty(), "expected an error for {query}");
        response.errors[0].message.clone()
    }

    async fn seed(&self) {
        self.data(
            r#"mutation {
                createUser(input: {fullName: "Ann", createAndAttachToPosts: [
                    {title: "Intro to GraphQL", rating: 4},
                    {title: "Advanced GraphQL", rating: 9},
                    {title: "Rust ownership", rating: 7}
                ]}) { id }
            }"#,
        )
        .await;
    }
}

#[tokio::test]
async fn create_edit_delete_round_trip() {
    let harness = Harness::new();
    let post_id = encode_global_id("Post", "1");

    let created = harness
        .data(
            r#"mutation {
                createPost(input: {
                    title: "Hello",
                    rating: 5,
                    metadata: "{\"tags\":[\"a\"]}",
                    createAndAttachToAuthor: {fullName: "Ann"}
                }) {
                    id
                    title
                    rating
                    metadata
                    author { fullName status }
                }
            }"#,
        )
        .await;
    assert_eq!(
        created,
        json!({
            "createPost": {
                "id": post_id,
                "title": "Hello",
                "rating": 5,
                "metadata": "{\"tags\":[\"a\"]}",
                "author": {"fullName": "Ann", "status": "active"}
            }
        })
    );

    let edited = harness
        .data(&format!(
            r#"mutation {{
                editPost(id: "{post_id}", input: {{title: "Hello again"}}) {{ title rating }}
            }}"#
        ))
        .await;
    assert_eq!(edited, json!({"editPost": {"title": "Hello again", "rating": 5}}));

    let deleted = harness
        .data(&format!(r#"mutation {{ deletePost(id: "{post_id}") {{ title }} }}"#))
        .await;
    assert_eq!(deleted, json!({"deletePost": {"title": "Hello again"}}));

    let read = harness.data(&format!(r#"{{ post(id: "{post_id}") {{ title }} }}"#)).await;
    assert_eq!(read, json!({"post": null}));

    let message = harness
        .error(&format!(r#"mutation {{ deletePost(id: "{post_id}") {{ title }} }}"#))
        .await;
    assert_eq!(message, "No such instance of type Post with id 1");
}

#[tokio::test]
async fn delete_by_keys() {
    let harness = Harness::new();
    harness.seed().await;

    let deleted = harness
        .data(r#"mutation { deletePost(keys: {id: "2"}) { title } }"#)
        .await;
    assert_eq!(deleted, json!({"deletePost": {"title": "Advanced GraphQL"}}));

    let message = harness
        .error(r#"mutation { deletePost(id: "1", keys: {id: "1"}) { title } }"#)
        .await;
    assert!(message.contains("exactly one of the arguments id and keys"), "{message}");
}

#[tokio::test]
async fn filter_and_order() {
    let harness = Harness::new();
    harness.seed().await;

    let data = harness
        .data(
            r#"{
                posts(filter: {title: {isLike: "%GraphQL%"}}, orderBy: ["rating desc"]) {
                    totalCount
                    edges { node { title rating } }
                }
            }"#,
        )
        .await;
    assert_eq!(
        data,
        json!({
            "posts": {
                "totalCount": 2,
                "edges": [
                    {"node": {"title": "Advanced GraphQL", "rating": 9}},
                    {"node": {"title": "Intro to GraphQL", "rating": 4}}
                ]
            }
        })
    );

    let data = harness
        .data(
            r#"{
                posts(filter: {rating: {greaterThan: 5}}, orderBy: ["title"]) {
                    edges { node { title } }
                }
            }"#,
        )
        .await;
    assert_eq!(
        data["posts"]["edges"],
        json!([
            {"node": {"title": "Advanced GraphQL"}},
            {"node": {"title": "Rust ownership"}}
        ])
    );

    let data = harness
        .data(r#"{ posts(filterBy: {title: "Rust ownership"}) { totalCount } }"#)
        .await;
    assert_eq!(data, json!({"posts": {"totalCount": 1}}));

    let message = harness.error(r#"{ posts(orderBy: ["author"]) { totalCount } }"#).await;
    assert!(message.contains("Cannot order Post by unknown field author"), "{message}");
}

#[tokio::test]
async fn date_time_filters_compare_instants() {
    let harness = Harness::new();
    harness
        .data(
            r#"mutation {
                createUser(input: {fullName: "Ann", createAndAttachToPosts: [
                    {title: "New year", publishedAt: "2023-12-31T20:00:00Z"},
                    {title: "Midsummer", publishedAt: "2024-06-01T12:00:00.5Z"},
                    {title: "Spring", publishedAt: "2023-04-01T09:00:00+02:00"}
                ]}) { id }
            }"#,
        )
        .await;

    let data = harness
        .data(
            r#"{
                posts(
                    filter: {publishedAt: {greaterThan: "2024-01-01T00:00:00+05:00"}},
                    orderBy: ["publishedAt desc"]
                ) {
                    totalCount
                    edges { node { title publishedAt } }
                }
            }"#,
        )
        .await;
    assert_eq!(
        data,
        json!({
            "posts": {
                "totalCount": 2,
                "edges": [
                    {"node": {"title": "Midsummer", "publishedAt": "2024-06-01T12:00:00.500000Z"}},
                    {"node": {"title": "New year", "publishedAt": "2023-12-31T20:00:00.000000Z"}}
                ]
            }
        })
    );

    let data = harness
        .data(
            r#"{
                posts(filter: {publishedAt: {greaterThan: "2024-06-01T12:00:00Z"}}) {
                    totalCount
                }
            }"#,
        )
        .await;
    assert_eq!(data, json!({"posts": {"totalCount": 1}}));

    let data = harness
        .data(r#"{ posts(orderBy: ["publishedAt desc"]) { edges { node { title } } } }"#)
        .await;
    assert_eq!(
        data["posts"]["edges"],
        json!([
            {"node": {"title": "Midsummer"}},
            {"node": {"title": "New year"}},
            {"node": {"title": "Spring"}}
        ])
    );
}

#[tokio::test]
async fn forward_pagination() {
    let harness = Harness::new();
    harness.seed().await;

    let first = harness
        .data(
            r#"{
                posts(first: 2, orderBy: ["id"]) {
                    totalCount
                    pageInfo { hasNextPage hasPreviousPage endCursor }
                    edges { node { title } }
                }
            }"#,
        )
        .await;
    assert_eq!(first["posts"]["totalCount"], json!(3));
    assert_eq!(first["posts"]["pageInfo"]["hasNextPage"], json!(true));
    assert_eq!(first["posts"]["pageInfo"]["hasPreviousPage"], json!(false));
    assert_eq!(first["posts"]["edges"].as_array().map(Vec::len), Some(2));

    let cursor = first["posts"]["pageInfo"]["endCursor"].as_str().unwrap().to_string();
    let next = harness
        .data(&format!(
            r#"{{
                posts(first: 2, after: "{cursor}", orderBy: ["id"]) {{
                    pageInfo {{ hasNextPage }}
                    edges {{ node {{ title }} }}
                }}
            }}"#
        ))
        .await;
    assert_eq!(
        next,
        json!({
            "posts": {
                "pageInfo": {"hasNextPage": false},
                "edges": [{"node": {"title": "Rust ownership"}}]
            }
        })
    );

    let message = harness.error(r#"{ posts(first: 1000) { totalCount } }"#).await;
    assert!(message.contains("must not exceed 100"), "{message}");
}

#[tokio::test]
async fn relationships_resolve_through_the_store() {
    let harness = Harness::new();
    harness.seed().await;
    let user_id = encode_global_id("User", "1");

    let data = harness
        .data(&format!(
            r#"{{
                user(id: "{user_id}") {{
                    fullName
                    posts(first: 1) {{
                        totalCount
                        edges {{ node {{ author {{ fullName }} }} }}
                    }}
                }}
            }}"#
        ))
        .await;
    assert_eq!(
        data,
        json!({
            "user": {
                "fullName": "Ann",
                "posts": {
                    "totalCount": 3,
                    "edges": [{"node": {"author": {"fullName": "Ann"}}}]
                }
            }
        })
    );
}

#[tokio::test]
async fn node_fetches_any_type() {
    let harness = Harness::new();
    harness.seed().await;
    let post_id = encode_global_id("Post", "3");

    let data = harness
        .data(&format!(
            r#"{{ node(id: "{post_id}") {{ id ... on Post {{ title }} }} }}"#
        ))
        .await;
    assert_eq!(data, json!({"node": {"id": post_id, "title": "Rust ownership"}}));

    let missing = encode_global_id("Post", "42");
    let data = harness.data(&format!(r#"{{ node(id: "{missing}") {{ id }} }}"#)).await;
    assert_eq!(data, json!({"node": null}));
}

#[tokio::test]
async fn bounded_ints_are_rejected() {
    let harness = Harness::new();

    let response = harness
        .execute(r#"mutation { createPost(input: {title: "Loud", rating: 300}) { id } }"#)
        .await;
    assert!(!response.errors.is_empty());
    assert_eq!(
        harness.data(r#"{ posts { totalCount } }"#).await,
        json!({"posts": {"totalCount": 0}})
    );
}

#[tokio::test]
async fn filter_objects_resolve_database_ids() {
    let harness = Harness::with_config(GraphQLConfig {
        filter_objects: true,
        ..Default::default()
    });
    harness.seed().await;
    let post_id = encode_global_id("Post", "2");

    let data = harness
        .data(&format!(r#"{{ post(id: "{post_id}") {{ id dbId title }} }}"#))
        .await;
    assert_eq!(
        data,
        json!({"post": {"id": post_id, "dbId": "2", "title": "Advanced GraphQL"}})
    );

    let data = harness
        .data(&format!(
            r#"{{ node(id: "{post_id}") {{ ... on DatabaseId {{ dbId }} }} }}"#
        ))
        .await;
    assert_eq!(data, json!({"node": {"dbId": "2"}}));
}

/// Collects formatted log lines.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[tokio::test]
async fn resolver_events_carry_the_request_id() {
    let logs = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(logs.clone())
        .finish();
    let _default = tracing::subscriber::set_default(subscriber);

    let harness = Harness::new();
    let response = harness
        .execute_as("req-42", r#"mutation { createUser(input: {fullName: "Ann"}) { id } }"#)
        .await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    let response = harness.execute_as("req-43", "{ users { totalCount } }").await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);

    let output = logs.contents();
    let created = output
        .lines()
        .find(|line| line.contains("Row created successfully"))
        .unwrap();
    assert!(created.contains("request_id=req-42"), "{created}");
    let listed = output
        .lines()
        .find(|line| line.contains("Connection query complete"))
        .unwrap();
    assert!(listed.contains("request_id=req-43"), "{listed}");
}
