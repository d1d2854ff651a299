//! GraphQL resolvers for generated types.
//!
//! This module provides the resolver implementations wired into the schema:
//! - `read`: single rows by id and the Relay `node` field
//! - `connection`: paginated, filtered and ordered row lists
//! - `create`, `update`, `delete`: the generated mutations
//! - `fields`: column, composite and relationship fields of object types

mod connection;
mod create;
mod delete;
mod fields;
mod read;
mod update;

pub use connection::{ConnectionPage, ConnectionResolver, Edge, PageArgs, PageSlice};
pub use create::CreateResolver;
pub use delete::DeleteResolver;
pub use fields::{FieldResolver, RelationshipResolver};
pub use read::{NodeResolver, ReadResolver};
pub use update::UpdateResolver;

use std::sync::Arc;

use async_graphql::dynamic::{
    Field, FieldFuture, FieldValue, ResolverContext, TypeRef, ValueAccessor,
};
use async_graphql::{Error as GraphQLError, Value};
use ormgraph_model::{Catalog, Model};
use ormgraph_storage::{Row, RowKey, StorageError};

use crate::config::GraphQLConfig;
use crate::context::GraphQLContext;
use crate::convert::FamilyKind;
use crate::schema::{Registry, SchemaContext, SchemaType};
use crate::types::decode_global_id;

/// Read-only view of the generated schema shared by all resolvers.
#[derive(Debug)]
pub struct SchemaIndex {
    pub catalog: Arc<Catalog>,
    pub registry: Registry,
    pub config: GraphQLConfig,
}

impl SchemaIndex {
    /// Snapshots the generated types of a construction context.
    #[must_use]
    pub fn from_context(context: &SchemaContext) -> Self {
        Self {
            catalog: Arc::clone(context.catalog()),
            registry: context.registry().clone(),
            config: context.config().clone(),
        }
    }

    /// Returns the model a generated type was built from.
    pub(crate) fn model_of(&self, ty: &SchemaType) -> crate::Result<&Model> {
        self.catalog
            .get(&ty.model)
            .ok_or_else(|| crate::error::GraphQLError::UnknownModel(ty.model.clone()))
    }

    /// Family of the object types root fields return.
    #[must_use]
    pub fn output_family(&self) -> FamilyKind {
        if self.config.filter_objects {
            FamilyKind::FilterObject
        } else {
            FamilyKind::Object
        }
    }

    /// Returns the object type root fields return for `model`.
    pub(crate) fn output_type(&self, model: &str) -> crate::Result<&Arc<SchemaType>> {
        self.type_of(self.output_family(), model)
    }

    /// Returns the type of `model` in `family`.
    pub(crate) fn type_of(
        &self,
        family: FamilyKind,
        model: &str,
    ) -> crate::Result<&Arc<SchemaType>> {
        self.registry
            .get(family, model)
            .ok_or_else(|| crate::error::GraphQLError::UnknownModel(model.to_string()))
    }
}

/// Helper to extract GraphQL context from resolver context.
pub(crate) fn get_graphql_context<'a>(
    ctx: &'a ResolverContext<'_>,
) -> Result<&'a GraphQLContext, GraphQLError> {
    ctx.data::<GraphQLContext>()
        .map_err(|_| GraphQLError::new("GraphQL context not available"))
}

/// Returns the row an object type field is resolved on.
pub(crate) fn parent_row<'a>(ctx: &'a ResolverContext<'_>) -> Result<&'a Row, GraphQLError> {
    ctx.parent_value
        .try_downcast_ref::<Row>()
        .map_err(|_| GraphQLError::new("Parent value is not a row"))
}

/// A field reading `name` from a parent `Value::Object`.
pub fn value_field(name: &str, ty: TypeRef) -> Field {
    let key = name.to_string();
    Field::new(name, ty, move |ctx| {
        let key = key.clone();
        FieldFuture::new(async move {
            let value = match ctx.parent_value.as_value() {
                Some(Value::Object(obj)) => obj.get(key.as_str()).cloned(),
                _ => None,
            };
            Ok(value.map(FieldValue::value))
        })
    })
}

/// Converts a storage error to a GraphQL error carrying its code.
pub(crate) fn storage_error_to_graphql(error: StorageError) -> GraphQLError {
    crate::error::GraphQLError::from(error).into_graphql_error()
}

/// Returns the primary key of a stored row.
pub(crate) fn row_key(model: &Model, row: &Row) -> RowKey {
    let values = model
        .primary_key()
        .map(|column| row.get(&column.name).cloned().unwrap_or(serde_json::Value::Null))
        .collect();
    RowKey::new(model.name.clone(), values)
}

/// Parses an `id` argument into a primary key.
///
/// Accepts a global id of `type_name` or a raw primary key value. Composite
/// keys are JSON arrays such as `[1,"admin"]`.
pub(crate) fn parse_id(model: &Model, type_name: &str, id: &str) -> Result<RowKey, GraphQLError> {
    let raw = match decode_global_id(id) {
        Some((decoded_type, raw)) if decoded_type == type_name => raw,
        _ => id.to_string(),
    };

    let columns = model.primary_key().count();
    let values = if columns > 1 {
        match serde_json::from_str::<serde_json::Value>(&raw) {
            Ok(serde_json::Value::Array(values)) if values.len() == columns => values,
            _ => {
                return Err(crate::error::GraphQLError::Validation(format!(
                    "{} has a composite key; expected a JSON array of {columns} values, got {raw}",
                    model.name
                ))
                .into_graphql_error());
            }
        }
    } else {
        vec![serde_json::Value::String(raw)]
    };
    Ok(RowKey::new(model.name.clone(), values))
}

/// Convert a serde_json::Value to async_graphql::Value.
pub(crate) fn json_to_graphql_value(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Boolean(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Number(i.into())
            } else if let Some(u) = n.as_u64() {
                Value::Number(u.into())
            } else if let Some(f) = n.as_f64() {
                Value::Number(
                    async_graphql::Number::from_f64(f)
                        .unwrap_or_else(|| async_graphql::Number::from(0)),
                )
            } else {
                Value::Null
            }
        }
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(arr) => {
            Value::List(arr.into_iter().map(json_to_graphql_value).collect())
        }
        serde_json::Value::Object(obj) => {
            let map: async_graphql::indexmap::IndexMap<async_graphql::Name, Value> = obj
                .into_iter()
                .map(|(k, v)| (async_graphql::Name::new(k), json_to_graphql_value(v)))
                .collect();
            Value::Object(map)
        }
    }
}

/// Converts a ValueAccessor to serde_json::Value.
pub(crate) fn value_accessor_to_json(value: &ValueAccessor<'_>) -> serde_json::Value {
    graphql_value_to_json(value.as_value())
}

/// Converts a GraphQL Value to serde_json::Value.
pub(crate) fn graphql_value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Boolean(b) => serde_json::Value::Bool(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                serde_json::Value::Number(i.into())
            } else if let Some(f) = n.as_f64() {
                serde_json::json!(f)
            } else {
                serde_json::Value::Null
            }
        }
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::List(arr) => {
            serde_json::Value::Array(arr.iter().map(graphql_value_to_json).collect())
        }
        Value::Object(obj) => {
            let map = obj
                .iter()
                .map(|(k, v)| (k.to_string(), graphql_value_to_json(v)))
                .collect();
            serde_json::Value::Object(map)
        }
        Value::Enum(e) => serde_json::Value::String(e.to_string()),
        Value::Binary(b) => {
            use base64::Engine;
            serde_json::Value::String(base64::engine::general_purpose::STANDARD.encode(b))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ormgraph_model::{Column, SqlType};
    use serde_json::json;

    #[test]
    fn test_json_to_graphql_value_primitives() {
        assert!(matches!(json_to_graphql_value(json!(null)), Value::Null));
        assert!(matches!(json_to_graphql_value(json!(true)), Value::Boolean(true)));
        assert!(matches!(json_to_graphql_value(json!(42)), Value::Number(_)));
        assert!(matches!(json_to_graphql_value(json!("hello")), Value::String(s) if s == "hello"));
    }

    #[test]
    fn test_json_to_graphql_value_complex() {
        assert!(matches!(json_to_graphql_value(json!([1, 2, 3])), Value::List(_)));
        assert!(matches!(json_to_graphql_value(json!({"name": "John"})), Value::Object(_)));
    }

    #[test]
    fn test_graphql_value_to_json() {
        let value = json_to_graphql_value(json!({"a": [1, 2.5, "x", null], "b": true}));
        assert_eq!(graphql_value_to_json(&value), json!({"a": [1, 2.5, "x", null], "b": true}));
        assert_eq!(
            graphql_value_to_json(&Value::Enum(async_graphql::Name::new("draft"))),
            json!("draft")
        );
    }

    #[test]
    fn test_parse_id() {
        let user =
            Model::new("User", "users").column(Column::new("id", SqlType::Integer).primary_key());

        let key = parse_id(&user, "User", "7").unwrap();
        assert_eq!(key.values, vec![json!("7")]);

        let global = crate::types::encode_global_id("User", "7");
        assert_eq!(parse_id(&user, "User", &global).unwrap().values, vec![json!("7")]);

        // A global id of another type is taken literally.
        let other = crate::types::encode_global_id("Post", "7");
        assert_eq!(parse_id(&user, "User", &other).unwrap().values, vec![json!(other)]);
    }

    #[test]
    fn test_parse_composite_id() {
        let membership = Model::new("Membership", "memberships")
            .column(Column::new("user_id", SqlType::Integer).primary_key())
            .column(Column::new("role", SqlType::String).primary_key());

        let key = parse_id(&membership, "Membership", r#"[1,"admin"]"#).unwrap();
        assert_eq!(key.values, vec![json!(1), json!("admin")]);
        assert!(parse_id(&membership, "Membership", "1").is_err());
    }

    #[test]
    fn test_row_key() {
        let user =
            Model::new("User", "users").column(Column::new("id", SqlType::Integer).primary_key());
        let row = json!({"id": 3, "name": "Ann"}).as_object().cloned().unwrap();
        assert_eq!(row_key(&user, &row).id(), "3");
    }
}
