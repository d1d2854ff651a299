//! Field resolvers of generated object types.
//!
//! Object types resolve on a stored [`Row`] held as the parent value.

use std::sync::Arc;

use async_graphql::dynamic::{FieldFuture, FieldValue, ResolverContext};
use async_graphql::indexmap::IndexMap;
use async_graphql::{Name, Value};
use ormgraph_storage::render_value;
use tracing::{trace, warn};

use super::{
    SchemaIndex, get_graphql_context, json_to_graphql_value, parent_row, row_key,
    storage_error_to_graphql,
};
use crate::error::GraphQLError;
use crate::schema::{FieldSpec, ValueKind};
use crate::types::encode_global_id;

/// Resolver for value fields.
pub struct FieldResolver;

impl FieldResolver {
    /// Creates the resolver of the global `id` field of a node type.
    pub fn global_id(
        index: Arc<SchemaIndex>,
        type_name: String,
        model: String,
    ) -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        move |ctx| {
            let index = Arc::clone(&index);
            let type_name = type_name.clone();
            let model = model.clone();
            FieldFuture::new(async move {
                let row = parent_row(&ctx)?;
                let model = index
                    .catalog
                    .get(&model)
                    .ok_or_else(|| GraphQLError::UnknownModel(model.clone()).into_graphql_error())?;
                let id = encode_global_id(&type_name, &row_key(model, row).id());
                Ok(Some(FieldValue::value(Value::String(id))))
            })
        }
    }

    /// Creates the resolver of the `dbId` field of a `DatabaseId` type.
    pub fn database_id(
        index: Arc<SchemaIndex>,
        model: String,
    ) -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        move |ctx| {
            let index = Arc::clone(&index);
            let model = model.clone();
            FieldFuture::new(async move {
                let row = parent_row(&ctx)?;
                let model = index
                    .catalog
                    .get(&model)
                    .ok_or_else(|| GraphQLError::UnknownModel(model.clone()).into_graphql_error())?;
                Ok(Some(FieldValue::value(Value::String(row_key(model, row).id()))))
            })
        }
    }

    /// Creates the resolver of a column, composite or computed field.
    pub fn value(
        spec: FieldSpec,
    ) -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        let kind = spec.value_kind().cloned().unwrap_or(ValueKind::Plain);
        let property = spec.property;
        move |ctx| {
            let kind = kind.clone();
            let property = property.clone();
            FieldFuture::new(async move {
                let row = parent_row(&ctx)?;
                let value = match &kind {
                    ValueKind::Composite(columns) => composite_value(row, columns),
                    kind => output_value(kind, row.get(&property).cloned().unwrap_or_default()),
                };
                Ok(match value {
                    Value::Null => None,
                    value => Some(FieldValue::value(value)),
                })
            })
        }
    }
}

/// Converts a stored column value to its GraphQL output value.
pub(crate) fn output_value(kind: &ValueKind, value: serde_json::Value) -> Value {
    match (kind, value) {
        (_, serde_json::Value::Null) => Value::Null,
        (ValueKind::Json, value) => Value::String(value.to_string()),
        (kind, serde_json::Value::Array(items)) => {
            Value::List(items.into_iter().map(|item| output_value(kind, item)).collect())
        }
        (ValueKind::Id, value) => Value::String(render_value(&value)),
        (ValueKind::Enum, serde_json::Value::String(name)) => Value::Enum(Name::new(name)),
        (_, value) => json_to_graphql_value(value),
    }
}

/// An object of the composite's columns, or null when all are null.
fn composite_value(row: &ormgraph_storage::Row, columns: &[String]) -> Value {
    let parts: IndexMap<Name, Value> = columns
        .iter()
        .map(|column| {
            let value = row.get(column).cloned().unwrap_or_default();
            (Name::new(column), json_to_graphql_value(value))
        })
        .collect();
    if parts.values().all(|v| matches!(v, Value::Null)) {
        Value::Null
    } else {
        Value::Object(parts)
    }
}

/// Resolver for relationship fields.
pub struct RelationshipResolver;

impl RelationshipResolver {
    /// Creates the resolver of a to-one relationship field.
    pub fn single(
        model: String,
        relationship: String,
    ) -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        move |ctx| {
            let model = model.clone();
            let relationship = relationship.clone();
            FieldFuture::new(async move {
                let gql_ctx = get_graphql_context(&ctx)?;
                let row = parent_row(&ctx)?;
                trace!(
                    request_id = %gql_ctx.request_id,
                    model = %model,
                    relationship = %relationship,
                    "Resolving related row"
                );

                let related = gql_ctx
                    .store
                    .related(&model, row, &relationship)
                    .await
                    .map_err(|e| {
                        warn!(
                            request_id = %gql_ctx.request_id,
                            error = %e,
                            model = %model,
                            relationship = %relationship,
                            "Failed to load related row"
                        );
                        storage_error_to_graphql(e)
                    })?;
                Ok(related.into_iter().next().map(FieldValue::owned_any))
            })
        }
    }

    /// Creates the resolver of a to-many relationship field rendered as a
    /// plain list.
    pub fn list(
        model: String,
        relationship: String,
    ) -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        move |ctx| {
            let model = model.clone();
            let relationship = relationship.clone();
            FieldFuture::new(async move {
                let gql_ctx = get_graphql_context(&ctx)?;
                let row = parent_row(&ctx)?;
                let related = gql_ctx
                    .store
                    .related(&model, row, &relationship)
                    .await
                    .map_err(storage_error_to_graphql)?;
                Ok(Some(FieldValue::list(related.into_iter().map(FieldValue::owned_any))))
            })
        }
    }
}
