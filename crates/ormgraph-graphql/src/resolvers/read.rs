//! Single row read resolvers.
//!
//! Implements resolvers for queries like `user(id: "1")`, fetching one row
//! by primary key, and the Relay `node(id: ...)` field.

use std::sync::Arc;

use async_graphql::dynamic::{FieldFuture, FieldValue, ResolverContext};
use tracing::{debug, warn};

use super::{SchemaIndex, get_graphql_context, parse_id, storage_error_to_graphql};
use crate::error::GraphQLError;
use crate::types::decode_global_id;

/// Extracts the required `id` argument.
pub(crate) fn id_argument<'a>(
    ctx: &'a ResolverContext<'_>,
) -> Result<&'a str, async_graphql::Error> {
    ctx.args
        .get("id")
        .and_then(|v| v.string().ok())
        .ok_or_else(|| async_graphql::Error::new("Missing required argument 'id'"))
}

/// Resolver for single row read operations.
pub struct ReadResolver;

impl ReadResolver {
    /// Creates a resolver function for reading a single row by ID.
    ///
    /// This is used to create the `user(id: ID!)` style query fields. The id
    /// may be the raw primary key or the global id of the row.
    pub fn resolve(
        index: Arc<SchemaIndex>,
        model: String,
    ) -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        move |ctx| {
            let index = Arc::clone(&index);
            let model = model.clone();
            FieldFuture::new(async move {
                let id = id_argument(&ctx)?;
                let gql_ctx = get_graphql_context(&ctx)?;
                let request_id = gql_ctx.request_id.as_str();
                debug!(
                    request_id = %request_id,
                    model = %model,
                    id = %id,
                    "Resolving single row read"
                );

                let ty = index.output_type(&model).map_err(GraphQLError::into_graphql_error)?;
                let orm_model = index.model_of(ty).map_err(GraphQLError::into_graphql_error)?;
                let key = parse_id(orm_model, &ty.name, id)?;

                let result = gql_ctx.store.get(&key).await.map_err(|e| {
                    warn!(request_id = %request_id, error = %e, "Storage error reading row");
                    storage_error_to_graphql(e)
                })?;

                match result {
                    Some(row) => Ok(Some(FieldValue::owned_any(row))),
                    None => {
                        // Missing rows resolve to null, not an error
                        debug!(request_id = %request_id, model = %model, id = %id, "Row not found");
                        Ok(None)
                    }
                }
            })
        }
    }
}

/// Resolver for the Relay `node(id: ID!)` root field.
pub struct NodeResolver;

impl NodeResolver {
    /// Creates the resolver, dispatching on the type encoded in the global
    /// id. Only object types implementing `Node` are reachable.
    pub fn resolve(
        index: Arc<SchemaIndex>,
    ) -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        move |ctx| {
            let index = Arc::clone(&index);
            FieldFuture::new(async move {
                let id = id_argument(&ctx)?;
                let (type_name, raw) = decode_global_id(id).ok_or_else(|| {
                    GraphQLError::Validation(format!("Invalid global id {id}")).into_graphql_error()
                })?;

                let ty = index
                    .registry
                    .types(index.output_family())
                    .find(|ty| ty.name == type_name && ty.is_node())
                    .ok_or_else(|| {
                        GraphQLError::Validation(format!("Unknown node type {type_name}"))
                            .into_graphql_error()
                    })?;
                let gql_ctx = get_graphql_context(&ctx)?;
                debug!(
                    request_id = %gql_ctx.request_id,
                    type_name = %type_name,
                    id = %raw,
                    "Resolving node"
                );

                let orm_model = index.model_of(ty).map_err(GraphQLError::into_graphql_error)?;
                let key = parse_id(orm_model, &ty.name, &raw)?;

                let row = gql_ctx.store.get(&key).await.map_err(storage_error_to_graphql)?;
                Ok(row.map(|row| FieldValue::owned_any(row).with_type(ty.name.clone())))
            })
        }
    }
}
