//! Delete mutation resolver.
//!
//! Handles `delete{Model}` mutations. The row is addressed either by `id` or
//! by its primary key columns in `keys`, never both.

use std::sync::Arc;

use async_graphql::dynamic::{FieldFuture, FieldValue, ResolverContext};
use ormgraph_storage::RowKey;
use tracing::{debug, warn};

use super::{
    SchemaIndex, get_graphql_context, parse_id, storage_error_to_graphql, value_accessor_to_json,
};
use crate::convert::FamilyKind;
use crate::error::GraphQLError;
use crate::input::convert_to_instance;

/// Resolver for row deletion mutations.
pub struct DeleteResolver;

impl DeleteResolver {
    /// Creates a resolver for `delete{Model}(id: ID, keys: {Model}KeysInput)`.
    pub fn resolve(
        index: Arc<SchemaIndex>,
        model: String,
    ) -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        move |ctx| {
            let index = Arc::clone(&index);
            let model = model.clone();

            FieldFuture::new(async move {
                let gql_ctx = get_graphql_context(&ctx)?;
                let request_id = gql_ctx.request_id.as_str();
                let key = delete_key(&index, &model, &ctx)?;
                debug!(
                    request_id = %request_id,
                    model = %model,
                    id = %key.id(),
                    "Processing delete mutation"
                );

                let row = gql_ctx.store.delete(&key).await.map_err(|e| {
                    warn!(
                        request_id = %request_id,
                        error = %e,
                        model = %model,
                        id = %key.id(),
                        "Delete failed"
                    );
                    storage_error_to_graphql(e)
                })?;

                debug!(
                    request_id = %request_id,
                    model = %model,
                    id = %key.id(),
                    "Row deleted successfully"
                );
                Ok(Some(FieldValue::owned_any(row)))
            })
        }
    }
}

/// Reads the key of the row to delete from exactly one of `id` and `keys`.
fn delete_key(
    index: &SchemaIndex,
    model: &str,
    ctx: &ResolverContext<'_>,
) -> Result<RowKey, async_graphql::Error> {
    let id = ctx.args.get("id").filter(|v| !v.is_null());
    let keys = ctx.args.get("keys").filter(|v| !v.is_null());

    let output = index.output_type(model).map_err(GraphQLError::into_graphql_error)?;
    let orm_model = index.model_of(output).map_err(GraphQLError::into_graphql_error)?;

    match (id, keys) {
        (Some(id), None) => {
            let id = id
                .string()
                .map_err(|_| async_graphql::Error::new("Argument 'id' must be a string"))?;
            parse_id(orm_model, &output.name, id)
        }
        (None, Some(keys)) => {
            let serde_json::Value::Object(keys) = value_accessor_to_json(&keys) else {
                return Err(async_graphql::Error::new("Argument 'keys' must be an input object"));
            };
            let ty = index
                .type_of(FamilyKind::KeysInput, model)
                .map_err(GraphQLError::into_graphql_error)?;
            let instance = convert_to_instance(index, ty, &keys)
                .map_err(GraphQLError::into_graphql_error)?;

            let values = orm_model
                .primary_key()
                .map(|column| {
                    instance.values.get(&column.name).cloned().ok_or_else(|| {
                        GraphQLError::Validation(format!(
                            "Missing key column {} of {model}",
                            column.name
                        ))
                        .into_graphql_error()
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(RowKey::new(model, values))
        }
        _ => Err(GraphQLError::Validation(format!(
            "delete{model} takes exactly one of the arguments id and keys"
        ))
        .into_graphql_error()),
    }
}
