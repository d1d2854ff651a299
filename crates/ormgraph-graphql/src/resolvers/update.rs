//! Edit mutation resolver.
//!
//! Handles `edit{Model}` mutations. Only the given columns change; a row
//! missing from the store is inserted.

use std::sync::Arc;

use async_graphql::dynamic::{FieldFuture, FieldValue, ResolverContext};
use tracing::{debug, warn};

use super::create::input_object;
use super::read::id_argument;
use super::{SchemaIndex, get_graphql_context, parse_id, storage_error_to_graphql};
use crate::convert::FamilyKind;
use crate::error::GraphQLError;
use crate::input::convert_to_instance;

/// Resolver for row edit mutations.
pub struct UpdateResolver;

impl UpdateResolver {
    /// Creates a resolver for `edit{Model}(id: ID!, input: {Model}EditInput!)`.
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
                    "Processing edit mutation"
                );

                let input = input_object(&ctx)?;

                let output = index.output_type(&model).map_err(GraphQLError::into_graphql_error)?;
                let orm_model = index.model_of(output).map_err(GraphQLError::into_graphql_error)?;
                let key = parse_id(orm_model, &output.name, id)?;

                let ty = index
                    .type_of(FamilyKind::EditInput, &model)
                    .map_err(GraphQLError::into_graphql_error)?;
                let mut instance = convert_to_instance(&index, ty, &input)
                    .map_err(GraphQLError::into_graphql_error)?;

                // The key always comes from `id`.
                for (column, value) in orm_model.primary_key().zip(key.values) {
                    instance.values.insert(column.name.clone(), value);
                }

                let row = gql_ctx.store.merge(instance).await.map_err(|e| {
                    warn!(
                        request_id = %request_id,
                        error = %e,
                        model = %model,
                        id = %id,
                        "Edit failed"
                    );
                    storage_error_to_graphql(e)
                })?;

                debug!(
                    request_id = %request_id,
                    model = %model,
                    id = %id,
                    "Row edited successfully"
                );
                Ok(Some(FieldValue::owned_any(row)))
            })
        }
    }
}
