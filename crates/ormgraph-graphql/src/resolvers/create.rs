//! Create mutation resolver.
//!
//! Handles `create{Model}` mutations for inserting new rows, together with
//! any related rows nested in the input.

use std::sync::Arc;

use async_graphql::dynamic::{FieldFuture, FieldValue, ResolverContext};
use serde_json::{Map, Value};
use tracing::{debug, trace, warn};

use super::{
    SchemaIndex, get_graphql_context, row_key, storage_error_to_graphql, value_accessor_to_json,
};
use crate::convert::FamilyKind;
use crate::error::GraphQLError;
use crate::input::convert_to_instance;

/// Resolver for row creation mutations.
///
/// Handles mutations like:
/// ```graphql
/// mutation {
///   createPost(input: {title: "Hello", createAndAttachToAuthor: {fullName: "Ann"}}) {
///     id
///     title
///   }
/// }
/// ```
pub struct CreateResolver;

impl CreateResolver {
    /// Creates a resolver for row creation.
    ///
    /// # Arguments
    /// * `index` - The generated schema the input type is looked up in
    /// * `model` - The model name (e.g., "Post")
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
                debug!(request_id = %request_id, model = %model, "Processing create mutation");

                let input = input_object(&ctx)?;

                let ty = index
                    .type_of(FamilyKind::CreateInput, &model)
                    .map_err(GraphQLError::into_graphql_error)?;
                let instance = convert_to_instance(&index, ty, &input)
                    .map_err(GraphQLError::into_graphql_error)?;

                trace!(model = %model, children = instance.children.len(), "Inserting instance");

                let row = gql_ctx.store.insert(instance).await.map_err(|e| {
                    warn!(request_id = %request_id, error = %e, model = %model, "Create failed");
                    storage_error_to_graphql(e)
                })?;

                if let Some(orm_model) = index.catalog.get(&model) {
                    debug!(
                        request_id = %request_id,
                        model = %model,
                        id = %row_key(orm_model, &row).id(),
                        "Row created successfully"
                    );
                }
                Ok(Some(FieldValue::owned_any(row)))
            })
        }
    }
}

/// Extracts the required `input` argument as a JSON object.
pub(crate) fn input_object(
    ctx: &ResolverContext<'_>,
) -> Result<Map<String, Value>, async_graphql::Error> {
    let input = ctx
        .args
        .get("input")
        .ok_or_else(|| async_graphql::Error::new("Missing required argument 'input'"))?;

    match value_accessor_to_json(&input) {
        Value::Object(map) => Ok(map),
        _ => Err(async_graphql::Error::new("Invalid input: expected object")),
    }
}
