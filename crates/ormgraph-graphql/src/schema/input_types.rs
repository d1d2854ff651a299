//! Input types for GraphQL mutations and filters.
//!
//! Every input family is materialized as an input object. Relationship
//! fields refer to the target's input type of the same family and are
//! always optional.

use std::collections::HashSet;

use async_graphql::dynamic::{InputObject, InputValue, TypeRef};
use tracing::trace;

use crate::convert::FamilyKind;
use crate::schema::registry::{Cardinality, FieldShape, Registry, SchemaType};

/// Builds the input object of `ty`.
///
/// Example generated type:
/// ```graphql
/// input PostCreateInput {
///   title: String!
///   attachToAuthor: ID
///   createAndAttachToAuthor: UserCreateInput
/// }
/// ```
pub(crate) fn input_object(
    registry: &Registry,
    ty: &SchemaType,
    available: &HashSet<(FamilyKind, String)>,
) -> InputObject {
    let mut object = InputObject::new(&ty.name);
    if let Some(description) = &ty.description {
        object = object.description(description);
    }

    for spec in &ty.fields {
        let type_ref = match &spec.shape {
            FieldShape::Scalar { ty: field_type, .. } => field_type.to_type_ref(spec.nullable),
            FieldShape::Relationship { target, cardinality } => {
                let Some(target_ty) = registry
                    .get(ty.family, target)
                    .filter(|t| available.contains(&(t.family, t.model.clone())))
                else {
                    trace!(
                        type_name = %ty.name,
                        field = %spec.name,
                        target = %target,
                        "Skipping input field without a target type"
                    );
                    continue;
                };
                match cardinality {
                    Cardinality::Single => TypeRef::named(&target_ty.name),
                    Cardinality::Many => TypeRef::named_list(&target_ty.name),
                }
            }
        };

        let mut field = InputValue::new(&spec.name, type_ref);
        if let Some(description) = &spec.description {
            field = field.description(description);
        }
        object = object.field(field);
    }

    object
}
