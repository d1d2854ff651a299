//! Object type materialization.
//!
//! Turns the generated [`SchemaType`]s of the output families into dynamic
//! object types, plus the `{Type}Connection` and `{Type}Edge` types of those
//! that have a connection.

use std::collections::HashSet;
use std::sync::Arc;

use async_graphql::dynamic::{Field, InputValue, Object, TypeRef};
use tracing::trace;

use crate::convert::FamilyKind;
use crate::resolvers::{ConnectionResolver, FieldResolver, RelationshipResolver, SchemaIndex};
use crate::schema::registry::{Cardinality, FieldShape, SchemaType};
use crate::schema::strategy::ConnectionKind;
use crate::types::PAGE_INFO;

/// Builds the object type of `ty` and, when it has one, its connection and
/// edge types.
pub(crate) fn object_types(
    index: &Arc<SchemaIndex>,
    ty: &SchemaType,
    available: &HashSet<(FamilyKind, String)>,
) -> Vec<Object> {
    let mut object = Object::new(&ty.name);
    if let Some(description) = &ty.description {
        object = object.description(description);
    }
    for interface in &ty.interfaces {
        object = object.implement(interface);
    }

    if ty.is_node() {
        object = object.field(
            Field::new(
                "id",
                TypeRef::named_nn(TypeRef::ID),
                FieldResolver::global_id(Arc::clone(index), ty.name.clone(), ty.model.clone()),
            )
            .description("The ID of the object"),
        );
    }
    if ty.has_database_id() {
        object = object.field(
            Field::new(
                "dbId",
                TypeRef::named_nn(TypeRef::ID),
                FieldResolver::database_id(Arc::clone(index), ty.model.clone()),
            )
            .description("The primary key of the row"),
        );
    }

    for spec in &ty.fields {
        // The interface field above replaces a column named `db_id`.
        if ty.has_database_id() && spec.name == "dbId" {
            continue;
        }
        let field = match &spec.shape {
            FieldShape::Scalar { ty: field_type, .. } => Field::new(
                &spec.name,
                field_type.to_type_ref(spec.nullable),
                FieldResolver::value(spec.clone()),
            ),
            FieldShape::Relationship { target, cardinality } => {
                let Some(target_ty) = index
                    .registry
                    .get(ty.family, target)
                    .filter(|t| available.contains(&(t.family, t.model.clone())))
                else {
                    trace!(
                        type_name = %ty.name,
                        field = %spec.name,
                        target = %target,
                        "Skipping relationship without a target type"
                    );
                    continue;
                };

                match cardinality {
                    Cardinality::Single => Field::new(
                        &spec.name,
                        TypeRef::named(&target_ty.name),
                        RelationshipResolver::single(ty.model.clone(), spec.property.clone()),
                    ),
                    Cardinality::Many if target_ty.connection.is_some() => {
                        connection_args(Field::new(
                            &spec.name,
                            TypeRef::named(target_ty.connection_name()),
                            ConnectionResolver::related(
                                Arc::clone(index),
                                ty.model.clone(),
                                spec.property.clone(),
                            ),
                        ))
                    }
                    Cardinality::Many => Field::new(
                        &spec.name,
                        TypeRef::named_list(&target_ty.name),
                        RelationshipResolver::list(ty.model.clone(), spec.property.clone()),
                    ),
                }
            }
        };

        object = object.field(match &spec.description {
            Some(description) => field.description(description),
            None => field,
        });
    }

    let mut types = vec![object];
    if let Some(kind) = ty.connection {
        types.extend(connection_types(ty, kind));
    }
    types
}

/// Builds `{Type}Connection` and `{Type}Edge`.
fn connection_types(ty: &SchemaType, kind: ConnectionKind) -> [Object; 2] {
    let edge_name = ty.edge_name();

    let mut connection = Object::new(ty.connection_name())
        .description(format!("A connection to a list of {} items", ty.name))
        .field(
            Field::new("pageInfo", TypeRef::named_nn(PAGE_INFO), ConnectionResolver::page_info)
                .description("Pagination data for this connection."),
        )
        .field(
            Field::new("edges", TypeRef::named_list_nn(&edge_name), ConnectionResolver::edges)
                .description("Contains the nodes in this connection."),
        );
    if kind == ConnectionKind::Countable {
        connection = connection.field(Field::new(
            "totalCount",
            TypeRef::named(TypeRef::INT),
            ConnectionResolver::total_count,
        ));
    }

    let edge = Object::new(edge_name)
        .description(format!("A Relay edge containing a {} and its cursor", ty.name))
        .field(
            Field::new("node", TypeRef::named(&ty.name), ConnectionResolver::edge_node)
                .description("The item at the end of the edge"),
        )
        .field(
            Field::new(
                "cursor",
                TypeRef::named_nn(TypeRef::STRING),
                ConnectionResolver::edge_cursor,
            )
            .description("A cursor for use in pagination"),
        );

    [connection, edge]
}

/// Adds the Relay pagination arguments.
pub(crate) fn connection_args(field: Field) -> Field {
    field
        .argument(InputValue::new("before", TypeRef::named(TypeRef::STRING)))
        .argument(InputValue::new("after", TypeRef::named(TypeRef::STRING)))
        .argument(InputValue::new("first", TypeRef::named(TypeRef::INT)))
        .argument(InputValue::new("last", TypeRef::named(TypeRef::INT)))
}
