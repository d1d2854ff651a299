//! Conversion of mutation input objects into store instances.

use inflector::Inflector;
use ormgraph_model::Model;
use ormgraph_storage::{Instance, Row};
use serde_json::{Map, Value};

use crate::error::GraphQLError;
use crate::resolvers::SchemaIndex;
use crate::schema::{Cardinality, FieldShape, FieldSpec, SchemaType, ValueKind};
use crate::types::{coerce_int, decode_global_id};

/// Converts an input object of `ty` into an instance of its model.
///
/// Relationship fields become attached instances built from the target's
/// input type in the same family. Composite values are split into their
/// columns.
///
/// # Errors
///
/// Returns `GraphQLError::Validation` for unknown fields and for values the
/// columns cannot hold.
pub fn convert_to_instance(
    index: &SchemaIndex,
    ty: &SchemaType,
    input: &Map<String, Value>,
) -> crate::Result<Instance> {
    let model = index
        .catalog
        .get(&ty.model)
        .ok_or_else(|| GraphQLError::UnknownModel(ty.model.clone()))?;
    let mut instance = Instance::new(model.name.clone());

    for (name, value) in input {
        let spec = field(ty, name)?;
        match &spec.shape {
            FieldShape::Scalar { value: kind, .. } => {
                instance.values.extend(storage_values(index, model, spec, kind, value.clone())?);
            }
            FieldShape::Relationship { target, cardinality } => {
                if value.is_null() {
                    continue;
                }
                let target_ty = index
                    .registry
                    .get(ty.family, target)
                    .ok_or_else(|| GraphQLError::UnknownModel(target.clone()))?;

                let items = match (cardinality, value) {
                    (Cardinality::Many, Value::Array(items)) => items.iter().collect(),
                    (Cardinality::Single, item) => vec![item],
                    (Cardinality::Many, item) => vec![item],
                };
                for item in items {
                    let Value::Object(object) = item else {
                        return Err(GraphQLError::Validation(format!(
                            "{}.{name} expects an input object",
                            ty.name
                        )));
                    };
                    let child = convert_to_instance(index, target_ty, object)?;
                    instance = instance.attach(spec.property.clone(), child);
                }
            }
        }
    }

    Ok(instance)
}

/// Looks up an input field by its GraphQL name.
pub(crate) fn field<'a>(ty: &'a SchemaType, name: &str) -> crate::Result<&'a FieldSpec> {
    ty.field(name)
        .ok_or_else(|| GraphQLError::Validation(format!("Unknown field {name} on {}", ty.name)))
}

/// Converts the GraphQL value of a scalar field into column values.
///
/// Composite fields yield one entry per column; every other field yields a
/// single entry keyed by its property.
pub(crate) fn storage_values(
    index: &SchemaIndex,
    model: &Model,
    spec: &FieldSpec,
    kind: &ValueKind,
    value: Value,
) -> crate::Result<Row> {
    let mut row = Row::new();
    match kind {
        ValueKind::Composite(columns) => match value {
            Value::Null => {
                for column in columns {
                    row.insert(column.clone(), Value::Null);
                }
            }
            Value::Object(object) => {
                for column in columns {
                    let part = object
                        .get(column)
                        .or_else(|| object.get(&column.to_camel_case()))
                        .cloned()
                        .unwrap_or(Value::Null);
                    row.insert(column.clone(), part);
                }
            }
            other => {
                return Err(GraphQLError::Validation(format!(
                    "{} expects an object, got {other}",
                    spec.name
                )));
            }
        },
        _ => {
            row.insert(spec.property.clone(), storage_value(index, model, spec, kind, value)?);
        }
    }
    Ok(row)
}

/// Converts one GraphQL value into the value stored in a column.
pub(crate) fn storage_value(
    index: &SchemaIndex,
    model: &Model,
    spec: &FieldSpec,
    kind: &ValueKind,
    value: Value,
) -> crate::Result<Value> {
    if value.is_null() {
        return Ok(value);
    }

    match kind {
        ValueKind::Id => Ok(match value {
            Value::String(id) => Value::String(raw_id(index, model, &spec.property, id)),
            other => other,
        }),
        ValueKind::Json => match value {
            Value::String(text) => serde_json::from_str(&text).map_err(|e| {
                GraphQLError::Validation(format!("{} must be a JSON document: {e}", spec.name))
            }),
            other => Ok(other),
        },
        ValueKind::BoundedInt(width, unsigned) => async_graphql::Value::from_json(value)
            .map_err(|e| e.to_string())
            .and_then(|value| coerce_int(&value, *width, *unsigned))
            .map(Value::from)
            .map_err(|e| GraphQLError::Validation(format!("{}: {e}", spec.name))),
        ValueKind::Composite(_) => Err(GraphQLError::Internal(format!(
            "Composite field {} has no single column",
            spec.name
        ))),
        _ => Ok(value),
    }
}

/// Strips a global id down to the raw key when it names the column's own
/// model or the model its foreign key points at.
fn raw_id(index: &SchemaIndex, model: &Model, column: &str, id: String) -> String {
    let Some((type_name, raw)) = decode_global_id(&id) else {
        return id;
    };
    let Some(ty) = index.registry.by_name(&type_name) else {
        return id;
    };

    let references = model
        .get_column(column)
        .map(|c| c.foreign_keys.iter().any(|fk| fk.model == ty.model))
        .unwrap_or(false);
    if ty.model == model.name || references {
        raw
    } else {
        id
    }
}
