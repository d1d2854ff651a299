//! Conversion of connection arguments into store queries.
//!
//! `filter` arguments use the `FilterInput` family: comparator objects turn
//! into column comparisons, plain values into equality and relationship
//! fields into nested filters on the related rows. `filterBy` arguments use
//! the `FilterByInput` family and become plain equality constraints.

use inflector::Inflector;
use ormgraph_model::Model;
use ormgraph_storage::{Comparator, Filter, OrderBy, Query, Row};
use serde_json::{Map, Value};

use crate::convert::FamilyKind;
use crate::error::GraphQLError;
use crate::input::{field, storage_value, storage_values};
use crate::resolvers::SchemaIndex;
use crate::schema::{Cardinality, FieldShape, SchemaType, ValueKind};
use crate::types::comparator_op;

/// Arguments of an instrumented connection field, as JSON.
#[derive(Debug, Clone, Default)]
pub struct QueryArgs {
    pub filter: Option<Map<String, Value>>,
    pub filter_by: Option<Map<String, Value>>,
    pub order_by: Vec<String>,
}

/// Converts connection arguments on `model` into a store query without
/// offset or limit.
///
/// # Errors
///
/// Returns `GraphQLError::Validation` for unknown fields, operators and
/// sort keys.
pub fn convert_to_query(
    index: &SchemaIndex,
    model: &str,
    args: &QueryArgs,
) -> crate::Result<Query> {
    let mut query = Query::new();

    if let Some(filter) = &args.filter {
        let ty = index.type_of(FamilyKind::FilterInput, model)?;
        let filter = convert_to_filter(index, ty, filter)?;
        if filter != Filter::And(Vec::new()) {
            query = query.with_filter(filter);
        }
    }

    if let Some(filter_by) = &args.filter_by {
        let ty = index.type_of(FamilyKind::FilterByInput, model)?;
        query.filter_by = convert_filter_by(index, ty, filter_by)?;
    }

    if !args.order_by.is_empty() {
        let ty = index.output_type(model)?;
        let model = index.model_of(ty)?;
        for entry in &args.order_by {
            query = query.with_order(parse_order_by(model, ty, entry)?);
        }
    }

    Ok(query)
}

/// Converts a `FilterInput` object into a row filter.
///
/// # Errors
///
/// Returns `GraphQLError::Validation` for unknown fields or operators.
pub fn convert_to_filter(
    index: &SchemaIndex,
    ty: &SchemaType,
    input: &Map<String, Value>,
) -> crate::Result<Filter> {
    let model = index.model_of(ty)?;
    let mut filters = Vec::new();

    for (name, value) in input {
        let spec = field(ty, name)?;
        match &spec.shape {
            FieldShape::Scalar { value: ValueKind::Comparator, .. } => {
                let Value::Object(ops) = value else {
                    if value.is_null() {
                        continue;
                    }
                    return Err(GraphQLError::Validation(format!(
                        "{name} expects a comparator object"
                    )));
                };
                for (op_name, operand) in ops {
                    let op = comparator_op(op_name).ok_or_else(|| {
                        GraphQLError::Validation(format!("Unknown comparator {op_name} on {name}"))
                    })?;
                    if operand.is_null() {
                        continue;
                    }
                    filters.push(Filter::compare(spec.property.clone(), op, operand.clone()));
                }
            }
            FieldShape::Scalar { value: kind @ ValueKind::Composite(_), .. } => {
                for (column, part) in storage_values(index, model, spec, kind, value.clone())? {
                    filters.push(equality(column, part));
                }
            }
            FieldShape::Scalar { value: kind, .. } => {
                let value = storage_value(index, model, spec, kind, value.clone())?;
                filters.push(equality(spec.property.clone(), value));
            }
            FieldShape::Relationship { target, cardinality } => {
                if value.is_null() {
                    continue;
                }
                let target_ty = index
                    .registry
                    .get(ty.family, target)
                    .ok_or_else(|| GraphQLError::UnknownModel(target.clone()))?;

                let nested = match (cardinality, value) {
                    (Cardinality::Many, Value::Array(items)) => items
                        .iter()
                        .map(|item| nested_filter(index, target_ty, name, item))
                        .collect::<crate::Result<Vec<_>>>()?,
                    (_, item) => vec![nested_filter(index, target_ty, name, item)?],
                };
                filters.push(Filter::related(spec.property.clone(), Filter::all(nested)));
            }
        }
    }

    Ok(Filter::all(filters))
}

fn nested_filter(
    index: &SchemaIndex,
    ty: &SchemaType,
    name: &str,
    value: &Value,
) -> crate::Result<Filter> {
    match value {
        Value::Object(object) => convert_to_filter(index, ty, object),
        other => Err(GraphQLError::Validation(format!(
            "{name} expects an input object, got {other}"
        ))),
    }
}

/// A null operand matches NULL columns.
fn equality(column: String, value: Value) -> Filter {
    if value.is_null() {
        Filter::compare(column, Comparator::IsNull, Value::Bool(true))
    } else {
        Filter::compare(column, Comparator::Eq, value)
    }
}

/// Converts a `FilterByInput` object into column equality constraints.
///
/// # Errors
///
/// Returns `GraphQLError::Validation` for unknown fields.
pub fn convert_filter_by(
    index: &SchemaIndex,
    ty: &SchemaType,
    input: &Map<String, Value>,
) -> crate::Result<Row> {
    let model = index.model_of(ty)?;
    let mut row = Row::new();
    for (name, value) in input {
        let spec = field(ty, name)?;
        let FieldShape::Scalar { value: kind, .. } = &spec.shape else {
            return Err(GraphQLError::Validation(format!(
                "Cannot filter {} by relationship {name}",
                ty.name
            )));
        };
        row.extend(storage_values(index, model, spec, kind, value.clone())?);
    }
    Ok(row)
}

/// Parses one `orderBy` entry such as `"fullName desc"`.
///
/// The field may be given as a column name, its camelCase spelling or the
/// name of an output field of `ty`. The direction defaults to ascending.
///
/// # Errors
///
/// Returns `GraphQLError::Validation` for unknown columns or directions.
pub fn parse_order_by(model: &Model, ty: &SchemaType, entry: &str) -> crate::Result<OrderBy> {
    let mut parts = entry.split_whitespace();
    let name = parts
        .next()
        .ok_or_else(|| GraphQLError::Validation("Empty orderBy entry".into()))?;

    let descending = match parts.next().map(str::to_ascii_lowercase).as_deref() {
        None | Some("asc") => false,
        Some("desc") => true,
        Some(other) => {
            return Err(GraphQLError::Validation(format!(
                "Invalid sort direction {other} in orderBy entry {entry:?}"
            )));
        }
    };
    if parts.next().is_some() {
        return Err(GraphQLError::Validation(format!("Invalid orderBy entry {entry:?}")));
    }

    let column = [name.to_string(), name.to_snake_case()]
        .into_iter()
        .find(|candidate| model.get_column(candidate).is_some())
        .or_else(|| {
            ty.field(name)
                .filter(|spec| model.get_column(&spec.property).is_some())
                .map(|spec| spec.property.clone())
        })
        .ok_or_else(|| {
            GraphQLError::Validation(format!("Cannot order {} by unknown field {name}", ty.name))
        })?;

    Ok(if descending {
        OrderBy::desc(column)
    } else {
        OrderBy::asc(column)
    })
}
