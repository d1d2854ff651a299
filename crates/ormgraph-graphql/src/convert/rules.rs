//! Built-in conversion rules.

use std::sync::Arc;

use ormgraph_model::SqlType;

use super::{
    ConversionTable, ConvertInput, DynConversionRule, EnumDef, EnumRegistry, FamilyKind, FieldType,
};
use crate::error::GraphQLError;
use crate::types::{
    BOOLEAN_FILTER_INPUT, DATE_TIME, DATE_TIME_FILTER_INPUT, FLOAT_FILTER_INPUT, JSON_STRING,
    SIGNED_INT32_FILTER_INPUT, STRING_FILTER_INPUT, bounded_int_name,
};

/// Families that get the plain value rules. Every other family inherits
/// from one of them.
const VALUE_FAMILIES: [FamilyKind; 2] = [FamilyKind::Object, FamilyKind::Input];

pub(super) fn register_builtins(table: &mut ConversionTable) {
    for family in VALUE_FAMILIES {
        table.register_all(family, SqlType::STRING_LIKE, rule(string_like));
        table.register_all(family, SqlType::INT_LIKE, rule(int_like));
        table.register_all(family, SqlType::BOOL_LIKE, rule(named("Boolean")));
        table.register_all(family, SqlType::FLOAT_LIKE, rule(named("Float")));
        table.register_all(family, SqlType::JSON_LIKE, rule(named(JSON_STRING)));
        table.register(family, "date_time", named(DATE_TIME));
        table.register(family, "enum", enum_type);
        table.register(family, "choice", choice_type);
        table.register(family, "scalar_list", scalar_list);
        table.register(family, "array", array);
    }

    let filter = FamilyKind::FilterInput;
    table.register_all(filter, SqlType::STRING_LIKE, rule(named(STRING_FILTER_INPUT)));
    table.register_all(filter, SqlType::INT_LIKE, rule(named(SIGNED_INT32_FILTER_INPUT)));
    table.register_all(filter, SqlType::BOOL_LIKE, rule(named(BOOLEAN_FILTER_INPUT)));
    table.register_all(filter, SqlType::FLOAT_LIKE, rule(named(FLOAT_FILTER_INPUT)));
    table.register(filter, "date_time", named(DATE_TIME_FILTER_INPUT));
}

fn rule(
    f: impl Fn(&ConvertInput<'_>, &mut EnumRegistry) -> crate::Result<FieldType>
        + Send
        + Sync
        + 'static,
) -> DynConversionRule {
    Arc::new(f)
}

/// A rule that always yields the same named type.
fn named(
    name: &'static str,
) -> impl Fn(&ConvertInput<'_>, &mut EnumRegistry) -> crate::Result<FieldType>
+ Send
+ Sync
+ 'static {
    move |_: &ConvertInput<'_>, _: &mut EnumRegistry| Ok(FieldType::named(name))
}

fn string_like(input: &ConvertInput<'_>, _: &mut EnumRegistry) -> crate::Result<FieldType> {
    if input.column.is_key() {
        Ok(FieldType::named("ID"))
    } else {
        Ok(FieldType::named("String"))
    }
}

fn int_like(input: &ConvertInput<'_>, _: &mut EnumRegistry) -> crate::Result<FieldType> {
    if input.column.is_key() {
        return Ok(FieldType::named("ID"));
    }
    let width = input.sql_type.int_width().ok_or_else(|| {
        GraphQLError::Internal(format!("{} is not a bounded integer type", input.sql_type))
    })?;
    Ok(FieldType::named(bounded_int_name(width, input.column.unsigned)))
}

fn enum_type(input: &ConvertInput<'_>, enums: &mut EnumRegistry) -> crate::Result<FieldType> {
    let SqlType::Enum { name, variants } = input.sql_type.storage_type() else {
        return Err(GraphQLError::Internal(format!("{} is not an enum type", input.sql_type)));
    };

    let prefix = name.as_deref().unwrap_or(&input.column.name);
    let def = EnumDef::new(format!("{prefix}_enum")).values(variants.iter().cloned());
    Ok(FieldType::named(enums.register(def)))
}

fn choice_type(input: &ConvertInput<'_>, enums: &mut EnumRegistry) -> crate::Result<FieldType> {
    let SqlType::Choice { choices } = input.sql_type.storage_type() else {
        return Err(GraphQLError::Internal(format!("{} is not a choice type", input.sql_type)));
    };

    let name = format!("{}_{}", input.model.table, input.column.name).to_uppercase();
    let def = choices
        .iter()
        .fold(EnumDef::new(name), |def, (key, label)| {
            def.described_value(key.clone(), label.clone())
        });
    Ok(FieldType::named(enums.register(def)))
}

fn scalar_list(_: &ConvertInput<'_>, _: &mut EnumRegistry) -> crate::Result<FieldType> {
    Ok(FieldType::list(FieldType::named("String")))
}

fn array(input: &ConvertInput<'_>, enums: &mut EnumRegistry) -> crate::Result<FieldType> {
    let SqlType::Array(item) = input.sql_type.storage_type() else {
        return Err(GraphQLError::Internal(format!("{} is not an array type", input.sql_type)));
    };
    Ok(FieldType::list(input.convert(item, enums)?))
}
