use std::sync::Arc;

use anyhow::Result;
use ormgraph_graphql::{FamilyKind, GraphQLConfig, OrmSchemaBuilder, SchemaIndex};
use ormgraph_model::Catalog;
use serde_json::{Value, json};

use crate::cli::{CheckArgs, OutputFormat};
use crate::output::{print_success, print_table, print_value, print_warning};

/// One generated type as reported by `check`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeReport {
    pub model: String,
    pub family: FamilyKind,
    pub name: String,
    pub fields: usize,
    /// Types without materializable fields are left out of the schema.
    pub included: bool,
}

pub fn check(
    catalog: Arc<Catalog>,
    config: GraphQLConfig,
    args: &CheckArgs,
    format: OutputFormat,
) -> Result<()> {
    if let Some(model) = &args.model
        && catalog.get(model).is_none()
    {
        anyhow::bail!("Unknown model: {model}");
    }

    let index = OrmSchemaBuilder::new(Arc::clone(&catalog), config.clone()).inspect()?;
    let reports = type_reports(&index, args.model.as_deref());

    match format {
        OutputFormat::Json => {
            let value = Value::Array(reports.iter().map(report_json).collect());
            print_value(&value, format);
        }
        OutputFormat::Table => {
            let rows: Vec<[String; 5]> = reports
                .iter()
                .map(|r| {
                    [
                        r.model.clone(),
                        r.family.to_string(),
                        r.name.clone(),
                        r.fields.to_string(),
                        if r.included { "yes" } else { "no" }.to_string(),
                    ]
                })
                .collect();
            print_table(["Model", "Family", "Type", "Fields", "Included"], &rows);
        }
    }

    for report in reports.iter().filter(|r| !r.included) {
        print_warning(&format!(
            "{} has no usable fields and is left out of the schema",
            report.name
        ));
    }

    // Name clashes only surface when the schema is materialized.
    let schema = OrmSchemaBuilder::new(catalog, config).build()?;
    let types = schema.sdl().lines().filter(|line| is_type_definition(line)).count();
    print_success(&format!("Schema is valid ({types} types)"));
    Ok(())
}

pub fn type_reports(index: &SchemaIndex, only: Option<&str>) -> Vec<TypeReport> {
    let available = index.registry.available();
    let mut reports = Vec::new();

    for model in index.catalog.names() {
        if only.is_some_and(|name| name != model) {
            continue;
        }
        for family in FamilyKind::ALL {
            let Some(ty) = index.registry.get(family, model) else {
                continue;
            };
            reports.push(TypeReport {
                model: model.to_string(),
                family,
                name: ty.name.clone(),
                fields: ty.fields.len(),
                included: available.contains(&(family, model.to_string())),
            });
        }
    }
    reports
}

fn report_json(report: &TypeReport) -> Value {
    json!({
        "model": report.model,
        "family": report.family.as_str(),
        "type": report.name,
        "fields": report.fields,
        "included": report.included,
    })
}

fn is_type_definition(line: &str) -> bool {
    ["type ", "input ", "enum ", "scalar ", "interface ", "union "]
        .iter()
        .any(|prefix| line.starts_with(prefix))
}
