use colored::Colorize;
use serde_json::Value;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::cli::OutputFormat;

pub fn print_value(value: &Value, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{}", pretty(value)),
        OutputFormat::Table => print_response_table(value),
    }
}

pub fn print_table<const N: usize>(header: [&str; N], rows: &[[String; N]]) {
    let mut builder = Builder::default();
    builder.push_record(header);
    for row in rows {
        builder.push_record(row.iter().map(String::as_str));
    }
    println!("{}", builder.build().with(Style::rounded()));
}

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_warning(msg: &str) {
    eprintln!("{} {}", "!".yellow(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Connection fields (`{ edges { node { ... } } }`) are shown as one row per
/// node; anything else falls back to JSON.
fn print_response_table(value: &Value) {
    let data = value.get("data").and_then(Value::as_object);
    let mut printed = false;

    for (field, result) in data.into_iter().flatten() {
        let Some(nodes) = connection_nodes(result) else {
            continue;
        };
        println!("{}", field.cyan());
        if nodes.is_empty() {
            println!("No rows found.");
        } else {
            print_nodes(&nodes);
        }
        if let Some(total) = result.get("totalCount").and_then(Value::as_u64) {
            println!("Total: {total}");
        }
        printed = true;
    }

    if !printed {
        println!("{}", pretty(value));
    }
}

fn connection_nodes(value: &Value) -> Option<Vec<&serde_json::Map<String, Value>>> {
    let edges = value.get("edges")?.as_array()?;
    edges
        .iter()
        .map(|edge| edge.get("node").and_then(Value::as_object))
        .collect()
}

fn print_nodes(nodes: &[&serde_json::Map<String, Value>]) {
    let columns: Vec<&String> = nodes[0].keys().collect();
    let mut builder = Builder::default();
    builder.push_record(columns.iter().map(|c| c.as_str()));
    for node in nodes {
        builder.push_record(columns.iter().map(|column| cell(node.get(column.as_str()))));
    }
    println!("{}", builder.build().with(Style::rounded()));
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "-".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
