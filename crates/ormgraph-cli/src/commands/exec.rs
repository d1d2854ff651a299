use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_graphql::{Request, Variables};
use ormgraph_graphql::{GraphQLConfig, GraphQLContext, OrmSchemaBuilder};
use ormgraph_model::Catalog;
use ormgraph_storage::{DynStore, Instance, ModelStore};
use serde_json::Value;
use tracing::{debug, info};

use crate::cli::{ExecArgs, OutputFormat};
use crate::output::print_value;

pub async fn exec(
    catalog: Arc<Catalog>,
    config: GraphQLConfig,
    args: &ExecArgs,
    format: OutputFormat,
) -> Result<()> {
    let document = read_document(args)?;
    let variables = args
        .variables
        .as_deref()
        .map(|raw| serde_json::from_str::<Value>(raw).context("Invalid --variables JSON"))
        .transpose()?;

    let schema = OrmSchemaBuilder::new(Arc::clone(&catalog), config).build()?;
    let store = ormgraph_db_memory::create_store(catalog);

    if let Some(path) = &args.seed {
        let rows = seed_store(&store, path).await?;
        info!(rows, path = %path.display(), "Seeded in-memory store");
    }

    let context = GraphQLContext::builder()
        .with_store(store)
        .with_request_id("cli")
        .build()?;

    let mut request = Request::new(document).data(context);
    if let Some(variables) = variables {
        request = request.variables(Variables::from_json(variables));
    }

    let response = schema.execute(request).await;
    let failed = response.is_err();
    print_value(&serde_json::to_value(&response)?, format);

    if failed {
        anyhow::bail!("Request returned {} error(s)", response.errors.len());
    }
    Ok(())
}

/// The document comes from the positional argument, then `--file`, then stdin.
fn read_document(args: &ExecArgs) -> Result<String> {
    if let Some(query) = &args.query {
        return Ok(query.clone());
    }
    if let Some(path) = &args.file {
        return fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()));
    }

    let mut buf = String::new();
    io::stdin()
        .read_to_string(&mut buf)
        .context("Failed to read from stdin")?;
    Ok(buf)
}

/// Inserts the rows of a seed file shaped `{"Model": [{column: value}]}`.
///
/// Returns the number of inserted rows.
pub async fn seed_store(store: &DynStore, path: &Path) -> Result<usize> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read seed file: {}", path.display()))?;
    let seed: serde_json::Map<String, Value> =
        serde_json::from_str(&content).context("Invalid seed JSON")?;

    let mut inserted = 0;
    for (model, rows) in seed {
        let Value::Array(rows) = rows else {
            anyhow::bail!("Seed entry {model} must be an array of rows");
        };
        for row in rows {
            let Value::Object(values) = row else {
                anyhow::bail!("Seed rows of {model} must be objects");
            };
            store
                .insert(Instance::new(model.as_str()).with_values(values))
                .await
                .with_context(|| format!("Failed to seed {model}"))?;
            inserted += 1;
        }
        debug!(model = %model, "Seeded model");
    }
    Ok(inserted)
}
