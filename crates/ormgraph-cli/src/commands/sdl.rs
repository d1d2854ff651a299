use std::fs;
use std::sync::Arc;

use anyhow::{Context, Result};
use ormgraph_graphql::{GraphQLConfig, OrmSchemaBuilder};
use ormgraph_model::Catalog;

use crate::cli::SdlArgs;
use crate::output::print_success;

pub fn sdl(catalog: Arc<Catalog>, config: GraphQLConfig, args: &SdlArgs) -> Result<()> {
    let schema = OrmSchemaBuilder::new(catalog, config).build()?;
    let sdl = schema.sdl();

    match &args.output {
        Some(path) => {
            fs::write(path, &sdl).with_context(|| format!("Failed to write {}", path.display()))?;
            print_success(&format!("Wrote schema to {}", path.display()));
        }
        None => print!("{sdl}"),
    }
    Ok(())
}
