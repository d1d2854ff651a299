mod cli;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cli::{Cli, Commands};
use output::print_error;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    if let Err(e) = run(cli).await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let format = cli.format.unwrap_or_default();
    let graphql = config::load_config(cli.config.as_deref())?;
    let catalog = config::load_catalog(&cli.models)?;

    match &cli.command {
        Commands::Sdl(args) => commands::sdl::sdl(catalog, graphql, args)?,
        Commands::Check(args) => commands::check::check(catalog, graphql, args, format)?,
        Commands::Exec(args) => commands::exec::exec(catalog, graphql, args, format).await?,
    }

    Ok(())
}

/// Logs to stderr so command output stays machine readable.
fn init_tracing(level: &str) {
    // Prefer RUST_LOG from env, otherwise use the --log-level filter.
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|_| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
