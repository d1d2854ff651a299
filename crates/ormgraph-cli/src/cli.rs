use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "ormgraph")]
#[command(about = "Generate and query GraphQL schemas from ORM model catalogs")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Model catalog file (.toml or .json)
    #[arg(short, long, global = true, env = "ORMGRAPH_MODELS", default_value = "models.toml")]
    pub models: PathBuf,

    /// Configuration file with a [graphql] section
    #[arg(short, long, global = true, env = "ORMGRAPH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, env = "ORMGRAPH_LOG", default_value = "warn")]
    pub log_level: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Table,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the schema in SDL
    Sdl(SdlArgs),
    /// Generate every type and report what the schema will contain
    Check(CheckArgs),
    /// Execute a GraphQL document against an in-memory store
    Exec(ExecArgs),
}

#[derive(clap::Args)]
pub struct SdlArgs {
    /// Write the SDL to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct CheckArgs {
    /// Only report the types of this model
    #[arg(long)]
    pub model: Option<String>,
}

#[derive(clap::Args)]
pub struct ExecArgs {
    /// GraphQL document (reads --file or stdin if omitted)
    pub query: Option<String>,
    /// Path to a file holding the GraphQL document
    #[arg(long)]
    pub file: Option<PathBuf>,
    /// Variables as a JSON object
    #[arg(long)]
    pub variables: Option<String>,
    /// JSON file mapping model names to rows inserted before execution
    #[arg(long)]
    pub seed: Option<PathBuf>,
}
