use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use ormgraph_graphql::GraphQLConfig;
use ormgraph_model::Catalog;
use serde::Deserialize;
use tracing::debug;

/// Read when `--config` is not given. A missing file means defaults.
pub const DEFAULT_CONFIG_FILE: &str = "ormgraph.toml";

#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub graphql: GraphQLConfig,
}

pub fn load_config(path: Option<&Path>) -> Result<GraphQLConfig> {
    let (path, explicit) = match path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };

    if !path.exists() {
        if explicit {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        debug!(path = %path.display(), "No config file, using defaults");
        return Ok(GraphQLConfig::default());
    }

    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content).with_context(|| format!("Invalid config file: {}", path.display()))
}

pub fn parse_config(content: &str) -> Result<GraphQLConfig> {
    let file: ConfigFile = toml::from_str(content)?;
    file.graphql.validate().map_err(anyhow::Error::msg)?;
    Ok(file.graphql)
}

/// Loads a catalog, choosing the format by file extension (TOML unless `.json`).
pub fn load_catalog(path: &Path) -> Result<Arc<Catalog>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read model catalog: {}", path.display()))?;

    let catalog = match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Catalog::from_json_str(&content),
        _ => Catalog::from_toml_str(&content),
    }
    .with_context(|| format!("Invalid model catalog: {}", path.display()))?;

    debug!(path = %path.display(), models = catalog.len(), "Loaded model catalog");
    Ok(Arc::new(catalog))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_config_section() {
        let config = parse_config(
            r#"
            [graphql]
            max_depth = 7
            relay_node = false
            exclude_models = ["AuditLog"]
            "#,
        )
        .unwrap();

        assert_eq!(config.max_depth, 7);
        assert!(!config.relay_node);
        assert!(config.is_excluded("AuditLog"));
        assert_eq!(config.max_complexity, GraphQLConfig::default().max_complexity);
    }

    #[test]
    fn test_parse_config_without_section() {
        let config = parse_config("").unwrap();
        assert_eq!(config.max_depth, GraphQLConfig::default().max_depth);
    }

    #[test]
    fn test_parse_config_rejects_invalid_values() {
        assert!(parse_config("[graphql]\nmax_depth = 0\n").is_err());
    }

    #[test]
    fn test_missing_explicit_config() {
        let err = load_config(Some(Path::new("/nonexistent/ormgraph.toml"))).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_blog_demo_builds() {
        let demo = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/blog");
        let catalog = load_catalog(&demo.join("models.toml")).unwrap();
        let config = load_config(Some(demo.join("ormgraph.toml").as_path())).unwrap();

        assert_eq!(catalog.len(), 4);
        assert!(config.is_excluded("PostTag"));

        let sdl = ormgraph_graphql::OrmSchemaBuilder::new(catalog, config)
            .build()
            .unwrap()
            .sdl();
        assert!(sdl.contains("type PostConnection"));
        assert!(!sdl.contains("PostTagCreateInput"));
    }

    #[test]
    fn test_load_catalog_by_extension() {
        let mut toml_file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            toml_file,
            r#"
            [[models]]
            name = "Tag"
            table = "tags"

            [[models.columns]]
            name = "id"
            type = "integer"
            primary_key = true
            "#
        )
        .unwrap();
        let catalog = load_catalog(toml_file.path()).unwrap();
        assert!(catalog.get("Tag").is_some());

        let mut json_file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(json_file, "{{\"models\": []}}").unwrap();
        assert_eq!(load_catalog(json_file.path()).unwrap().len(), 0);
    }
}
