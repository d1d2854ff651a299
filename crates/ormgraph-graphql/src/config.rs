//! GraphQL configuration.
//!
//! Configuration can be specified in `ormgraph.toml` under the `[graphql]`
//! section.
//!
//! # Example Configuration
//!
//! ```toml
//! [graphql]
//! max_depth = 15
//! max_complexity = 500
//! introspection = true
//! default_page_size = 20
//! exclude_models = ["AuditLog"]
//! ```

use serde::{Deserialize, Serialize};

/// GraphQL schema generation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphQLConfig {
    /// Maximum query depth allowed.
    /// Default: 15
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Maximum query complexity allowed.
    /// Default: 500
    #[serde(default = "default_max_complexity")]
    pub max_complexity: usize,

    /// Enable GraphQL introspection queries.
    /// Default: true
    #[serde(default = "default_introspection")]
    pub introspection: bool,

    /// Page size of connections queried without `first` or `last`.
    /// Default: 20
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,

    /// Largest accepted `first` / `last`.
    /// Default: 100
    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,

    /// Convert field names to camelCase.
    /// Default: true
    #[serde(default = "default_true")]
    pub auto_camelcase: bool,

    /// Implement the Relay `Node` interface on generated object types and
    /// expose the root `node` field.
    /// Default: true
    #[serde(default = "default_true")]
    pub relay_node: bool,

    /// Generate object types of the filter-object family: the autoincrement
    /// `id` column is exposed as `db_id` next to the global `id`.
    /// Default: false
    #[serde(default)]
    pub filter_objects: bool,

    /// Generate the `Mutation` root.
    /// Default: true
    #[serde(default = "default_true")]
    pub mutations: bool,

    /// Models left out of the generated roots.
    #[serde(default)]
    pub exclude_models: Vec<String>,

    /// Columns with a server default and one of these names are left out
    /// of create and edit inputs.
    /// Default: `["created_at", "updated_at"]`
    #[serde(default = "default_auto_timestamp_fields")]
    pub auto_timestamp_fields: Vec<String>,
}

fn default_max_depth() -> usize {
    15
}

fn default_max_complexity() -> usize {
    500
}

fn default_introspection() -> bool {
    true
}

fn default_page_size() -> usize {
    20
}

fn default_max_page_size() -> usize {
    100
}

fn default_true() -> bool {
    true
}

fn default_auto_timestamp_fields() -> Vec<String> {
    vec!["created_at".into(), "updated_at".into()]
}

impl Default for GraphQLConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            max_complexity: default_max_complexity(),
            introspection: default_introspection(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            auto_camelcase: default_true(),
            relay_node: default_true(),
            filter_objects: false,
            mutations: default_true(),
            exclude_models: Vec::new(),
            auto_timestamp_fields: default_auto_timestamp_fields(),
        }
    }
}

impl GraphQLConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration values are invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_depth == 0 {
            return Err("graphql.max_depth must be > 0".into());
        }
        if self.max_complexity == 0 {
            return Err("graphql.max_complexity must be > 0".into());
        }
        if self.default_page_size == 0 {
            return Err("graphql.default_page_size must be > 0".into());
        }
        if self.max_page_size < self.default_page_size {
            return Err("graphql.max_page_size must be >= graphql.default_page_size".into());
        }
        if self.filter_objects && !self.relay_node {
            return Err("graphql.filter_objects requires graphql.relay_node".into());
        }
        Ok(())
    }

    /// Returns whether `model` is left out of the generated roots.
    #[must_use]
    pub fn is_excluded(&self, model: &str) -> bool {
        self.exclude_models.iter().any(|m| m == model)
    }

    /// Converts this config to a SchemaBuilderConfig.
    #[must_use]
    pub fn to_schema_builder_config(&self) -> crate::SchemaBuilderConfig {
        crate::SchemaBuilderConfig {
            max_depth: self.max_depth,
            max_complexity: self.max_complexity,
            introspection_enabled: self.introspection,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GraphQLConfig::default();
        assert_eq!(config.max_depth, 15);
        assert_eq!(config.max_complexity, 500);
        assert!(config.introspection);
        assert_eq!(config.default_page_size, 20);
        assert!(config.auto_camelcase);
        assert!(config.relay_node);
        assert!(!config.filter_objects);
        assert_eq!(config.auto_timestamp_fields, vec!["created_at", "updated_at"]);
    }

    #[test]
    fn test_valid_config() {
        assert!(GraphQLConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_max_depth() {
        let mut config = GraphQLConfig::default();
        config.max_depth = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_page_sizes() {
        let mut config = GraphQLConfig::default();
        config.max_page_size = 5;
        assert!(config.validate().is_err());

        config.max_page_size = 100;
        config.default_page_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_filter_objects_need_node() {
        let mut config = GraphQLConfig::default();
        config.filter_objects = true;
        config.relay_node = false;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize_from_toml() {
        let toml = r#"
            max_depth = 20
            introspection = false
            exclude_models = ["AuditLog"]
            auto_camelcase = false
        "#;

        let config: GraphQLConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.max_depth, 20);
        assert_eq!(config.max_complexity, 500);
        assert!(!config.introspection);
        assert!(!config.auto_camelcase);
        assert!(config.is_excluded("AuditLog"));
        assert!(!config.is_excluded("User"));
    }

    #[test]
    fn test_to_schema_builder_config() {
        let config = GraphQLConfig {
            introspection: false,
            ..Default::default()
        };
        let builder = config.to_schema_builder_config();
        assert_eq!(builder.max_depth, 15);
        assert!(!builder.introspection_enabled);
    }
}
