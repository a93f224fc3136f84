//! Schema configuration.
//!
//! Configuration can be loaded from TOML; every key is optional.
//!
//! # Example Configuration
//!
//! ```toml
//! max_depth = 15
//! max_complexity = 500
//! introspection = true
//! input_type_prefix = "input"
//! context_type_name = "ResContext"
//! log_level = "info"
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ModelQlError;
use crate::schema::SchemaBuilderConfig;

/// Schema builder configuration as loaded from a file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelQlConfig {
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

    /// Prefix of input type names.
    /// Default: "input"
    #[serde(default = "default_input_type_prefix")]
    pub input_type_prefix: String,

    /// Declared type name of the request context parameter.
    /// Default: "ResContext"
    #[serde(default = "default_context_type_name")]
    pub context_type_name: String,

    /// Log level used when `RUST_LOG` is not set.
    /// Default: "info"
    #[serde(default = "default_log_level")]
    pub log_level: String,
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

fn default_input_type_prefix() -> String {
    "input".to_string()
}

fn default_context_type_name() -> String {
    "ResContext".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ModelQlConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            max_complexity: default_max_complexity(),
            introspection: default_introspection(),
            input_type_prefix: default_input_type_prefix(),
            context_type_name: default_context_type_name(),
            log_level: default_log_level(),
        }
    }
}

impl ModelQlConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document does not parse or fails validation.
    pub fn from_toml_str(s: &str) -> Result<Self, ModelQlError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ModelQlError::InvalidConfig` if a value is out of range.
    pub fn validate(&self) -> Result<(), ModelQlError> {
        if self.max_depth == 0 {
            return Err(ModelQlError::InvalidConfig("max_depth must be > 0".into()));
        }
        if self.max_complexity == 0 {
            return Err(ModelQlError::InvalidConfig(
                "max_complexity must be > 0".into(),
            ));
        }
        if !is_graphql_name(&self.input_type_prefix) {
            return Err(ModelQlError::InvalidConfig(format!(
                "input_type_prefix {:?} is not a valid GraphQL name",
                self.input_type_prefix
            )));
        }
        if self.context_type_name.is_empty() {
            return Err(ModelQlError::InvalidConfig(
                "context_type_name must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Installs the tracing subscriber, filtered by `RUST_LOG` or else by
    /// `log_level`.
    pub fn init_tracing(&self) {
        crate::telemetry::init_tracing_with_level(&self.log_level);
    }

    /// Converts this config to a SchemaBuilderConfig.
    #[must_use]
    pub fn to_schema_builder_config(&self) -> SchemaBuilderConfig {
        SchemaBuilderConfig {
            max_depth: self.max_depth,
            max_complexity: self.max_complexity,
            introspection_enabled: self.introspection,
            input_type_prefix: self.input_type_prefix.clone(),
            context_type_name: self.context_type_name.clone(),
        }
    }
}

/// `[_A-Za-z][_0-9A-Za-z]*`
fn is_graphql_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {
            chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ModelQlConfig::default();
        assert_eq!(config.max_depth, 15);
        assert_eq!(config.max_complexity, 500);
        assert!(config.introspection);
        assert_eq!(config.input_type_prefix, "input");
        assert_eq!(config.context_type_name, "ResContext");
        assert_eq!(config.log_level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_limits() {
        let mut config = ModelQlConfig::default();
        config.max_depth = 0;
        assert!(matches!(
            config.validate(),
            Err(ModelQlError::InvalidConfig(_))
        ));

        let mut config = ModelQlConfig::default();
        config.max_complexity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_input_prefix() {
        for prefix in ["", "1input", "in-put"] {
            let config = ModelQlConfig {
                input_type_prefix: prefix.to_string(),
                ..ModelQlConfig::default()
            };
            assert!(config.validate().is_err(), "prefix {prefix:?} should be rejected");
        }
    }

    #[test]
    fn test_from_toml_str() {
        let toml = r#"
            max_depth = 20
            introspection = false
            input_type_prefix = "Input_"
        "#;

        let config = ModelQlConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.max_depth, 20);
        assert_eq!(config.max_complexity, 500);
        assert!(!config.introspection);

        let builder = config.to_schema_builder_config();
        assert_eq!(builder.input_type_prefix, "Input_");
        assert!(!builder.introspection_enabled);
    }

    #[test]
    fn test_log_level_drives_tracing_init() {
        let config = ModelQlConfig::from_toml_str(r#"log_level = "debug""#).unwrap();
        assert_eq!(config.log_level, "debug");

        config.init_tracing();
        config.init_tracing();
    }

    #[test]
    fn test_from_toml_str_errors() {
        let err = ModelQlConfig::from_toml_str("max_depth = \"deep\"").unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");

        let err = ModelQlConfig::from_toml_str("max_depth = 0").unwrap_err();
        assert!(matches!(err, ModelQlError::InvalidConfig(_)));
    }
}
