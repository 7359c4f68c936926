//! Engine configuration
//!
//! Mirrors the data source block the service is started with:
//!
//! ```yaml
//! data_sources:
//!   default: memory
//!   memory:
//!     type: memory
//! page_size: 10
//! default_namespace: "http://schema.org/"
//! strict: false
//! ```

use crate::rdf::namespace::DEFAULT_NAMESPACE;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// `data_sources.default` names no configured source
    #[error("Default data source is not configured: {0}")]
    UnknownDefaultSource(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// One configured backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceConfig {
    /// In-process document store, optionally seeded with documents
    Memory {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        documents: Vec<serde_json::Value>,
    },
}

/// Source tag → backend, plus the tag used when a query names none
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSourcesConfig {
    pub default: String,
    #[serde(flatten)]
    pub sources: IndexMap<String, SourceConfig>,
}

impl Default for DataSourcesConfig {
    fn default() -> Self {
        let mut sources = IndexMap::new();
        sources.insert(
            "memory".to_string(),
            SourceConfig::Memory {
                documents: Vec::new(),
            },
        );
        Self {
            default: "memory".to_string(),
            sources,
        }
    }
}

/// Resolution engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub data_sources: DataSourcesConfig,
    /// Records per page for type-scoped fetches
    pub page_size: usize,
    /// Namespace used to synthesize predicates for unmapped field names
    pub default_namespace: String,
    /// Abort resolution on the first data source failure
    pub strict: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_sources: DataSourcesConfig::default(),
            page_size: 10,
            default_namespace: DEFAULT_NAMESPACE.to_string(),
            strict: false,
        }
    }
}

impl EngineConfig {
    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        let config: EngineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.json`, `.yaml` or `.yml` file
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&contents),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&contents),
            other => Err(ConfigError::Invalid(format!(
                "unsupported config extension: {:?}",
                other
            ))),
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if !self
            .data_sources
            .sources
            .contains_key(&self.data_sources.default)
        {
            return Err(ConfigError::UnknownDefaultSource(
                self.data_sources.default.clone(),
            ));
        }
        if self.page_size == 0 {
            return Err(ConfigError::Invalid("page_size must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.data_sources.default, "memory");
        assert_eq!(config.page_size, 10);
        assert!(!config.strict);
    }

    #[test]
    fn test_from_yaml() {
        let yaml = r#"
data_sources:
  default: primary
  primary:
    type: memory
  archive:
    type: memory
    documents:
      - _id: "http://example.com/a"
        _type: ["Person"]
page_size: 5
strict: true
"#;
        let config = EngineConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.data_sources.default, "primary");
        assert_eq!(config.data_sources.sources.len(), 2);
        assert_eq!(config.page_size, 5);
        assert!(config.strict);
        assert_eq!(config.default_namespace, DEFAULT_NAMESPACE);
        match &config.data_sources.sources["archive"] {
            SourceConfig::Memory { documents } => assert_eq!(documents.len(), 1),
        }
    }

    #[test]
    fn test_from_json_matches_service_shape() {
        let json = r#"{"data_sources": {"default": "memory", "memory": {"type": "memory"}}}"#;
        let config = EngineConfig::from_json_str(json).unwrap();
        assert!(config.data_sources.sources.contains_key("memory"));
    }

    #[test]
    fn test_unknown_default_rejected() {
        let yaml = "data_sources:\n  default: mongo\n  memory:\n    type: memory\n";
        match EngineConfig::from_yaml_str(yaml) {
            Err(ConfigError::UnknownDefaultSource(tag)) => assert_eq!(tag, "mongo"),
            other => panic!("expected UnknownDefaultSource, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_page_size_rejected() {
        assert!(EngineConfig::from_yaml_str("page_size: 0\n").is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "page_size: 3").unwrap();
        let config = EngineConfig::from_file(file.path()).unwrap();
        assert_eq!(config.page_size, 3);

        let other = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        assert!(EngineConfig::from_file(other.path()).is_err());
    }
}
