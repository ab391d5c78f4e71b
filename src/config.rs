//! Run configuration
//!
//! Every section falls back to its defaults, so a config file only needs
//! the values it changes:
//!
//! ```yaml
//! mapping:
//!   type_predicates: ["rdf:type", "ex:isA"]
//!   prefixes:
//!     ex: "http://example.org/"
//! resolver:
//!   threshold: 0.85
//!   labels: [ORG]
//! retry:
//!   max_attempts: 5
//! ```

use crate::extract::{GazetteerRecognizer, KeywordRelationClassifier, Mention, RelationRule};
use crate::rdf::MappingConfig;
use crate::resolve::{ResolveError, ResolverConfig};
use crate::store::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    /// Config file with an extension other than yaml, yml or json
    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid resolver settings: {0}")]
    Resolver(#[from] ResolveError),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Dictionary and rules for rule-based extraction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Gazetteer entries
    pub entities: Vec<Mention>,
    pub rules: Vec<RelationRule>,
}

impl ExtractionConfig {
    pub fn recognizer(&self) -> GazetteerRecognizer {
        self.entities
            .iter()
            .map(|m| (m.text.clone(), m.entity_type.clone()))
            .collect()
    }

    pub fn classifier(&self) -> KeywordRelationClassifier {
        KeywordRelationClassifier::new(self.rules.clone())
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KgConfig {
    pub mapping: MappingConfig,
    pub resolver: ResolverConfig,
    pub retry: RetryPolicy,
    pub extraction: ExtractionConfig,
}

impl KgConfig {
    /// Load from a `.yaml`, `.yml` or `.json` file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        match extension.as_str() {
            "yaml" | "yml" => Self::from_yaml_str(&content),
            "json" => Self::from_json_str(&content),
            other => Err(ConfigError::UnsupportedFormat(other.to_string())),
        }
    }

    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        let mut config: KgConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        config.sanitize_names();
        Ok(config)
    }

    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        let mut config: KgConfig = serde_json::from_str(content)?;
        config.validate()?;
        config.sanitize_names();
        Ok(config)
    }

    pub fn to_yaml_string(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.resolver.validate()?;
        Ok(())
    }

    /// Bring configured labels and property keys into the form the store uses
    pub fn sanitize_names(&mut self) {
        self.mapping.sanitize_names();
        self.resolver.sanitize_names();
    }
}
