//! FinIDR Configuration Management
//!
//! Handles configuration from environment variables and TOML config files
//! with sensible defaults for development.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PipelineConfig {
    /// Document classifier settings
    pub classifier: ClassifierConfig,

    /// Entity extractor settings
    pub extractor: ExtractorConfig,

    /// Relation extractor settings
    pub relations: RelationConfig,

    /// Graph / external store settings
    pub graph: GraphConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl PipelineConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("FIDR_CLASSIFIER_THRESHOLD") {
            config.classifier.confidence_threshold = parse_var("FIDR_CLASSIFIER_THRESHOLD", &v)?;
        }
        if let Ok(v) = std::env::var("FIDR_ENTITY_THRESHOLD") {
            config.extractor.confidence_threshold = parse_var("FIDR_ENTITY_THRESHOLD", &v)?;
        }
        if let Ok(v) = std::env::var("FIDR_RELATION_THRESHOLD") {
            config.relations.confidence_threshold = parse_var("FIDR_RELATION_THRESHOLD", &v)?;
        }
        if let Ok(v) = std::env::var("FIDR_RELATION_MAX_DISTANCE") {
            config.relations.max_distance = parse_var("FIDR_RELATION_MAX_DISTANCE", &v)?;
        }
        if let Ok(uri) = std::env::var("FIDR_GRAPH_STORE_URI") {
            config.graph.store_uri = Some(uri);
        }
        if let Ok(level) = std::env::var("FIDR_LOG_LEVEL") {
            config.logging.level = level;
        }

        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Document classifier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Minimum score to accept a classification; below this the result
    /// is `Unknown` with confidence 0
    pub confidence_threshold: f32,

    /// How many leading bytes of the document to scan for type patterns
    pub scan_limit: usize,

    /// How many leading bytes to scan for section headings
    pub section_scan_limit: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.5,
            scan_limit: 50_000,
            section_scan_limit: 100_000,
        }
    }
}

/// Entity extractor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Minimum confidence for an entity to be emitted
    pub confidence_threshold: f32,

    /// Enable the secondary lexicon recognizer
    pub use_lexicon: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.7,
            use_lexicon: true,
        }
    }
}

/// Relation extractor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationConfig {
    /// Minimum confidence for a relation to be emitted
    pub confidence_threshold: f32,

    /// Maximum distance in bytes between a captured span and the entity
    /// it resolves to; matches beyond this are discarded
    pub max_distance: usize,

    /// Enable co-occurrence fallback rules
    pub use_cooccurrence: bool,
}

impl Default for RelationConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.7,
            max_distance: 150,
            use_cooccurrence: true,
        }
    }
}

/// Graph builder / external store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Optional URI of an external property-graph store the exported
    /// merge statements are replayed against
    pub store_uri: Option<String>,

    /// Maximum evidence length stored per edge
    pub max_evidence_len: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            store_uri: None,
            max_evidence_len: 500,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.classifier.confidence_threshold, 0.5);
        assert_eq!(config.extractor.confidence_threshold, 0.7);
        assert_eq!(config.relations.max_distance, 150);
        assert!(config.extractor.use_lexicon);
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = PipelineConfig::default();
        let text = toml::to_string(&config).unwrap();
        let parsed: PipelineConfig = toml::from_str(&text).unwrap();
        assert_eq!(
            parsed.relations.max_distance,
            config.relations.max_distance
        );
    }
}
