//! Configuration for the annotation web service

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::service::types::ServiceError;

/// Main service configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Primary annotation provider configuration
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Secondary enrichment source configurations
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
    /// Isoform override table configuration
    #[serde(default)]
    pub overrides: OverrideConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to (default: "0.0.0.0")
    pub host: String,
    /// Port to listen on (default: 8888)
    pub port: u16,
    /// Maximum request size (default: "2MB")
    pub max_request_size: String,
    /// Maximum variants per batch request (default: 1000)
    pub max_batch_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8888,
            max_request_size: "2MB".to_string(),
            max_batch_size: 1000,
        }
    }
}

/// Primary annotation provider configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    /// Base URL of the annotation endpoint
    pub base_url: String,
    /// Request timeout in seconds (default: 30)
    pub timeout_seconds: u64,
    /// Number of resolved annotations to retain (default: 10000)
    pub cache_capacity: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_seconds: 30,
            cache_capacity: crate::cache::DEFAULT_CACHE_CAPACITY,
        }
    }
}

/// Configuration for all enrichment sources
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EnrichmentConfig {
    /// Mutation-impact scoring service
    pub mutation_impact: Option<SourceConfig>,
    /// Aggregated variant-info service
    pub variant_info: Option<SourceConfig>,
    /// Hotspot recurrence service
    pub hotspots: Option<SourceConfig>,
}

/// One enrichment source endpoint
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    /// Whether the source is enabled
    pub enabled: bool,
    /// Base URL of the source endpoint
    pub base_url: String,
    /// Request timeout in seconds (default: 10)
    #[serde(default = "default_source_timeout")]
    pub timeout_seconds: u64,
}

fn default_source_timeout() -> u64 {
    10
}

/// Isoform override table configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OverrideConfig {
    /// Path to a JSON file of per-source override records
    pub path: Option<PathBuf>,
}

impl ServiceConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self, ServiceError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ServiceError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| {
            ServiceError::ConfigError(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    /// Write this configuration to a TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<(), ServiceError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ServiceError::ConfigError(format!("Failed to serialize config: {}", e)))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ServiceError::ConfigError(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }
        std::fs::write(path, content).map_err(|e| {
            ServiceError::ConfigError(format!("Failed to write {}: {}", path.display(), e))
        })
    }

    /// A sample configuration with every section populated
    pub fn sample() -> Self {
        Self {
            enrichment: EnrichmentConfig {
                mutation_impact: Some(SourceConfig {
                    enabled: false,
                    base_url: "http://localhost:8001/mutation_impact".to_string(),
                    timeout_seconds: 10,
                }),
                variant_info: Some(SourceConfig {
                    enabled: false,
                    base_url: "http://localhost:8002/variant_info".to_string(),
                    timeout_seconds: 10,
                }),
                hotspots: Some(SourceConfig {
                    enabled: false,
                    base_url: "http://localhost:8003/hotspots".to_string(),
                    timeout_seconds: 10,
                }),
            },
            overrides: OverrideConfig {
                path: Some(PathBuf::from("data/isoform_overrides.json")),
            },
            ..Default::default()
        }
    }
}
