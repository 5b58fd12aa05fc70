//! Configuration management for kvdemos.
//!
//! Settings come from built-in defaults, an optional YAML file, and
//! `KVDEMOS_*` environment variables, in increasing order of precedence.
//! Nested fields use a double underscore, e.g. `KVDEMOS_STORE__URL`.

use serde::{Deserialize, Serialize};

use crate::error::{KvDemoError, Result};

/// Prefix for environment variable overrides.
const ENV_PREFIX: &str = "KVDEMOS";

/// Main configuration for the demos.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KvDemoConfig {
    /// Store connection configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Rate limiter demo configuration
    #[serde(default)]
    pub rate_limiting: RateLimitingConfig,
}

/// Connection settings for the external key-value store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Connection URL understood by the redis client
    #[serde(default = "default_url")]
    pub url: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { url: default_url() }
    }
}

fn default_url() -> String {
    "redis://localhost:1234/".to_string()
}

/// Settings for the sliding-window rate limiter demo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLimitingConfig {
    /// Maximum admitted requests per window
    #[serde(default = "default_max_calls")]
    pub max_calls_in_period: u64,

    /// Trailing window length in seconds
    #[serde(default = "default_period")]
    pub period_secs: u64,

    /// Requests issued per client in each burst
    #[serde(default = "default_burst")]
    pub burst: usize,

    /// Run trim, count and insert as one atomic step
    #[serde(default = "default_atomic")]
    pub atomic: bool,
}

impl Default for RateLimitingConfig {
    fn default() -> Self {
        Self {
            max_calls_in_period: default_max_calls(),
            period_secs: default_period(),
            burst: default_burst(),
            atomic: default_atomic(),
        }
    }
}

fn default_max_calls() -> u64 {
    5
}

fn default_period() -> u64 {
    3
}

fn default_burst() -> usize {
    12
}

fn default_atomic() -> bool {
    true
}

impl KvDemoConfig {
    /// Load configuration from a YAML file path.
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| KvDemoError::Config(e.to_string()))
    }

    /// Load configuration from an optional file, layered under environment overrides.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(
                ::config::File::new(path, ::config::FileFormat::Yaml).required(true),
            );
        }
        let settings = builder
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
