use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

/// Ordered, immutable list of configured sources.
pub type Registry = Arc<[SourceConfig]>;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Per-request fetch timeout in seconds
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,
    /// Entries kept from each source
    #[serde(default = "default_per_source_limit")]
    pub per_source_limit: usize,
    /// Items returned across all sources
    #[serde(default = "default_max_items")]
    pub max_items: usize,
    /// Characters of description kept before the ellipsis
    #[serde(default = "default_description_length")]
    pub description_length: usize,
    #[serde(default)]
    pub locale: Locale,
    /// Offset from UTC used when formatting publish dates
    #[serde(default)]
    pub utc_offset_minutes: i32,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

fn default_port() -> u16 {
    3000
}

fn default_fetch_timeout_secs() -> u64 {
    10
}

fn default_max_concurrent_fetches() -> usize {
    5
}

fn default_per_source_limit() -> usize {
    3
}

fn default_max_items() -> usize {
    15
}

fn default_description_length() -> usize {
    120
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    pub name: String,
    pub url: String,
    /// Display color, e.g. `#009688`
    pub color: String,
}

/// Language used for fallback literals and month names.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Mk,
    En,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse config from a TOML string (useful for testing)
    pub fn from_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        if config.max_concurrent_fetches == 0 {
            anyhow::bail!("max_concurrent_fetches must be at least 1");
        }
        Ok(config)
    }

    pub fn registry(&self) -> Registry {
        self.sources.clone().into()
    }
}
