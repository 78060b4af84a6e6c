//! Configuration loading from TOML files
//!
//! Config file is selected via:
//! 1. --config <path> command line argument
//! 2. CONFIG_FILE environment variable
//! 3. Default: config/dev.toml

use crate::domain::types::Attraction;
use anyhow::Context;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct TrackerConfig {
    /// Number of concurrent fetch slots in the worker pool
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self { pool_size: default_pool_size() }
    }
}

fn default_pool_size() -> usize {
    1000
}

#[derive(Debug, Clone, Deserialize)]
pub struct RankingConfig {
    /// Number of attractions returned by nearest-attraction queries
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self { top_k: default_top_k() }
    }
}

fn default_top_k() -> usize {
    5
}

#[derive(Debug, Clone, Deserialize)]
pub struct RewardsConfig {
    /// A visit within this many statute miles of an attraction earns a reward
    #[serde(default = "default_proximity_buffer_miles")]
    pub proximity_buffer_miles: f64,
}

impl Default for RewardsConfig {
    fn default() -> Self {
        Self { proximity_buffer_miles: default_proximity_buffer_miles() }
    }
}

fn default_proximity_buffer_miles() -> f64 {
    10.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_interval_secs")]
    pub interval_secs: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { interval_secs: default_metrics_interval_secs() }
    }
}

fn default_metrics_interval_secs() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Unique deployment identifier
    #[serde(default = "default_site_id")]
    pub id: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self { id: default_site_id() }
    }
}

fn default_site_id() -> String {
    "tourtrack".to_string()
}

/// One attraction catalog entry in the config file
#[derive(Debug, Clone, Deserialize)]
pub struct AttractionEntry {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub ranking: RankingConfig,
    #[serde(default)]
    pub rewards: RewardsConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub attractions: Vec<AttractionEntry>,
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    site_id: String,
    pool_size: usize,
    top_k: usize,
    proximity_buffer_miles: f64,
    metrics_interval_secs: u64,
    attractions: Vec<Attraction>,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site_id: default_site_id(),
            pool_size: default_pool_size(),
            top_k: default_top_k(),
            proximity_buffer_miles: default_proximity_buffer_miles(),
            metrics_interval_secs: default_metrics_interval_secs(),
            attractions: Self::default_attractions(),
            config_file: "default".to_string(),
        }
    }
}

impl Config {
    /// Built-in attraction catalog, used when the config file lists none
    fn default_attractions() -> Vec<Attraction> {
        vec![
            Attraction::new("Disneyland", 33.817595, -117.922008),
            Attraction::new("Jackson Hole", 43.582767, -110.821999),
            Attraction::new("Mojave National Preserve", 35.141689, -115.510399),
            Attraction::new("Joshua Tree National Park", 33.881866, -115.90065),
            Attraction::new("Buffalo National River", 35.985512, -92.757652),
            Attraction::new("Hot Springs Park", 34.52153, -93.042267),
        ]
    }

    /// Determine the config file path: explicit CLI override first, then the
    /// CONFIG_FILE environment variable, then the default path.
    pub fn resolve_config_path(cli_override: Option<&str>) -> String {
        if let Some(path) = cli_override {
            return path.to_string();
        }

        if let Ok(path) = env::var("CONFIG_FILE") {
            return path;
        }

        "config/dev.toml".to_string()
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let toml_config: TomlConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        let attractions = if toml_config.attractions.is_empty() {
            Self::default_attractions()
        } else {
            toml_config
                .attractions
                .into_iter()
                .map(|a| Attraction::new(a.name, a.latitude, a.longitude))
                .collect()
        };

        Ok(Self {
            site_id: toml_config.site.id,
            pool_size: toml_config.tracker.pool_size,
            top_k: toml_config.ranking.top_k,
            proximity_buffer_miles: toml_config.rewards.proximity_buffer_miles,
            metrics_interval_secs: toml_config.metrics.interval_secs,
            attractions,
            config_file: path.display().to_string(),
        })
    }

    /// Load configuration - tries TOML file first, falls back to defaults
    pub fn load(cli_override: Option<&str>) -> Self {
        let config_path = Self::resolve_config_path(cli_override);
        Self::load_from_path(&config_path)
    }

    /// Load configuration from an explicit path, falling back to defaults
    pub fn load_from_path(path: &str) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Warning: {}. Using defaults.", e);
                Self::default()
            }
        }
    }

    // Getters for all config fields
    pub fn site_id(&self) -> &str {
        &self.site_id
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn proximity_buffer_miles(&self) -> f64 {
        self.proximity_buffer_miles
    }

    pub fn metrics_interval_secs(&self) -> u64 {
        self.metrics_interval_secs
    }

    pub fn attractions(&self) -> &[Attraction] {
        &self.attractions
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    /// Builder method for tests to set the worker pool size
    #[cfg(test)]
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    /// Builder method for tests to set the proximity buffer
    #[cfg(test)]
    pub fn with_proximity_buffer_miles(mut self, miles: f64) -> Self {
        self.proximity_buffer_miles = miles;
        self
    }
}
