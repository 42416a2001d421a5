//! Unified configuration for timecentric runs.
//!
//! Values come from three layers:
//! - Default values (embedded in binary)
//! - Configuration files (TOML format)
//! - Environment variable overrides (prefix: `TCG__`)
//!
//! # Environment Variables
//!
//! - `TCG__EXTRACTION__WINDOW_SIZE=2`
//! - `TCG__EXTRACTION__START_YEAR=1861`
//! - `TCG__WEIGHTING__STRATEGY=tf_itf`
//! - `TCG__REDUCTION__TOP_N=50`
//! - `TCG__SERVER__PORT=9000`
//!
//! # Example
//!
//! ```ignore
//! use timecentric_engine::config::TimecentricConfig;
//!
//! let config = TimecentricConfig::load(Some("timecentric.toml"))?;
//! println!("window: {} sentences", config.extraction.window_size);
//! ```

use crate::weighting::WeightingStrategy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use timecentric_core::Timestamp;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TimecentricConfig {
    /// Co-occurrence window and year range
    pub extraction: ExtractionConfig,
    /// Node weighting strategy
    pub weighting: WeightingConfig,
    /// Post-processing passes
    pub reduction: ReductionConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Query service
    pub server: ServerConfig,
}

impl TimecentricConfig {
    /// Loads configuration from an optional file path with environment variable overrides.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (TCG__*)
    /// 2. Configuration file (if provided)
    /// 3. Built-in defaults
    ///
    /// The result is validated before it is returned.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(file_path) = path {
            if Path::new(file_path).exists() {
                let contents = std::fs::read_to_string(file_path)?;
                config = toml::from_str(&contents)?;
            } else {
                tracing::warn!(path = file_path, "configuration file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Applies `TCG__SECTION__KEY` environment variables.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from an arbitrary lookup, keyed like the environment.
    ///
    /// Unparseable values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
            lookup(key).and_then(|val| val.trim().parse().ok())
        }
        fn flag(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<bool> {
            lookup(key).map(|val| val.to_lowercase() == "true" || val == "1")
        }

        // Extraction overrides
        if let Some(v) = parsed(&lookup, "TCG__EXTRACTION__WINDOW_SIZE") {
            self.extraction.window_size = v;
        }
        if let Some(v) = parsed(&lookup, "TCG__EXTRACTION__START_YEAR") {
            self.extraction.start_year = Some(v);
        }
        if let Some(v) = parsed(&lookup, "TCG__EXTRACTION__END_YEAR") {
            self.extraction.end_year = Some(v);
        }

        // Weighting overrides
        if let Some(val) = lookup("TCG__WEIGHTING__STRATEGY") {
            self.weighting.strategy = val;
        }

        // Reduction overrides
        if let Some(v) = parsed::<usize>(&lookup, "TCG__REDUCTION__TOP_N") {
            self.reduction.top_n = Some(v);
        }
        if let Some(v) = flag(&lookup, "TCG__REDUCTION__REMOVE_SELF_LOOPS") {
            self.reduction.remove_self_loops = v;
        }
        if let Some(v) = flag(&lookup, "TCG__REDUCTION__REMOVE_TIMESTAMP_SELF_MENTIONS") {
            self.reduction.remove_timestamp_self_mentions = v;
        }

        // Logging overrides
        if let Some(val) = lookup("TCG__LOGGING__LEVEL") {
            self.logging.level = val;
        }
        if let Some(v) = flag(&lookup, "TCG__LOGGING__JSON") {
            self.logging.json = v;
        }

        // Server overrides
        if let Some(v) = parsed(&lookup, "TCG__SERVER__PORT") {
            self.server.port = v;
        }
        if let Some(v) = parsed(&lookup, "TCG__SERVER__DEFAULT_LIMIT") {
            self.server.default_limit = v;
        }
        if let Some(v) = parsed(&lookup, "TCG__SERVER__SUGGEST_LIMIT") {
            self.server.suggest_limit = v;
        }
    }

    /// Checks cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.weighting.strategy()?;
        if let (Some(start), Some(end)) = (self.extraction.start_year, self.extraction.end_year) {
            if start > end {
                return Err(ConfigError::Invalid(format!(
                    "start_year {} is after end_year {}",
                    start, end
                )));
            }
        }
        Ok(())
    }

    /// Serializes the configuration to TOML format.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Extraction parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Sentences taken on each side of a mention's sentence
    pub window_size: usize,
    /// Earliest accepted mention year (inclusive, None = unbounded)
    pub start_year: Option<i32>,
    /// Latest accepted mention year (inclusive, None = unbounded)
    pub end_year: Option<i32>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            window_size: 1,
            start_year: None,
            end_year: None,
        }
    }
}

impl ExtractionConfig {
    /// True if a mention of `timestamp` takes part in extraction: it has a
    /// year and the year lies in the configured range.
    pub fn accepts(&self, timestamp: &Timestamp) -> bool {
        let Some(year) = timestamp.year_value() else {
            return false;
        };
        self.start_year.is_none_or(|start| year >= start) && self.end_year.is_none_or(|end| year <= end)
    }
}

/// Weighting configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightingConfig {
    /// Strategy name (`tf_itf_per_granularity` or `tf_itf`)
    pub strategy: String,
}

impl Default for WeightingConfig {
    fn default() -> Self {
        Self {
            strategy: WeightingStrategy::default().to_string(),
        }
    }
}

impl WeightingConfig {
    /// Resolves the configured strategy name.
    pub fn strategy(&self) -> Result<WeightingStrategy, ConfigError> {
        self.strategy
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("unknown weighting strategy {:?}", self.strategy)))
    }
}

/// Reduction passes, applied in field order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReductionConfig {
    /// Remove edges whose endpoints carry the same label
    pub remove_self_loops: bool,
    /// Remove the node naming the graph's own timestamp
    pub remove_timestamp_self_mentions: bool,
    /// Keep only the N highest-weighted nodes per graph (None = keep all)
    pub top_n: Option<usize>,
}

impl Default for ReductionConfig {
    fn default() -> Self {
        Self {
            remove_self_loops: true,
            remove_timestamp_self_mentions: true,
            top_n: Some(25),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Use JSON format for log output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Query service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    /// Nodes returned by `/graphs/{timestamp}` without a `limit`
    pub default_limit: usize,
    /// Labels returned by `/query/suggest/{phrase}` without a `limit`
    pub suggest_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            default_limit: 10,
            suggest_limit: 5,
        }
    }
}
