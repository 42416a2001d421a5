//! Structured logging for timecentric runs.
//!
//! Filters are read from the `TCG_LOG` environment variable and fall back
//! to the level given by the caller or the `[logging]` configuration.
//!
//! # Environment Variables
//!
//! - `TCG_LOG=info` - Default log level
//! - `TCG_LOG=debug` - Per-graph assembly and reduction details
//! - `TCG_LOG=warn,timecentric_engine::loader=debug` - Combined filters
//!
//! # Example
//!
//! ```ignore
//! use timecentric_engine::logging;
//!
//! logging::init_from_config(&config.logging);
//! ```

use crate::config::LoggingConfig;
use tracing_subscriber::{EnvFilter, fmt};

/// Name of the environment variable holding the filter directives.
pub const LOG_ENV: &str = "TCG_LOG";

fn filter_or(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Initializes compact logging at `info` unless `TCG_LOG` says otherwise.
///
/// Only the first initialization in a process takes effect.
pub fn init() {
    init_with_default("info");
}

/// Initializes compact logging with a custom default level.
pub fn init_with_default(default_level: &str) {
    let subscriber = fmt()
        .with_env_filter(filter_or(default_level))
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact();

    // a subscriber may already be installed
    let _ = subscriber.try_init();
}

/// Initializes logging with JSON output, one object per event.
pub fn init_json() {
    init_json_with_default("info");
}

fn init_json_with_default(default_level: &str) {
    let subscriber = fmt()
        .with_env_filter(filter_or(default_level))
        .with_target(true)
        .json();

    let _ = subscriber.try_init();
}

/// Initializes logging according to the `[logging]` section.
pub fn init_from_config(config: &LoggingConfig) {
    if config.json {
        init_json_with_default(&config.level);
    } else {
        init_with_default(&config.level);
    }
}
