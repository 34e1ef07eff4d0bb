//! Logging setup
//!
//! The library itself only emits records through the `log` facade. Hosts
//! (and the probe binary) call [`init`] once to route them to stderr via
//! `env_logger`. `RUST_LOG` always wins over the configured level.

use log::{debug, LevelFilter};

use crate::config::LoggingConfig;

/// Parse a configured level name, case-insensitive
pub fn level_filter(level: &str) -> Option<LevelFilter> {
    match level.to_ascii_lowercase().as_str() {
        "off" => Some(LevelFilter::Off),
        "error" => Some(LevelFilter::Error),
        "warn" | "warning" => Some(LevelFilter::Warn),
        "info" => Some(LevelFilter::Info),
        "debug" => Some(LevelFilter::Debug),
        "trace" => Some(LevelFilter::Trace),
        _ => None,
    }
}

/// Filter used when `RUST_LOG` is unset
pub fn default_filter(config: &LoggingConfig, debug: bool) -> String {
    if debug {
        return "debug".to_string();
    }
    match level_filter(&config.level) {
        Some(filter) => filter.to_string().to_ascii_lowercase(),
        None => "info".to_string(),
    }
}

/// Install the global logger
///
/// Returns `false` when a logger was already installed, which is not an
/// error: embedding applications often set up their own.
pub fn init(config: &LoggingConfig, debug: bool) -> bool {
    let filter = default_filter(config, debug);
    let installed = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter))
        .try_init()
        .is_ok();
    if !installed {
        debug!("Logger already initialised, keeping it");
    }
    installed
}
