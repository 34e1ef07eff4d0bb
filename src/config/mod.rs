//! Configuration management for pip-shell
//!
//! This module handles loading, parsing, and validating configuration
//! from TOML files: the defaults every new layer surface starts from,
//! whether the xdg toplevel fallback may be used, and the log level.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::protocol::{KeyboardMode, Layer};

/// Namespace used when neither the config nor the caller provides one
pub const DEFAULT_NAMESPACE: &str = "pip-shell";

/// Log levels accepted by `[logging] level`
pub const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

/// Main configuration struct
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ShellConfig {
    /// Defaults for new layer surfaces
    #[serde(default)]
    pub surface: SurfaceDefaults,

    /// Secondary protocol tier
    #[serde(default)]
    pub fallback: FallbackConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Initial state of a freshly bound layer surface
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SurfaceDefaults {
    /// Namespace reported when the window sets none; doubles as the app id
    /// of fallback toplevels
    pub namespace: String,

    pub layer: Layer,

    pub keyboard_mode: KeyboardMode,

    /// Fixed exclusive zone; -1 asks not to be moved by other zones
    pub exclusive_zone: i32,

    /// Derive the exclusive zone from size and margins
    pub auto_exclusive_zone: bool,
}

impl Default for SurfaceDefaults {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            layer: Layer::Top,
            keyboard_mode: KeyboardMode::None,
            exclusive_zone: 0,
            auto_exclusive_zone: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FallbackConfig {
    /// Bind windows as plain xdg toplevels when there is no layer shell
    pub toplevel: bool,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self { toplevel: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is not set
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl ShellConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        // Expand ~ to home directory
        let expanded_path = if path.to_string_lossy().starts_with('~') {
            let home = std::env::var("HOME").context("Failed to get HOME environment variable")?;
            Path::new(&home).join(path.strip_prefix("~").unwrap_or(path))
        } else {
            path.to_path_buf()
        };

        let contents = fs::read_to_string(&expanded_path)
            .with_context(|| format!("Failed to read config file: {}", expanded_path.display()))?;

        let config: ShellConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", expanded_path.display()))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.surface.namespace.trim().is_empty() {
            anyhow::bail!("Invalid namespace: must not be empty");
        }

        if self.surface.exclusive_zone < -1 {
            anyhow::bail!(
                "Invalid exclusive_zone {}: must be -1 or greater",
                self.surface.exclusive_zone
            );
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            anyhow::bail!("Invalid log level: {}", self.logging.level);
        }

        Ok(())
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        fs::write(path, contents).context("Failed to write configuration file")?;

        Ok(())
    }
}
