//! Configuration module for netcontext
//!
//! Handles loading and merging tool settings from multiple sources:
//! - Default values
//! - User configuration (~/.netcontext.toml)
//! - Project configuration (./netcontext.toml)
//! - An explicit file (`--config` or `NETCONTEXT_CONFIG`), which replaces
//!   the search above
//! - Environment variables
//!
//! Settings only affect the tool around the parser (logging, output); the
//! parsing rules themselves are not configurable.

use crate::logging::{LogFormat, LogLevel};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Dialects with a grammar.
pub const SUPPORTED_DIALECTS: &[&str] = &["ios"];

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging settings
    pub logging: LoggingSettings,

    /// How parsed trees are printed
    pub output: OutputSettings,

    /// Parser settings
    pub parser: ParserSettings,
}

/// Logging settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Minimum level when no `-v` flag or `RUST_LOG` is given
    pub level: LogLevel,

    /// Log line layout
    pub format: LogFormat,
}

/// Serialisation used for printed trees.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON output
    #[default]
    Json,
    /// YAML output
    Yaml,
}

/// Output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Default output format
    pub format: OutputFormat,

    /// Indent JSON output
    pub pretty: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            format: OutputFormat::Json,
            pretty: true,
        }
    }
}

/// Parser settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserSettings {
    /// Configuration dialect of the input files
    pub dialect: String,
}

impl Default for ParserSettings {
    fn default() -> Self {
        Self {
            dialect: "ios".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from all sources
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut merged = serde_json::to_value(Config::default())?;

        for path in Self::get_config_paths(config_path) {
            if path.exists() {
                merge_values(&mut merged, Self::read_layer(&path)?);
            }
        }

        let mut config: Config =
            serde_json::from_value(merged).context("Invalid configuration values")?;

        // Apply environment variable overrides
        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Get the list of configuration file paths to check
    fn get_config_paths(explicit_path: Option<&PathBuf>) -> Vec<PathBuf> {
        // Explicit path takes priority
        if let Some(path) = explicit_path {
            return vec![path.clone()];
        }

        // Environment variable
        if let Ok(env_config) = std::env::var("NETCONTEXT_CONFIG") {
            return vec![PathBuf::from(env_config)];
        }

        let mut paths = Vec::new();

        // User config
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".netcontext.toml"));
        }

        // Project config (current directory)
        paths.push(PathBuf::from("netcontext.toml"));

        paths
    }

    /// Read one configuration file as an untyped layer
    fn read_layer(path: &Path) -> Result<serde_json::Value> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        // Determine format based on extension
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let layer = match extension {
            "yml" | "yaml" => serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
            "json" => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
            "toml" => toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
            _ => {
                // Try TOML first, then YAML
                toml::from_str(&content)
                    .or_else(|_| serde_yaml::from_str(&content))
                    .with_context(|| format!("Failed to parse config file: {}", path.display()))?
            }
        };

        Ok(layer)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        // NETCONTEXT_LOG_LEVEL
        if let Ok(level) = std::env::var("NETCONTEXT_LOG_LEVEL") {
            self.logging.level = level.parse()?;
        }

        // NETCONTEXT_LOG_FORMAT
        if let Ok(format) = std::env::var("NETCONTEXT_LOG_FORMAT") {
            self.logging.format = format.parse()?;
        }

        // NETCONTEXT_OUTPUT
        if let Ok(output) = std::env::var("NETCONTEXT_OUTPUT") {
            self.output.format = match output.to_lowercase().as_str() {
                "json" => OutputFormat::Json,
                "yaml" | "yml" => OutputFormat::Yaml,
                other => bail!("NETCONTEXT_OUTPUT: unknown output format '{other}'"),
            };
        }

        Ok(())
    }

    /// Reject settings the tool cannot act on
    pub fn validate(&self) -> Result<()> {
        if !SUPPORTED_DIALECTS.contains(&self.parser.dialect.as_str()) {
            bail!(
                "Unsupported dialect '{}' (supported: {})",
                self.parser.dialect,
                SUPPORTED_DIALECTS.join(", ")
            );
        }
        Ok(())
    }

    /// Load from a specific file only, ignoring the environment
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let mut merged = serde_json::to_value(Config::default())?;
        merge_values(&mut merged, Self::read_layer(path.as_ref())?);

        let config: Config =
            serde_json::from_value(merged).context("Invalid configuration values")?;
        config.validate()?;
        Ok(config)
    }
}

/// Overlay `layer` onto `base`: tables merge key by key, anything else in
/// the layer replaces what was there.
fn merge_values(base: &mut serde_json::Value, layer: serde_json::Value) {
    match (base, layer) {
        (serde_json::Value::Object(base), serde_json::Value::Object(layer)) => {
            for (key, value) in layer {
                match base.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, layer) => *base = layer,
    }
}
