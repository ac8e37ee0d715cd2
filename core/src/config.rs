//! Configuration
//!
//! Centralized configuration loading, supporting a TOML file at
//! `~/.config/quill/quill.toml`.
//!
//! # Configuration Priority
//!
//! Values are loaded with the following priority (highest first):
//! 1. CLI arguments (when applicable)
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! The API key is env-only (`OPENAI_API_KEY`); it never lives in the
//! config file.
//!
//! # Example Configuration
//!
//! ```toml
//! [model]
//! name = "gpt-4"
//! temperature = 0.7
//!
//! [ui]
//! stall_notice_ms = 3000
//!
//! [storage]
//! stories_dir = "/home/me/stories"
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file.
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted.
        path: PathBuf,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse TOML.
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Resolved configuration.
#[derive(Clone, Debug)]
pub struct QuillConfig {
    /// Model identifier.
    pub model: String,
    /// Sampling temperature, 0.0 to 2.0.
    pub temperature: f32,
    /// Delay before the stall notice, in milliseconds.
    pub stall_notice_ms: u64,
    /// Where stories are read from and written to.
    pub stories_dir: PathBuf,
}

impl Default for QuillConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4".to_string(),
            temperature: 0.7,
            stall_notice_ms: 3000,
            stories_dir: default_stories_dir(),
        }
    }
}

impl QuillConfig {
    /// The stall delay as a [`Duration`].
    #[must_use]
    pub fn stall_delay(&self) -> Duration {
        Duration::from_millis(self.stall_notice_ms)
    }
}

/// TOML file schema. Every field is optional; missing values fall back
/// to defaults.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct QuillToml {
    model: Option<ModelSection>,
    ui: Option<UiSection>,
    storage: Option<StorageSection>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct ModelSection {
    name: Option<String>,
    temperature: Option<f32>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct UiSection {
    stall_notice_ms: Option<u64>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct StorageSection {
    stories_dir: Option<PathBuf>,
}

/// Default config file path: `$XDG_CONFIG_HOME/quill/quill.toml`.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("quill").join("quill.toml"))
}

/// Default stories directory: `$XDG_DATA_HOME/quill/stories`.
#[must_use]
pub fn default_stories_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("quill")
        .join("stories")
}

/// Load configuration: the default path's file if it exists, then
/// environment overrides.
///
/// # Errors
///
/// Fails when the config file exists but cannot be read or parsed, or
/// when a value is out of range.
pub fn load() -> Result<QuillConfig, ConfigError> {
    let mut config = match default_config_path() {
        Some(path) if path.exists() => load_from_path(&path)?,
        _ => QuillConfig::default(),
    };
    apply_env(&mut config);
    validate(&config)?;
    Ok(config)
}

/// Load configuration from a specific TOML file, then environment
/// overrides.
///
/// # Errors
///
/// Fails when the file cannot be read or parsed, or when a value is out
/// of range.
pub fn load_from_path(path: &std::path::Path) -> Result<QuillConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    let file: QuillToml = toml::from_str(&text)?;

    let defaults = QuillConfig::default();
    let model = file.model.unwrap_or_default();
    let ui = file.ui.unwrap_or_default();
    let storage = file.storage.unwrap_or_default();

    let config = QuillConfig {
        model: model.name.unwrap_or(defaults.model),
        temperature: model.temperature.unwrap_or(defaults.temperature),
        stall_notice_ms: ui.stall_notice_ms.unwrap_or(defaults.stall_notice_ms),
        stories_dir: storage.stories_dir.unwrap_or(defaults.stories_dir),
    };
    validate(&config)?;
    Ok(config)
}

fn apply_env(config: &mut QuillConfig) {
    if let Ok(model) = std::env::var("QUILL_MODEL") {
        config.model = model;
    }
    if let Some(temperature) = std::env::var("QUILL_TEMPERATURE")
        .ok()
        .and_then(|v| v.parse().ok())
    {
        config.temperature = temperature;
    }
    if let Some(ms) = std::env::var("QUILL_STALL_MS")
        .ok()
        .and_then(|v| v.parse().ok())
    {
        config.stall_notice_ms = ms;
    }
    if let Ok(dir) = std::env::var("QUILL_STORIES_DIR") {
        config.stories_dir = PathBuf::from(dir);
    }
}

fn validate(config: &QuillConfig) -> Result<(), ConfigError> {
    if !(0.0..=2.0).contains(&config.temperature) {
        return Err(ConfigError::ValidationError(format!(
            "temperature must be between 0.0 and 2.0, got {}",
            config.temperature
        )));
    }
    if config.model.is_empty() {
        return Err(ConfigError::ValidationError(
            "model name must not be empty".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = QuillConfig::default();
        assert_eq!(config.model, "gpt-4");
        assert_eq!(config.stall_notice_ms, 3000);
        assert_eq!(config.stall_delay(), Duration::from_millis(3000));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quill.toml");
        std::fs::write(
            &path,
            "[model]\nname = \"gpt-4-turbo\"\ntemperature = 0.5\n\n[ui]\nstall_notice_ms = 1000\n",
        )
        .unwrap();

        let config = load_from_path(&path).unwrap();
        assert_eq!(config.model, "gpt-4-turbo");
        assert!((config.temperature - 0.5).abs() < f32::EPSILON);
        assert_eq!(config.stall_notice_ms, 1000);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quill.toml");
        std::fs::write(&path, "[ui]\nstall_notice_ms = 500\n").unwrap();

        let config = load_from_path(&path).unwrap();
        assert_eq!(config.model, "gpt-4");
        assert_eq!(config.stall_notice_ms, 500);
    }

    #[test]
    fn test_temperature_out_of_range_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quill.toml");
        std::fs::write(&path, "[model]\ntemperature = 3.5\n").unwrap();

        assert!(matches!(
            load_from_path(&path),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_malformed_toml_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quill.toml");
        std::fs::write(&path, "[model\n").unwrap();

        assert!(matches!(
            load_from_path(&path),
            Err(ConfigError::ParseError(_))
        ));
    }
}
