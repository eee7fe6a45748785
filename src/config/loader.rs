//! Configuration file loading with precedence handling.

use super::LayoutSettings;
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during config loading.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Failed to read config file (permission issues, not a file, ...).
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError {
        /// Path that failed to read.
        path: PathBuf,
        /// Reason for failure.
        reason: String,
    },

    /// Config file contains invalid TOML syntax or unknown keys.
    #[error("Invalid TOML in {path}: {reason}")]
    ParseError {
        /// Path with invalid TOML.
        path: PathBuf,
        /// Parse error details.
        reason: String,
    },
}

/// TOML configuration file structure.
///
/// All fields are optional - if not specified, defaults are used.
/// Corresponds to `~/.config/boardfit/config.toml`.
///
/// ```toml
/// debounce_ms = 100
/// min_board_size = 280.0
///
/// [grouping]
/// tolerance = 20.0
/// max_spread_ratio = 2.5
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Resize debounce window in milliseconds.
    #[serde(default)]
    pub debounce_ms: Option<u64>,

    /// Minimum resize delta in px.
    #[serde(default)]
    pub min_resize_delta: Option<f64>,

    /// Dimension cache lifetime in milliseconds.
    #[serde(default)]
    pub cache_ttl_ms: Option<u64>,

    /// Snapshots retained in history.
    #[serde(default)]
    pub history_capacity: Option<usize>,

    /// Minimum board edge in px.
    #[serde(default)]
    pub min_board_size: Option<f64>,

    /// Minimum element spacing in px.
    #[serde(default)]
    pub element_spacing: Option<f64>,

    /// Transition length in milliseconds.
    #[serde(default)]
    pub transition_ms: Option<u64>,

    /// Path to log file for tracing output.
    #[serde(default)]
    pub log_file_path: Option<PathBuf>,

    /// Group placement thresholds.
    #[serde(default)]
    pub grouping: Option<GroupingSection>,
}

/// `[grouping]` section.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GroupingSection {
    /// Maximum gap between consecutive members in px.
    #[serde(default)]
    pub tolerance: Option<f64>,

    /// Ceiling on group spread ratio.
    #[serde(default)]
    pub max_spread_ratio: Option<f64>,
}

/// Resolve default log file path.
///
/// Returns `~/.local/state/boardfit/boardfit.log` on Unix-like systems,
/// or the platform equivalent. Falls back to the current directory.
pub fn default_log_path() -> PathBuf {
    if let Some(state_dir) = dirs::state_dir() {
        state_dir.join("boardfit").join("boardfit.log")
    } else {
        PathBuf::from("boardfit.log")
    }
}

/// Resolve default config file path.
///
/// Returns `~/.config/boardfit/config.toml` on Unix, appropriate path on other
/// platforms, `None` if no config directory can be determined.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("boardfit").join("config.toml"))
}

/// Load configuration file from a specific path.
///
/// Returns `Ok(None)` if the file doesn't exist (not an error - use defaults).
///
/// # Errors
///
/// Returns error if the file exists but cannot be read or parsed.
pub fn load_config_file(path: impl Into<PathBuf>) -> Result<Option<ConfigFile>, ConfigError> {
    let path = path.into();

    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    let config: ConfigFile = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    Ok(Some(config))
}

/// Load configuration with precedence handling.
///
/// Precedence (highest to lowest):
/// 1. Explicit `config_path` argument
/// 2. `BOARDFIT_CONFIG` environment variable
/// 3. Default path `~/.config/boardfit/config.toml`
///
/// # Errors
///
/// Returns error only if a config file exists but cannot be read or parsed.
pub fn load_config_with_precedence(
    config_path: Option<PathBuf>,
) -> Result<Option<ConfigFile>, ConfigError> {
    if let Some(path) = config_path {
        return load_config_file(path);
    }

    if let Ok(env_path) = std::env::var("BOARDFIT_CONFIG") {
        return load_config_file(PathBuf::from(env_path));
    }

    if let Some(default_path) = default_config_path() {
        return load_config_file(default_path);
    }

    Ok(None)
}

/// Merge config file into defaults to create resolved settings.
pub fn merge_config(config_file: Option<ConfigFile>) -> LayoutSettings {
    let defaults = LayoutSettings::default();

    let Some(config) = config_file else {
        return defaults;
    };
    let grouping = config.grouping.unwrap_or_default();

    LayoutSettings {
        debounce_ms: config.debounce_ms.unwrap_or(defaults.debounce_ms),
        min_resize_delta: config.min_resize_delta.unwrap_or(defaults.min_resize_delta),
        cache_ttl_ms: config.cache_ttl_ms.unwrap_or(defaults.cache_ttl_ms),
        history_capacity: config.history_capacity.unwrap_or(defaults.history_capacity),
        min_board_size: config.min_board_size.unwrap_or(defaults.min_board_size),
        element_spacing: config.element_spacing.unwrap_or(defaults.element_spacing),
        grouping_tolerance: grouping.tolerance.unwrap_or(defaults.grouping_tolerance),
        max_group_spread_ratio: grouping
            .max_spread_ratio
            .unwrap_or(defaults.max_group_spread_ratio),
        transition_ms: config.transition_ms.unwrap_or(defaults.transition_ms),
        log_file_path: config.log_file_path.unwrap_or(defaults.log_file_path),
        ..defaults
    }
}

/// Apply environment variable overrides.
///
/// Checks for:
/// - `BOARDFIT_DEBOUNCE_MS`
/// - `BOARDFIT_TRANSITION_MS`
/// - `BOARDFIT_HISTORY_CAPACITY`
///
/// Unparseable values are ignored with a warning.
pub fn apply_env_overrides(mut settings: LayoutSettings) -> LayoutSettings {
    if let Some(value) = env_number("BOARDFIT_DEBOUNCE_MS") {
        settings.debounce_ms = value;
    }
    if let Some(value) = env_number("BOARDFIT_TRANSITION_MS") {
        settings.transition_ms = value;
    }
    if let Some(value) = env_number("BOARDFIT_HISTORY_CAPACITY") {
        settings.history_capacity = value;
    }
    settings
}

/// Full resolution: file by precedence, merged over defaults, then
/// environment overrides.
///
/// # Errors
///
/// Returns error only if a config file exists but cannot be read or parsed.
pub fn resolve_settings(config_path: Option<PathBuf>) -> Result<LayoutSettings, ConfigError> {
    let file = load_config_with_precedence(config_path)?;
    Ok(apply_env_overrides(merge_config(file)))
}

fn env_number<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring unparseable environment override");
            None
        }
    }
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
