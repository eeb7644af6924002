//! Chart Configuration Settings
//!
//! Configuration types for the quote chart, loaded from environment variables.

use std::path::PathBuf;

/// Where quote batches are read from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InputSource {
    /// Standard input.
    #[default]
    Stdin,
    /// A JSON-lines file.
    File(PathBuf),
}

impl InputSource {
    /// Parse an input setting; `-` means stdin.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is empty.
    pub fn parse(key: &str, value: &str) -> Result<Self, ConfigError> {
        match value.trim() {
            "" => Err(ConfigError::EmptyValue(key.to_string())),
            "-" => Ok(Self::Stdin),
            path => Ok(Self::File(PathBuf::from(path))),
        }
    }
}

/// Whether a table worker is provided to the chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkerMode {
    /// Tables are created in-process.
    #[default]
    Enabled,
    /// No worker; the chart stays disabled.
    Disabled,
}

impl WorkerMode {
    /// Parse worker mode from string.
    #[must_use]
    pub fn from_str_case_insensitive(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "disabled" | "off" | "false" => Self::Disabled,
            _ => Self::Enabled,
        }
    }

    /// Get the mode name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Enabled => "enabled",
            Self::Disabled => "disabled",
        }
    }
}

/// Complete chart configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartConfig {
    /// Quote input.
    pub input: InputSource,
    /// Worker availability.
    pub worker: WorkerMode,
    /// Install the Prometheus recorder.
    pub metrics_enabled: bool,
    /// Capacity of the channel between feed reader and chart.
    pub channel_capacity: usize,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            input: InputSource::Stdin,
            worker: WorkerMode::Enabled,
            metrics_enabled: true,
            channel_capacity: 256,
        }
    }
}

impl ChartConfig {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an unusable value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let input = lookup("QUOTE_CHART_INPUT")
            .map(|v| InputSource::parse("QUOTE_CHART_INPUT", &v))
            .transpose()?
            .unwrap_or(defaults.input);

        let worker = lookup("QUOTE_CHART_WORKER")
            .map(|v| WorkerMode::from_str_case_insensitive(&v))
            .unwrap_or(defaults.worker);

        let metrics_enabled = lookup("QUOTE_CHART_METRICS")
            .map_or(defaults.metrics_enabled, |v| v.to_lowercase() != "false");

        let channel_capacity = lookup("QUOTE_CHART_CHANNEL_CAPACITY")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.channel_capacity);

        if channel_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                key: "QUOTE_CHART_CHANNEL_CAPACITY".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            input,
            worker,
            metrics_enabled,
            channel_capacity,
        })
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Environment variable has empty value.
    #[error("environment variable {0} cannot be empty")]
    EmptyValue(String),
    /// Environment variable has an unusable value.
    #[error("invalid value for {key}: {reason}")]
    InvalidValue {
        /// Variable name.
        key: String,
        /// Why it was rejected.
        reason: String,
    },
}
