//! Validation limits and TOML configuration support.
//!
//! The character bounds enforced when annotations are constructed can be tuned
//! from a config file instead of being hard coded:
//!
//! ```toml
//! # md-manage.toml
//! [limits]
//! label_max = 12
//! label_value_max = 255
//! text_max = 255
//! field_name_max = 50
//! ```

use serde::Deserialize;
use std::path::Path;

/// Errors that can occur while loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error reading the config file
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("Failed to parse TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Character bounds applied by the annotation validators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ValidationLimits {
    /// Maximum length of a label, including any `@`/`#` prefix
    pub label_max: usize,

    /// Maximum length of a label value
    pub label_value_max: usize,

    /// Maximum length of origin, description and service strings
    pub text_max: usize,

    /// Maximum length of a field name
    pub field_name_max: usize,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            label_max: 12,
            label_value_max: 255,
            text_max: 255,
            field_name_max: 50,
        }
    }
}

impl ValidationLimits {
    /// Returns true if `text` has between 1 and `max` characters.
    pub(crate) fn within(text: &str, max: usize) -> bool {
        let len = text.chars().count();
        len >= 1 && len <= max
    }
}

/// Root configuration structure for md-manage.toml files.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Validation bounds.
    #[serde(default)]
    pub limits: ValidationLimits,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}
