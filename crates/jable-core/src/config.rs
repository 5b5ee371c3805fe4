//! `Jable` Configuration Module
//!
//! Provides configuration file support via `jable.toml` and environment
//! variables.
//!
//! # Priority (highest to lowest)
//!
//! 1. Environment variables (`JABLE_*`, sections separated by `__`, e.g.
//!    `JABLE_CONSOLIDATE__MAKE_FIXED=false`)
//! 2. Configuration file (`jable.toml`)
//! 3. Default values

use crate::consolidate::{ConsolidateOptions, Threshold};
use crate::persistence::LoadOptions;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to parse configuration file.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue {
        /// Configuration key that failed validation.
        key: String,
        /// Validation error message.
        message: String,
    },
}

/// Consolidation defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsolidateConfig {
    /// Fraction of the row count (float) or absolute count (integer).
    pub threshold: Threshold,
    /// Turn single-valued raw columns into constants.
    pub make_fixed: bool,
    /// Decode encoded columns whose dictionary reached the threshold.
    pub unindex: bool,
}

impl Default for ConsolidateConfig {
    fn default() -> Self {
        let options = ConsolidateOptions::default();
        Self {
            threshold: options.threshold,
            make_fixed: options.make_fixed,
            unindex: options.unindex,
        }
    }
}

impl From<&ConsolidateConfig> for ConsolidateOptions {
    fn from(config: &ConsolidateConfig) -> Self {
        Self {
            threshold: config.threshold,
            make_fixed: config.make_fixed,
            unindex: config.unindex,
        }
    }
}

/// File persistence defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Reject files with missing or unrecognized sections.
    pub strict: bool,
    /// Rewrite files that were missing sections after loading them.
    pub update: bool,
    /// Indent written files.
    pub pretty: bool,
}

impl From<&PersistenceConfig> for LoadOptions {
    fn from(config: &PersistenceConfig) -> Self {
        Self {
            strict: config.strict,
            update: config.update,
        }
    }
}

/// Row append defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppendConfig {
    /// Require complete, consistent rows on append.
    pub strict: bool,
}

impl Default for AppendConfig {
    fn default() -> Self {
        Self { strict: true }
    }
}

/// Main `Jable` configuration structure.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JableConfig {
    /// Consolidation configuration.
    pub consolidate: ConsolidateConfig,
    /// Persistence configuration.
    pub persistence: PersistenceConfig,
    /// Append configuration.
    pub append: AppendConfig,
}

impl JableConfig {
    /// Loads configuration from default sources.
    ///
    /// Priority: defaults < file < environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration parsing fails.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("jable.toml")
    }

    /// Loads configuration from a specific file path.
    ///
    /// A missing file contributes nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration parsing fails.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("JABLE_").split("__"));

        figment
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Creates a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::string(toml_str));

        figment
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Threshold::Fraction(fraction) = self.consolidate.threshold {
            if !fraction.is_finite() || fraction < 0.0 {
                return Err(ConfigError::InvalidValue {
                    key: "consolidate.threshold".to_string(),
                    message: format!("fraction {fraction} must be finite and >= 0"),
                });
            }
        }

        if self.persistence.strict && self.persistence.update {
            return Err(ConfigError::InvalidValue {
                key: "persistence.update".to_string(),
                message: "strict loading never completes files; disable one of them".to_string(),
            });
        }

        Ok(())
    }

    /// Consolidation options from this configuration.
    #[must_use]
    pub fn consolidate_options(&self) -> ConsolidateOptions {
        (&self.consolidate).into()
    }

    /// File loading options from this configuration.
    #[must_use]
    pub fn load_options(&self) -> LoadOptions {
        (&self.persistence).into()
    }

    /// Whether appends are strict by default.
    #[must_use]
    pub fn strict_append(&self) -> bool {
        self.append.strict
    }

    /// Serializes the configuration to TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}
