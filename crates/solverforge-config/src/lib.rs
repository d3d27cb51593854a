//! Configuration system for SolverForge constraint sessions.
//!
//! Load constraint configuration from TOML or YAML to override the default
//! constraint package, swap constraint weights and pick how much detail score
//! analyses fetch, without code changes.
//!
//! # Examples
//!
//! Load configuration from a TOML string:
//!
//! ```
//! use solverforge_config::{ConstraintConfig, FetchPolicy};
//!
//! let config = ConstraintConfig::from_toml_str(r#"
//!     package = "org.acme.schedule"
//!
//!     [weights]
//!     "Overlapping shifts" = "2hard/0soft"
//!     "org.acme.schedule/Undesired day" = "0hard/5soft"
//!
//!     [analysis]
//!     fetch_policy = "fetch_match_count"
//! "#).unwrap();
//!
//! assert_eq!(config.package.as_deref(), Some("org.acme.schedule"));
//! assert_eq!(config.weights.len(), 2);
//! assert_eq!(config.analysis.fetch_policy, FetchPolicy::FetchMatchCount);
//! ```
//!
//! Use the default config when the file is missing:
//!
//! ```
//! use solverforge_config::ConstraintConfig;
//!
//! let config = ConstraintConfig::load("constraints.toml").unwrap_or_default();
//! assert!(config.weights.is_empty());
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;


/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Configuration of a constraint session.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ConstraintConfig {
    /// Package given to constraints that do not name one.
    #[serde(default)]
    pub package: Option<String>,

    /// Environment mode affecting self-checks.
    #[serde(default)]
    pub environment_mode: EnvironmentMode,

    /// Weight overrides keyed by constraint id (`package/name`) or bare name.
    ///
    /// Values use the score's text form, e.g. `"1hard/0soft"`.
    #[serde(default)]
    pub weights: BTreeMap<String, String>,

    /// Score analysis configuration.
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

impl ConstraintConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file doesn't exist or contains invalid TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_file(path)
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the default constraint package.
    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    /// Overrides the weight of one constraint.
    pub fn with_weight(mut self, constraint: impl Into<String>, weight: impl Into<String>) -> Self {
        self.weights.insert(constraint.into(), weight.into());
        self
    }

    /// Sets the environment mode.
    pub fn with_environment_mode(mut self, mode: EnvironmentMode) -> Self {
        self.environment_mode = mode;
        self
    }

    /// Sets the analysis fetch policy.
    pub fn with_fetch_policy(mut self, policy: FetchPolicy) -> Self {
        self.analysis.fetch_policy = policy;
        self
    }

    /// Returns the weight text configured for a constraint.
    ///
    /// An entry keyed by the full id wins over one keyed by the bare name.
    pub fn weight_for(&self, package: &str, name: &str) -> Option<&str> {
        let id = if package.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", package, name)
        };
        self.weights
            .get(&id)
            .or_else(|| self.weights.get(name))
            .map(String::as_str)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(package) = &self.package {
            if package.trim().is_empty() {
                return Err(ConfigError::Invalid("package must not be blank".into()));
            }
        }
        if let Some((key, _)) = self.weights.iter().find(|(_, w)| w.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "weight for constraint '{}' is empty",
                key
            )));
        }
        Ok(())
    }
}

/// Environment mode affecting session self-checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvironmentMode {
    /// Incremental scores are trusted.
    #[default]
    NonReproducible,

    /// Every mutation is followed by a from-scratch score comparison.
    FullAssert,
}

impl EnvironmentMode {
    /// Whether sessions re-derive the score after each mutation.
    pub fn is_asserted(&self) -> bool {
        matches!(self, EnvironmentMode::FullAssert)
    }
}

/// Score analysis configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct AnalysisConfig {
    /// How much per-match detail an analysis carries.
    #[serde(default)]
    pub fetch_policy: FetchPolicy,
}

/// How much detail a score analysis fetches per constraint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchPolicy {
    /// Every match with its justification.
    #[default]
    FetchAll,

    /// Only the number of matches.
    FetchMatchCount,

    /// Neither matches nor their count.
    FetchShallow,
}
