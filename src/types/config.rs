//! Configuration for testflux.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::TestfluxResult;

/// Main configuration for testflux.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Rule source resolution settings.
    #[serde(default)]
    pub rules: RulesConfig,

    /// Knowledge base injection settings.
    #[serde(default)]
    pub injection: InjectionConfig,
}

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format (text, json).
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Timeout for a single knowledge base build (in seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_timeout() -> u64 {
    60
}

/// Rule source resolution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    /// Base directory used when a test class declares no override,
    /// relative to the run root.
    #[serde(default = "default_base_directory")]
    pub base_directory: PathBuf,

    /// Extension of rule source files picked up from declared directories.
    #[serde(default = "default_extension")]
    pub extension: String,

    /// What to do with a descriptor that names both a directory and a file.
    #[serde(default)]
    pub conflict_policy: ConflictPolicy,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            base_directory: default_base_directory(),
            extension: default_extension(),
            conflict_policy: ConflictPolicy::default(),
        }
    }
}

fn default_base_directory() -> PathBuf {
    ["src", "main", "rules"].iter().collect()
}

fn default_extension() -> String {
    "drl".to_string()
}

/// Handling of a rule source naming both a directory and a file.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Fail the build with a configuration error.
    #[default]
    Reject,
    /// Log a warning and ignore the descriptor.
    Skip,
}

/// Knowledge base injection settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InjectionConfig {
    /// Which slots are eligible for injection.
    #[serde(default)]
    pub policy: EligibilityPolicy,
}

/// Slot eligibility policy.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EligibilityPolicy {
    /// Only slots carrying the inject marker, minus opted-out ones.
    #[default]
    OptIn,
    /// Every compatible slot unless it opted out.
    OptOutOnly,
}

impl Config {
    /// Loads configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> TestfluxResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Saves configuration to a TOML file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> TestfluxResult<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Creates default configuration.
    pub fn default_config() -> Self {
        Self {
            general: GeneralConfig::default(),
            rules: RulesConfig::default(),
            injection: InjectionConfig::default(),
        }
    }

    /// Tries to load configuration from current directory or uses default.
    pub fn load_or_default() -> Self {
        Self::load("testflux.toml").unwrap_or_else(|_| Self::default_config())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default_config();

        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.timeout_secs, 60);
        assert_eq!(config.rules.base_directory, Path::new("src/main/rules"));
        assert_eq!(config.rules.extension, "drl");
        assert_eq!(config.rules.conflict_policy, ConflictPolicy::Reject);
        assert_eq!(config.injection.policy, EligibilityPolicy::OptIn);
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let config: Config = toml::from_str(
            r#"
            [rules]
            extension = "rule"
            conflict_policy = "skip"

            [injection]
            policy = "opt_out_only"
            "#,
        )
        .unwrap();

        assert_eq!(config.rules.extension, "rule");
        assert_eq!(config.rules.conflict_policy, ConflictPolicy::Skip);
        assert_eq!(config.rules.base_directory, Path::new("src/main/rules"));
        assert_eq!(config.injection.policy, EligibilityPolicy::OptOutOnly);
        assert_eq!(config.general.log_format, "text");
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("testflux.toml");

        let mut config = Config::default_config();
        config.general.timeout_secs = 5;
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.general.timeout_secs, 5);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = Config::load("/definitely/not/here/testflux.toml").unwrap_err();
        assert!(matches!(err, crate::TestfluxError::Io(_)));
    }
}
