//! Configuration file handling.
//!
//! Loads and saves cveintel configuration from a TOML file at:
//! - Linux: `~/.config/cveintel/config.toml`
//! - macOS: `~/Library/Application Support/cveintel/config.toml`
//! - Windows: `%APPDATA%\cveintel\config.toml`
//!
//! # Example Configuration
//!
//! ```toml
//! cache_ttl_hours = 24
//! results_per_page = 100
//! default_keyword = "Oracle"
//! default_months = 6
//! default_format = "table"
//! # nvd_api_key = "..."
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Application configuration.
///
/// A missing config file yields defaults; the `NVD_API_KEY` environment
/// variable overrides the file's API key either way.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// NVD API key for the higher rate allowance. Optional; without one
    /// the client is limited to one request every 6 seconds.
    pub nvd_api_key: Option<String>,

    /// How long to cache upstream responses, in hours.
    ///
    /// Default: 24 hours
    pub cache_ttl_hours: u64,

    /// Page size for NVD date-range searches.
    ///
    /// Default: 100
    pub results_per_page: u32,

    /// Keyword used by analytics when none is given.
    ///
    /// Default: "Oracle"
    pub default_keyword: String,

    /// Lookback window in months used by analytics when none is given.
    ///
    /// Default: 6
    pub default_months: u32,

    /// Default output format when no `--format` flag is provided.
    ///
    /// Valid values: "table", "json"
    /// Default: "table"
    pub default_format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            nvd_api_key: None,
            cache_ttl_hours: 24,
            results_per_page: 100,
            default_keyword: "Oracle".to_string(),
            default_months: 6,
            default_format: "table".to_string(),
        }
    }
}

impl Config {
    /// Loads configuration from the config file, falling back to defaults
    /// when the file doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or
    /// parsed.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Saves the configuration, creating the parent directory if needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Returns the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cveintel")
            .join("config.toml")
    }

    /// The effective NVD API key: `NVD_API_KEY` env var first, then the
    /// config file. Empty values count as absent.
    pub fn nvd_api_key(&self) -> Option<String> {
        std::env::var("NVD_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .or_else(|| self.nvd_api_key.clone().filter(|k| !k.is_empty()))
    }

    /// Generates a string containing the default configuration, for
    /// showing users what the default config looks like.
    pub fn generate_default_config() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.cache_ttl_hours, 24);
        assert_eq!(config.results_per_page, 100);
        assert_eq!(config.default_keyword, "Oracle");
        assert_eq!(config.default_months, 6);
        assert_eq!(config.default_format, "table");
        assert!(config.nvd_api_key.is_none());
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: Config = toml::from_str("default_months = 12").unwrap();
        assert_eq!(config.default_months, 12);
        assert_eq!(config.cache_ttl_hours, 24);
    }

    #[test]
    fn round_trips_through_toml() {
        let mut config = Config::default();
        config.nvd_api_key = Some("key".to_string());
        config.results_per_page = 50;

        let text = toml::to_string_pretty(&config).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.results_per_page, 50);
        assert_eq!(back.nvd_api_key.as_deref(), Some("key"));
    }

    #[test]
    fn empty_configured_key_counts_as_absent() {
        let config = Config {
            nvd_api_key: Some(String::new()),
            ..Config::default()
        };
        if std::env::var("NVD_API_KEY").is_err() {
            assert!(config.nvd_api_key().is_none());
        }
    }
}
