//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/jobscout/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/jobscout/` (~/.config/jobscout/)
//! - Data: `$XDG_DATA_HOME/jobscout/` (~/.local/share/jobscout/)
//! - State/Logs: `$XDG_STATE_HOME/jobscout/` (~/.local/state/jobscout/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Ingestion cadence
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// HTTP fetch settings shared by all sources
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Read-side settings
    #[serde(default)]
    pub store: StoreConfig,

    /// Source selection and custom sources
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Scheduler configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SchedulerConfig {
    /// Hours between ingestion runs
    #[serde(default = "default_interval_hours")]
    pub interval_hours: u64,

    /// How often the scheduler checks whether a run is due
    #[serde(default = "default_poll_secs")]
    pub poll_secs: u64,

    /// Run once immediately when the scheduler starts
    #[serde(default = "default_true")]
    pub run_at_startup: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_hours: default_interval_hours(),
            poll_secs: default_poll_secs(),
            run_at_startup: true,
        }
    }
}

impl SchedulerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_hours.saturating_mul(60 * 60))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_secs)
    }
}

/// Longest accepted ingestion interval (one year).
pub const MAX_INTERVAL_HOURS: u64 = 24 * 365;

fn default_interval_hours() -> u64 {
    6
}

fn default_poll_secs() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

/// HTTP fetch configuration
#[derive(Debug, Deserialize, Clone)]
pub struct FetchConfig {
    /// Per-request timeout in seconds
    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,

    /// User-Agent header sent to every source
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_fetch_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_fetch_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string()
}

/// Store/read-side configuration
#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    /// Number of listings returned to readers
    #[serde(default = "default_listing_limit")]
    pub listing_limit: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            listing_limit: default_listing_limit(),
        }
    }
}

fn default_listing_limit() -> usize {
    50
}

/// Which sources to fetch
#[derive(Debug, Deserialize, Default, Clone)]
pub struct SourcesConfig {
    /// Names of built-in sources to skip (case-insensitive)
    #[serde(default)]
    pub disabled: Vec<String>,

    /// Additional HTML sources
    #[serde(default)]
    pub custom: Vec<CustomSourceConfig>,
}

impl SourcesConfig {
    pub fn is_disabled(&self, name: &str) -> bool {
        self.disabled.iter().any(|d| d.eq_ignore_ascii_case(name))
    }
}

/// A user-defined HTML listing page, described by CSS selectors.
#[derive(Debug, Deserialize, Clone)]
pub struct CustomSourceConfig {
    pub name: String,
    /// Page to fetch
    pub url: String,
    /// Base for resolving relative links (defaults to `url`)
    pub base_url: Option<String>,
    pub card_selector: String,
    pub title_selector: String,
    pub company_selector: Option<String>,
    pub date_selector: Option<String>,
    #[serde(default = "default_link_selector")]
    pub link_selector: String,
    /// Location assumed when a card has none
    pub default_location: Option<String>,
}

fn default_link_selector() -> String {
    "a".to_string()
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values that would stall the scheduler or make every fetch fail.
    pub fn validate(&self) -> Result<()> {
        if self.scheduler.interval_hours == 0 {
            return Err(Error::Config(
                "scheduler.interval_hours must be at least 1".to_string(),
            ));
        }
        if self.scheduler.interval_hours > MAX_INTERVAL_HOURS {
            return Err(Error::Config(format!(
                "scheduler.interval_hours must be at most {}",
                MAX_INTERVAL_HOURS
            )));
        }
        if self.scheduler.poll_secs == 0 {
            return Err(Error::Config(
                "scheduler.poll_secs must be at least 1".to_string(),
            ));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(Error::Config(
                "fetch.timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.store.listing_limit == 0 {
            return Err(Error::Config(
                "store.listing_limit must be at least 1".to_string(),
            ));
        }
        for custom in &self.sources.custom {
            if custom.name.trim().is_empty() {
                return Err(Error::Config(
                    "sources.custom entries need a name".to_string(),
                ));
            }
            if custom.card_selector.trim().is_empty() || custom.title_selector.trim().is_empty()
            {
                return Err(Error::Config(format!(
                    "source {} needs card_selector and title_selector",
                    custom.name
                )));
            }
            for (field, value) in [("url", Some(&custom.url)), ("base_url", custom.base_url.as_ref())] {
                if let Some(value) = value {
                    Url::parse(value).map_err(|e| {
                        Error::Config(format!(
                            "source {} has an invalid {} {:?}: {}",
                            custom.name, field, value, e
                        ))
                    })?;
                }
            }
        }
        Ok(())
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/jobscout/config.toml` (~/.config/jobscout/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("jobscout").join("config.toml")
    }

    /// Returns the data directory path (for SQLite database)
    ///
    /// `$XDG_DATA_HOME/jobscout/` (~/.local/share/jobscout/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("jobscout")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/jobscout/` (~/.local/state/jobscout/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("jobscout")
    }

    /// Returns the database file path
    ///
    /// `$XDG_DATA_HOME/jobscout/jobs.db` (~/.local/share/jobscout/jobs.db)
    pub fn database_path() -> PathBuf {
        Self::data_dir().join("jobs.db")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.scheduler.interval_hours, 6);
        assert_eq!(config.scheduler.poll_secs, 60);
        assert!(config.scheduler.run_at_startup);
        assert_eq!(config.fetch.timeout(), Duration::from_secs(10));
        assert_eq!(config.store.listing_limit, 50);
        assert!(config.sources.custom.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[scheduler]
interval_hours = 2
poll_secs = 30

[fetch]
timeout_secs = 5

[sources]
disabled = ["indeed"]

[[sources.custom]]
name = "RemoteOK"
url = "https://remoteok.example/jobs"
card_selector = "tr.job"
title_selector = "h2"
company_selector = "h3"

[logging]
level = "debug"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.scheduler.interval(), Duration::from_secs(2 * 3600));
        assert_eq!(config.scheduler.poll_interval(), Duration::from_secs(30));
        assert_eq!(config.fetch.timeout_secs, 5);
        assert!(config.sources.is_disabled("Indeed"));
        assert!(!config.sources.is_disabled("WeWorkRemotely"));
        assert_eq!(config.sources.custom.len(), 1);
        assert_eq!(config.sources.custom[0].link_selector, "a");
        assert!(config.sources.custom[0].date_selector.is_none());
        assert_eq!(config.logging.level, "debug");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_zero_values() {
        let config: Config = toml::from_str("[scheduler]\ninterval_hours = 0\n").unwrap();
        assert!(config.validate().is_err());

        let config: Config = toml::from_str("[fetch]\ntimeout_secs = 0\n").unwrap();
        assert!(config.validate().is_err());

        let config: Config = toml::from_str("[store]\nlisting_limit = 0\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_incomplete_custom_source() {
        let toml = r#"
[[sources.custom]]
name = "Broken"
url = "https://example.com"
card_selector = ""
title_selector = "h2"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_oversized_interval() {
        let config: Config =
            toml::from_str("[scheduler]\ninterval_hours = 9223372036854775807\n").unwrap();
        assert!(config.validate().is_err());
        assert_eq!(config.scheduler.interval(), Duration::from_secs(u64::MAX));

        let config: Config = toml::from_str("[scheduler]\ninterval_hours = 8760\n").unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_custom_source_with_bad_url() {
        let relative = r#"
[[sources.custom]]
name = "Board"
url = "board.example/jobs"
card_selector = "article"
title_selector = "h2"
"#;
        let config: Config = toml::from_str(relative).unwrap();
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("Board"), "got: {err}");
        assert!(err.contains("url"), "got: {err}");

        let bad_base = r#"
[[sources.custom]]
name = "Board"
url = "https://board.example/jobs"
base_url = "not a url"
card_selector = "article"
title_selector = "h2"
"#;
        let config: Config = toml::from_str(bad_base).unwrap();
        assert!(config.validate().unwrap_err().to_string().contains("base_url"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[store]\nlisting_limit = 20\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.store.listing_limit, 20);

        std::fs::write(&path, "[store\n").unwrap();
        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));
    }
}
