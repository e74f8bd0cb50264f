//! src/config.rs
//! ============================================================================
//! # Config: Console Configuration Loader and Saver
//!
//! User-editable settings for the migration console, stored as TOML in the
//! platform config directory resolved by the
//! [`directories`](https://docs.rs/directories) crate.
//!
//! ## Features
//! - XDG-compliant config discovery and writing (Linux, macOS, Windows)
//! - Defaults written out on first run
//! - Async load/save for smooth integration with Tokio
//! - `VMCONSOLE_API_URL` overrides the agent base URL
//!
//! ## Example
//! ```rust,ignore
//! let config = Config::load().await?;
//! config.save().await?;
//! ```

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

use tokio::fs as TokioFs;

use crate::AppError;

pub const API_URL_ENV: &str = "VMCONSOLE_API_URL";

/// Discovery agent REST endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL including the API prefix, e.g. `http://localhost:8000/api/v1`
    pub base_url: String,

    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,

    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Agents commonly run with self-signed certificates
    pub accept_invalid_certs: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api/v1".to_string(),
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(30),
            accept_invalid_certs: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Interval between collector status polls
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
        }
    }
}

/// VM table pagination settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    pub page_size: usize,

    pub page_size_options: Vec<usize>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            page_size_options: vec![10, 20, 50, 100],
        }
    }
}

impl TableConfig {
    /// Next page-size option after `current`, wrapping around.
    pub fn next_page_size(&self, current: usize) -> usize {
        let pos = self
            .page_size_options
            .iter()
            .position(|&size| size == current);
        match pos {
            Some(i) => self.page_size_options[(i + 1) % self.page_size_options.len()],
            None => self.page_size,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    pub level: String,

    /// Log directory; relative paths resolve against the working directory
    pub log_dir: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: PathBuf::from("logs"),
        }
    }
}

/// Main configuration struct for the application.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub collector: CollectorConfig,

    #[serde(default)]
    pub table: TableConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Loads config from TOML file at the XDG-compliant app config dir, or returns defaults.
    ///
    /// The config is expected at `$XDG_CONFIG_HOME/vmconsole/config.toml`
    /// (Linux), or equivalent on Windows/macOS.
    pub async fn load() -> anyhow::Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            info!("Loading config from {}", path.display());
            let text = TokioFs::read_to_string(&path)
                .await
                .map_err(|source| AppError::ConfigIo {
                    path: path.clone(),
                    source,
                })?;
            Self::from_toml_str(&text)?
        } else {
            info!(
                "No config file found at {}, using default configuration. Creating it now.",
                path.display()
            );

            let default_config = Self::default();
            default_config.save().await?;
            default_config
        };

        config.apply_env_overrides(std::env::var(API_URL_ENV).ok());
        config.validate()?;
        Ok(config)
    }

    /// Saves config to TOML file at the XDG-compliant app config dir.
    pub async fn save(&self) -> anyhow::Result<()> {
        let path = Self::config_path()?;

        info!("Saving config to {}", path.display());

        if let Some(parent) = path.parent() {
            TokioFs::create_dir_all(parent).await?;
        }

        let toml_str = toml::to_string_pretty(self).map_err(AppError::from)?;
        TokioFs::write(&path, toml_str).await?;

        Ok(())
    }

    pub fn from_toml_str(text: &str) -> Result<Self, AppError> {
        Ok(toml::from_str(text)?)
    }

    pub fn apply_env_overrides(&mut self, api_url: Option<String>) {
        if let Some(url) = api_url.filter(|url| !url.trim().is_empty()) {
            warn!(
                marker = "CONFIG",
                env = API_URL_ENV,
                base_url = %url,
                "Overriding agent base URL from environment"
            );
            self.api.base_url = url;
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        let table = &self.table;
        if table.page_size_options.is_empty() {
            return Err(AppError::InvalidConfig(
                "table.page_size_options must not be empty".into(),
            ));
        }
        if table.page_size_options.contains(&0) {
            return Err(AppError::InvalidConfig(
                "table.page_size_options must be positive".into(),
            ));
        }
        if !table.page_size_options.contains(&table.page_size) {
            return Err(AppError::InvalidConfig(format!(
                "table.page_size {} is not one of {:?}",
                table.page_size, table.page_size_options
            )));
        }
        if self.collector.poll_interval.is_zero() {
            return Err(AppError::InvalidConfig(
                "collector.poll_interval must be positive".into(),
            ));
        }
        url::Url::parse(&self.api.base_url)
            .map_err(|e| AppError::InvalidConfig(format!("api.base_url: {e}")))?;
        Ok(())
    }

    /// Returns the canonical config file path using `directories::ProjectDirs`.
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the config directory (without filename).
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "kubev2v", "vmconsole")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory."))?;
        Ok(proj_dirs.config_dir().to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.collector.poll_interval, Duration::from_secs(2));
        assert_eq!(config.table.page_size, 20);
    }

    #[test]
    fn parses_partial_toml_with_humantime() {
        let config = Config::from_toml_str(
            r#"
            [collector]
            poll_interval = "500ms"

            [table]
            page_size = 50
            page_size_options = [25, 50]
            "#,
        )
        .unwrap();

        assert_eq!(config.collector.poll_interval, Duration::from_millis(500));
        assert_eq!(config.table.page_size, 50);
        assert_eq!(config.api.base_url, "http://localhost:8000/api/v1");
        config.validate().unwrap();
    }

    #[test]
    fn rejects_page_size_outside_options() {
        let mut config = Config::default();
        config.table.page_size = 7;
        assert!(matches!(config.validate(), Err(AppError::InvalidConfig(_))));

        config.table.page_size_options.clear();
        assert!(matches!(config.validate(), Err(AppError::InvalidConfig(_))));
    }

    #[test]
    fn env_override_replaces_base_url() {
        let mut config = Config::default();
        config.apply_env_overrides(Some("https://agent.lab:3443/api/v1".into()));
        assert_eq!(config.api.base_url, "https://agent.lab:3443/api/v1");

        config.apply_env_overrides(Some("  ".into()));
        assert_eq!(config.api.base_url, "https://agent.lab:3443/api/v1");
    }

    #[test]
    fn page_size_cycles_through_options() {
        let table = TableConfig::default();
        assert_eq!(table.next_page_size(20), 50);
        assert_eq!(table.next_page_size(100), 10);
        assert_eq!(table.next_page_size(3), 20);
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        assert!(matches!(
            Config::from_toml_str("[table]\npage_size = \"many\""),
            Err(AppError::Config(_))
        ));
    }
}
