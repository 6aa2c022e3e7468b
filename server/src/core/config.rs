use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::data::types::ParameterDefaults;
use crate::domain::StoreConfig;
use crate::domain::values::MAX_SERIES_LIMIT;
use crate::utils::file::expand_path;

use super::cli::CliConfig;
use super::constants::{
    APP_DOT_FOLDER, CONFIG_FILE_NAME, DEFAULT_HOST, DEFAULT_MAX_LIFETIME_DAYS,
    DEFAULT_MAX_NUM_ENTRIES, DEFAULT_PORT, DEFAULT_SERIES_LIMIT,
};

// =============================================================================
// File Config Structs (JSON deserialization)
// =============================================================================

/// Server configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ServerFileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Retention metadata defaults for new parameters
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RetentionFileConfig {
    pub max_lifetime_days: Option<i64>,
    pub max_num_entries: Option<i64>,
}

/// Series read configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct SeriesFileConfig {
    pub limit: Option<usize>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub server: Option<ServerFileConfig>,
    pub retention: Option<RetentionFileConfig>,
    pub series: Option<SeriesFileConfig>,
    pub debug: Option<bool>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        if let Some(server) = other.server {
            let current = self.server.get_or_insert_with(ServerFileConfig::default);
            if server.host.is_some() {
                tracing::trace!(host = ?server.host, "Merging server.host");
                current.host = server.host;
            }
            if server.port.is_some() {
                tracing::trace!(port = ?server.port, "Merging server.port");
                current.port = server.port;
            }
        }

        if let Some(retention) = other.retention {
            let current = self
                .retention
                .get_or_insert_with(RetentionFileConfig::default);
            if retention.max_lifetime_days.is_some() {
                tracing::trace!(
                    max_lifetime_days = ?retention.max_lifetime_days,
                    "Merging retention.max_lifetime_days"
                );
                current.max_lifetime_days = retention.max_lifetime_days;
            }
            if retention.max_num_entries.is_some() {
                tracing::trace!(
                    max_num_entries = ?retention.max_num_entries,
                    "Merging retention.max_num_entries"
                );
                current.max_num_entries = retention.max_num_entries;
            }
        }

        if let Some(series) = other.series {
            let current = self.series.get_or_insert_with(SeriesFileConfig::default);
            if series.limit.is_some() {
                tracing::trace!(limit = ?series.limit, "Merging series.limit");
                current.limit = series.limit;
            }
        }

        if other.debug.is_some() {
            self.debug = other.debug;
        }
    }
}

// =============================================================================
// Runtime Config Structs (final merged configuration)
// =============================================================================

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Retention metadata stamped on newly created parameters
#[derive(Debug, Clone)]
pub struct RetentionConfig {
    pub max_lifetime_days: i64,
    pub max_num_entries: i64,
}

/// Series read configuration
#[derive(Debug, Clone)]
pub struct SeriesConfig {
    pub limit: usize,
}

/// Final merged application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub retention: RetentionConfig,
    pub series: SeriesConfig,
    pub debug: bool,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.statline/statline.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        // 1. Load from profile dir (~/.statline/statline.json) - skip if not exists
        if let Some(profile_path) = get_profile_config_path()
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(&profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        // 2. Load from CLI-specified path OR local directory
        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_path(&path.to_string_lossy());
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        let config = Self::layer(cli, file_config);
        config.validate()?;

        tracing::debug!(
            host = %config.server.host,
            port = config.server.port,
            series_limit = config.series.limit,
            debug = config.debug,
            "Configuration loaded"
        );

        Ok(config)
    }

    /// Layer configs: defaults -> file config -> CLI/env overrides
    fn layer(cli: &CliConfig, file_config: FileConfig) -> Self {
        let file_server = file_config.server.unwrap_or_default();
        let file_retention = file_config.retention.unwrap_or_default();
        let file_series = file_config.series.unwrap_or_default();

        let host = cli
            .host
            .clone()
            .or(file_server.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = cli.port.or(file_server.port).unwrap_or(DEFAULT_PORT);

        let retention = RetentionConfig {
            max_lifetime_days: cli
                .max_lifetime_days
                .or(file_retention.max_lifetime_days)
                .unwrap_or(DEFAULT_MAX_LIFETIME_DAYS),
            max_num_entries: cli
                .max_num_entries
                .or(file_retention.max_num_entries)
                .unwrap_or(DEFAULT_MAX_NUM_ENTRIES),
        };

        let series = SeriesConfig {
            limit: cli
                .series_limit
                .or(file_series.limit)
                .unwrap_or(DEFAULT_SERIES_LIMIT),
        };

        // debug: CLI flag enables, otherwise file config
        let debug = cli.debug || file_config.debug.unwrap_or(false);

        Self {
            server: ServerConfig { host, port },
            retention,
            series,
            debug,
        }
    }

    /// Validate the configuration for consistency and correctness
    fn validate(&self) -> Result<()> {
        if self.server.host.is_empty() {
            anyhow::bail!("Configuration error: server.host must not be empty");
        }

        // Port 0 would bind a random port
        if self.server.port == 0 {
            anyhow::bail!("Configuration error: server.port must be greater than 0");
        }

        if self.retention.max_lifetime_days < 0 {
            anyhow::bail!("Configuration error: retention.max_lifetime_days must not be negative");
        }
        if self.retention.max_num_entries < 0 {
            anyhow::bail!("Configuration error: retention.max_num_entries must not be negative");
        }

        if !(1..=MAX_SERIES_LIMIT).contains(&self.series.limit) {
            anyhow::bail!(
                "Configuration error: series.limit must be between 1 and {}",
                MAX_SERIES_LIMIT
            );
        }

        if is_all_interfaces(&self.server.host) {
            tracing::warn!(
                host = %self.server.host,
                "Binding to all interfaces; the API has no authentication"
            );
        }

        Ok(())
    }

    /// Settings handed to the metric store
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            defaults: ParameterDefaults {
                max_lifetime_days: self.retention.max_lifetime_days,
                max_num_entries: self.retention.max_num_entries,
            },
            series_limit: self.series.limit,
        }
    }
}

/// Get the profile config path (~/.statline/statline.json)
fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}

/// Check if host binds to all network interfaces
pub fn is_all_interfaces(host: &str) -> bool {
    matches!(host, "0.0.0.0" | "::" | "[::]")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_config_parse_full() {
        let json = r#"{
            "server": { "host": "0.0.0.0", "port": 8080 },
            "retention": { "max_lifetime_days": 30, "max_num_entries": 1000 },
            "series": { "limit": 500 },
            "debug": true
        }"#;
        let config: FileConfig = serde_json::from_str(json).unwrap();

        let server = config.server.as_ref().unwrap();
        assert_eq!(server.host, Some("0.0.0.0".to_string()));
        assert_eq!(server.port, Some(8080));
        let retention = config.retention.as_ref().unwrap();
        assert_eq!(retention.max_lifetime_days, Some(30));
        assert_eq!(retention.max_num_entries, Some(1000));
        assert_eq!(config.series.as_ref().unwrap().limit, Some(500));
        assert_eq!(config.debug, Some(true));
    }

    #[test]
    fn test_file_config_parse_empty() {
        let config: FileConfig = serde_json::from_str("{}").unwrap();
        assert!(config.server.is_none());
        assert!(config.retention.is_none());
        assert!(config.series.is_none());
    }

    #[test]
    fn test_file_config_parse_extra_fields() {
        let json = r#"{ "server": { "host": "localhost" }, "unknown_field": 123 }"#;
        let config: FileConfig = serde_json::from_str(json).unwrap();

        assert_eq!(
            config.server.as_ref().unwrap().host,
            Some("localhost".to_string())
        );
        assert_eq!(config.extra.get("unknown_field").unwrap(), 123);
    }

    #[test]
    fn test_file_config_merge() {
        let mut base = FileConfig {
            server: Some(ServerFileConfig {
                host: Some("base.host".to_string()),
                port: Some(1000),
            }),
            retention: Some(RetentionFileConfig {
                max_lifetime_days: Some(7),
                max_num_entries: None,
            }),
            ..Default::default()
        };
        let overlay = FileConfig {
            server: Some(ServerFileConfig {
                host: None,
                port: Some(2000),
            }),
            retention: Some(RetentionFileConfig {
                max_lifetime_days: None,
                max_num_entries: Some(10),
            }),
            series: Some(SeriesFileConfig { limit: Some(20) }),
            ..Default::default()
        };

        base.merge(overlay);

        let server = base.server.unwrap();
        assert_eq!(server.host, Some("base.host".to_string()));
        assert_eq!(server.port, Some(2000));
        let retention = base.retention.unwrap();
        assert_eq!(retention.max_lifetime_days, Some(7));
        assert_eq!(retention.max_num_entries, Some(10));
        assert_eq!(base.series.unwrap().limit, Some(20));
    }

    #[test]
    fn test_app_config_defaults() {
        let config = AppConfig::layer(&CliConfig::default(), FileConfig::default());
        config.validate().unwrap();

        assert_eq!(config.server.host, DEFAULT_HOST);
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert_eq!(config.retention.max_lifetime_days, 0);
        assert_eq!(config.retention.max_num_entries, 15_000_000);
        assert_eq!(config.series.limit, 1000);
        assert!(!config.debug);
    }

    #[test]
    fn test_app_config_cli_overrides_file() {
        let file: FileConfig = serde_json::from_str(
            r#"{ "server": { "host": "file.host", "port": 4000 }, "series": { "limit": 10 } }"#,
        )
        .unwrap();
        let cli = CliConfig {
            port: Some(3000),
            series_limit: Some(99),
            max_num_entries: Some(5),
            debug: true,
            ..Default::default()
        };

        let config = AppConfig::layer(&cli, file);
        assert_eq!(config.server.host, "file.host");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.series.limit, 99);
        assert_eq!(config.retention.max_num_entries, 5);
        assert!(config.debug);

        let store = config.store_config();
        assert_eq!(store.series_limit, 99);
        assert_eq!(store.defaults.max_num_entries, 5);
    }

    #[test]
    fn test_app_config_validation() {
        let mut config = AppConfig::layer(&CliConfig::default(), FileConfig::default());
        config.server.port = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::layer(&CliConfig::default(), FileConfig::default());
        config.server.host = String::new();
        assert!(config.validate().is_err());

        let mut config = AppConfig::layer(&CliConfig::default(), FileConfig::default());
        config.series.limit = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::layer(&CliConfig::default(), FileConfig::default());
        config.retention.max_num_entries = -1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_config_path_fails() {
        let cli = CliConfig {
            config: Some(PathBuf::from("/nonexistent/statline.json")),
            ..Default::default()
        };
        assert!(AppConfig::load(&cli).is_err());
    }

    #[test]
    fn test_load_explicit_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.json");
        fs::write(&path, r#"{ "server": { "port": 7777 }, "typo": 1 }"#).unwrap();

        let cli = CliConfig {
            config: Some(path),
            ..Default::default()
        };
        let config = AppConfig::load(&cli).unwrap();
        assert_eq!(config.server.port, 7777);
    }

    #[test]
    fn test_is_all_interfaces() {
        assert!(is_all_interfaces("0.0.0.0"));
        assert!(is_all_interfaces("::"));
        assert!(!is_all_interfaces("127.0.0.1"));
    }
}
