//! Dashboard configuration as operator-tunable TOML values.
//!
//! Every section implements `Default` with the values in [`super::defaults`],
//! so an absent file or section behaves exactly like the built-in setup.

use super::defaults;
use crate::synthetic::SyntheticSpec;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "SENSOR_EXPLORER_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "sensor_explorer.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration.
///
/// Load with `DashboardConfig::load()` which searches:
/// 1. `$SENSOR_EXPLORER_CONFIG`
/// 2. `./sensor_explorer.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub dataset: DatasetConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub view: ViewConfig,

    #[serde(default)]
    pub export: ExportConfig,

    #[serde(default)]
    pub demo: DemoConfig,
}

impl DashboardConfig {
    /// Load configuration using the standard search order. A file that fails
    /// to load is logged and skipped.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded config from {CONFIG_ENV_VAR}");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {CONFIG_ENV_VAR}, falling back");
                    }
                }
            } else {
                warn!(path = %path, "{CONFIG_ENV_VAR} points to non-existent file, falling back");
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded config from ./{LOCAL_CONFIG_FILE}");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{LOCAL_CONFIG_FILE}, using defaults");
                }
            }
        }

        info!("No {LOCAL_CONFIG_FILE} found, using built-in defaults");
        Self::default()
    }

    /// Load and validate a specific TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate TOML text. Unknown keys are warned about, never
    /// rejected.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Check values that would make the dashboard misbehave.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        if self.server.addr.parse::<SocketAddr>().is_err() {
            errors.push(format!(
                "server.addr = '{}' is not a valid HOST:PORT socket address",
                self.server.addr
            ));
        }
        if self.server.request_timeout_secs == 0 {
            errors.push("server.request_timeout_secs must be > 0".to_string());
        }

        let v = &self.view;
        if v.top_n == 0 {
            errors.push("view.top_n must be >= 1".to_string());
        }
        if v.default_page_size == 0 {
            errors.push("view.default_page_size must be >= 1".to_string());
        }
        if v.max_page_size < v.default_page_size {
            errors.push(format!(
                "view.max_page_size ({}) must be >= view.default_page_size ({})",
                v.max_page_size, v.default_page_size
            ));
        }

        if self.export.file_name.trim().is_empty() {
            errors.push("export.file_name must not be empty".to_string());
        } else if self.export.file_name.contains(['/', '\\', '"']) {
            errors.push(format!(
                "export.file_name = '{}' must be a bare file name",
                self.export.file_name
            ));
        }

        if self.demo.machines == 0 {
            errors.push("demo.machines must be >= 1".to_string());
        }
        if !(1..=defaults::MAX_DEMO_INTERVAL_SECS).contains(&self.demo.interval_secs) {
            errors.push(format!(
                "demo.interval_secs = {} must be in 1..={}",
                self.demo.interval_secs,
                defaults::MAX_DEMO_INTERVAL_SECS
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {1}", .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config parse error ({}): {1}", .0.display())]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("Config serialization error: {0}")]
    Serialize(#[source] toml::ser::Error),

    #[error("Config validation failed:\n  - {}", .0.join("\n  - "))]
    Validation(Vec<String>),
}

// ============================================================================
// Sections
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// CSV file read at startup.
    #[serde(default = "default_dataset_path")]
    pub path: PathBuf,

    /// Skip malformed rows with a warning instead of refusing the file.
    #[serde(default)]
    pub skip_invalid_rows: bool,
}

fn default_dataset_path() -> PathBuf {
    PathBuf::from(defaults::DATASET_PATH)
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: default_dataset_path(),
            skip_invalid_rows: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP bind address.
    ///
    /// Can be overridden by `SENSOR_EXPLORER_ADDR` env var or `--addr` CLI flag.
    #[serde(default = "default_server_addr")]
    pub addr: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_server_addr() -> String {
    defaults::SERVER_ADDR.to_string()
}
fn default_request_timeout() -> u64 {
    defaults::REQUEST_TIMEOUT_SECS
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_server_addr(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewConfig {
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// 0 disables view caching.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    #[serde(default = "default_page_size")]
    pub default_page_size: usize,

    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,
}

fn default_top_n() -> usize { defaults::TOP_N }
fn default_cache_capacity() -> usize { defaults::VIEW_CACHE_CAPACITY }
fn default_page_size() -> usize { defaults::DEFAULT_PAGE_SIZE }
fn default_max_page_size() -> usize { defaults::MAX_PAGE_SIZE }

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            cache_capacity: default_cache_capacity(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Suggested file name of the CSV download.
    #[serde(default = "default_export_file_name")]
    pub file_name: String,
}

fn default_export_file_name() -> String {
    defaults::EXPORT_FILE_NAME.to_string()
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            file_name: default_export_file_name(),
        }
    }
}

/// Synthetic dataset used by `--demo`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemoConfig {
    #[serde(default = "default_demo_seed")]
    pub seed: u64,

    #[serde(default = "default_demo_machines")]
    pub machines: usize,

    #[serde(default = "default_demo_readings")]
    pub readings_per_machine: usize,

    #[serde(default = "default_demo_interval")]
    pub interval_secs: i64,
}

fn default_demo_seed() -> u64 { defaults::DEMO_SEED }
fn default_demo_machines() -> usize { defaults::DEMO_MACHINES }
fn default_demo_readings() -> usize { defaults::DEMO_READINGS_PER_MACHINE }
fn default_demo_interval() -> i64 { defaults::DEMO_INTERVAL_SECS }

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            seed: default_demo_seed(),
            machines: default_demo_machines(),
            readings_per_machine: default_demo_readings(),
            interval_secs: default_demo_interval(),
        }
    }
}

impl DemoConfig {
    pub fn spec(&self) -> SyntheticSpec {
        SyntheticSpec {
            seed: self.seed,
            machines: self.machines,
            readings_per_machine: self.readings_per_machine,
            interval_secs: self.interval_secs,
            ..SyntheticSpec::default()
        }
    }
}
