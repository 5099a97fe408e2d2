//! Configuration loading and service URL resolution
//!
//! Service URL priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing TOML file is not an error: defaults are used and a warning is
//! logged.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Analysis Service address used when nothing else is configured
pub const DEFAULT_SERVICE_URL: &str = "http://127.0.0.1:5000";

/// Environment variable overriding the service URL
pub const SERVICE_URL_ENV: &str = "HRS_SERVICE_URL";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TomlConfig {
    /// Analysis Service base URL (e.g. "http://127.0.0.1:5000")
    #[serde(default)]
    pub service_url: Option<String>,

    /// Optional per-request timeout in seconds.
    ///
    /// Unset means requests may stay in flight indefinitely.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TomlConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Default configuration file path for the platform
///
/// `<config_dir>/hrs/hrs-ui.toml`, e.g. `~/.config/hrs/hrs-ui.toml` on Linux.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("hrs").join("hrs-ui.toml"))
}

/// Load the TOML config
///
/// Uses `path` when given, else [`default_config_path`]. A missing file yields
/// defaults; an unreadable or malformed file is an error.
pub fn load_toml_config(path: Option<&Path>) -> Result<TomlConfig> {
    let path = match path.map(Path::to_path_buf).or_else(default_config_path) {
        Some(p) => p,
        None => {
            warn!("Could not determine config directory, using defaults");
            return Ok(TomlConfig::default());
        }
    };

    if !path.exists() {
        warn!("Config file not found: {}, using defaults", path.display());
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(&path)?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))?;

    info!("Loaded config from {}", path.display());
    Ok(config)
}

/// Resolve the Analysis Service base URL
///
/// Blank values at any tier are skipped. A trailing slash is trimmed so paths
/// can be appended directly.
pub fn resolve_service_url(
    cli_arg: Option<&str>,
    env_var_name: &str,
    toml_config: &TomlConfig,
) -> String {
    // Priority 1: Command-line argument
    if let Some(url) = cli_arg.filter(|u| is_set(u)) {
        return normalize(url);
    }

    // Priority 2: Environment variable
    if let Ok(url) = std::env::var(env_var_name) {
        if is_set(&url) {
            return normalize(&url);
        }
    }

    // Priority 3: TOML config file
    if let Some(url) = toml_config.service_url.as_deref().filter(|u| is_set(u)) {
        return normalize(url);
    }

    // Priority 4: Compiled default
    DEFAULT_SERVICE_URL.to_string()
}

fn is_set(value: &str) -> bool {
    !value.trim().is_empty()
}

fn normalize(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
