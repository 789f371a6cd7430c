//! Server configuration loading from file and environment variables.

use pulse_history::PageLimits;
use pulse_types::{KNOWN_DETAIL_TYPES, KNOWN_OPERATIONS, KNOWN_SOURCES};
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub history: HistoryConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub health: HealthConfig,

    #[serde(default)]
    pub push: PushConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,

    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    #[serde(default = "default_pool_max_size")]
    pub pool_max_size: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "pulse_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

/// Page-size policy for `GET /v1/events/history`.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,

    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,
}

/// Lists served by `GET /v1/detail-types` and `GET /v1/operations/types`.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_detail_types")]
    pub detail_types: Vec<String>,

    #[serde(default = "default_sources")]
    pub sources: Vec<String>,

    /// Values of the payload's `operation` attribute.
    #[serde(default = "default_operations")]
    pub operations: Vec<String>,
}

/// Dependent resources reported by `GET /v1/health`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HealthConfig {
    /// Bus topics the service depends on.
    #[serde(default)]
    pub topics: Vec<String>,
}

/// Settings for pushing replies through a gateway's HTTP API.
#[derive(Debug, Clone, Deserialize)]
pub struct PushConfig {
    #[serde(default = "default_push_timeout_ms")]
    pub timeout_ms: u64,

    /// Gateway hosts replies may be pushed to. A callback naming any other
    /// `domainName` is rejected. Empty disables HTTP push entirely.
    #[serde(default)]
    pub allowed_domains: Vec<String>,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    3000
}

fn default_db_path() -> String {
    "pulse.db".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_pool_max_size() -> u32 {
    8
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_page_size() -> usize {
    50
}

fn default_max_page_size() -> usize {
    100
}

fn default_detail_types() -> Vec<String> {
    KNOWN_DETAIL_TYPES.iter().map(|s| s.to_string()).collect()
}

fn default_sources() -> Vec<String> {
    KNOWN_SOURCES.iter().map(|s| s.to_string()).collect()
}

fn default_operations() -> Vec<String> {
    KNOWN_OPERATIONS.iter().map(|s| s.to_string()).collect()
}

fn default_push_timeout_ms() -> u64 {
    3_000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            pool_max_size: default_pool_max_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            detail_types: default_detail_types(),
            sources: default_sources(),
            operations: default_operations(),
        }
    }
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_push_timeout_ms(),
            allowed_domains: Vec::new(),
        }
    }
}

impl DatabaseConfig {
    pub fn runtime_settings(&self) -> pulse_db::DbRuntimeSettings {
        pulse_db::DbRuntimeSettings {
            busy_timeout_ms: self.busy_timeout_ms,
            pool_max_size: self.pool_max_size,
        }
    }
}

impl HistoryConfig {
    pub fn page_limits(&self) -> PageLimits {
        PageLimits {
            default_page_size: self.default_page_size,
            max_page_size: self.max_page_size,
        }
    }
}

impl PushConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `PULSE_HOST` overrides `server.host`
/// - `PULSE_PORT` overrides `server.port`
/// - `PULSE_DB_PATH` overrides `database.path`
/// - `PULSE_LOG_LEVEL` overrides `logging.level`
/// - `PULSE_LOG_JSON` overrides `logging.json` (set to "true" to enable)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    if let Ok(host) = std::env::var("PULSE_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Ok(port) = std::env::var("PULSE_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Ok(db_path) = std::env::var("PULSE_DB_PATH") {
        config.database.path = db_path;
    }
    if let Ok(level) = std::env::var("PULSE_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Ok(json) = std::env::var("PULSE_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }

    Ok(config)
}

/// Picks the config file path: first CLI argument, then
/// `PULSE_CONFIG_PATH`, then `config.toml`. Also returns where it came from.
pub fn resolve_config_path() -> (String, &'static str) {
    if let Some(path) = std::env::args()
        .nth(1)
        .filter(|value| !value.trim().is_empty())
    {
        return (path, "cli-arg");
    }

    if let Ok(path) = std::env::var("PULSE_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (path, "env-var");
        }
    }

    ("config.toml".to_string(), "default")
}
