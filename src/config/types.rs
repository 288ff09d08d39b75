// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;
use std::collections::HashMap;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_BACKLOG: i32 = 128;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
}

/// Listener configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Tokio worker threads (CPU cores when unset)
    #[serde(default)]
    pub workers: Option<usize>,
    /// Pending connection queue length passed to `listen(2)`
    pub backlog: i32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            workers: None,
            backlog: DEFAULT_BACKLOG,
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (common, combined or json)
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            access_log: true,
            access_log_format: "common".to_string(),
            access_log_file: None,
            error_log_file: None,
        }
    }
}

/// Performance configuration (all timeouts in seconds)
///
/// `read_timeout` bounds the wait for a request head; an idle keep-alive
/// connection may wait up to `keep_alive_timeout` instead. `0` disables
/// keep-alive.
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    #[serde(default)]
    pub max_connections: Option<u64>,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            keep_alive_timeout: 75,
            read_timeout: 30,
            max_connections: None,
        }
    }
}

/// HTTP / file serving configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    /// Directory served as `/`
    pub root_dir: String,
    pub index_files: Vec<String>,
    pub directory_listing: bool,
    pub server_name: String,
    /// Extra extension overrides, keyed by suffix (e.g. ".glsl")
    #[serde(default)]
    pub mime_types: HashMap<String, String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            root_dir: ".".to_string(),
            index_files: default_index_files(),
            directory_listing: true,
            server_name: default_server_name(),
            mime_types: HashMap::new(),
        }
    }
}

pub fn default_index_files() -> Vec<String> {
    vec!["index.html".to_string(), "index.htm".to_string()]
}

pub fn default_server_name() -> String {
    format!("isoserve/{}", env!("CARGO_PKG_VERSION"))
}
