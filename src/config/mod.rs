// Configuration module entry point
// Loads layered configuration and holds the shared runtime state

mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::{Config, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig};

/// Config file looked up in the working directory (any extension `config` understands)
pub const DEFAULT_CONFIG_NAME: &str = "isoserve";

/// Environment variable prefix, e.g. `ISOSERVE_SERVER__PORT=9000`
pub const ENV_PREFIX: &str = "ISOSERVE";

impl Config {
    /// Load configuration from the default `isoserve.*` file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(DEFAULT_CONFIG_NAME)
    }

    /// Load configuration from specified file path (without extension)
    ///
    /// A missing file is not an error: the built-in defaults describe the
    /// stock server (all interfaces, port 8000, working directory).
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let defaults = Self::default();

        let settings = config::Config::builder()
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", i64::from(defaults.server.port))?
            .set_default("server.backlog", i64::from(defaults.server.backlog))?
            .set_default("logging.level", defaults.logging.level)?
            .set_default("logging.access_log", defaults.logging.access_log)?
            .set_default("logging.access_log_format", defaults.logging.access_log_format)?
            .set_default(
                "performance.keep_alive_timeout",
                defaults.performance.keep_alive_timeout,
            )?
            .set_default("performance.read_timeout", defaults.performance.read_timeout)?
            .set_default("http.root_dir", defaults.http.root_dir)?
            .set_default("http.index_files", defaults.http.index_files)?
            .set_default("http.directory_listing", defaults.http.directory_listing)?
            .set_default("http.server_name", defaults.http.server_name)?
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        let host = &self.server.host;
        // Bare IPv6 literals need brackets to parse as a socket address
        let addr = if host.contains(':') && !host.starts_with('[') {
            format!("[{host}]:{}", self.server.port)
        } else {
            format!("{host}:{}", self.server.port)
        };
        addr.parse()
            .map_err(|e| format!("Invalid address '{addr}': {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let cfg = Config::load_from("definitely-not-a-config-file").unwrap();
        assert_eq!(cfg.server.port, 8000);
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.http.root_dir, ".");
        assert_eq!(cfg.http.index_files, vec!["index.html", "index.htm"]);
        assert!(cfg.http.directory_listing);
        assert!(cfg.http.mime_types.is_empty());
        assert!(cfg.http.server_name.starts_with("isoserve/"));
    }

    #[test]
    fn test_socket_addr_all_interfaces() {
        let cfg = Config::default();
        let addr = cfg.get_socket_addr().unwrap();
        assert!(addr.ip().is_unspecified());
        assert_eq!(addr.port(), 8000);
    }

    #[test]
    fn test_socket_addr_ipv6() {
        let mut cfg = Config::default();
        cfg.server.host = "::1".to_string();
        let addr = cfg.get_socket_addr().unwrap();
        assert!(addr.is_ipv6());
    }

    #[test]
    fn test_socket_addr_invalid() {
        let mut cfg = Config::default();
        cfg.server.host = "not a host".to_string();
        assert!(cfg.get_socket_addr().is_err());
    }
}
