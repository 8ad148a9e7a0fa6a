// Configuration module entry point
// Loads layered configuration and builds the shared application state

mod state;
mod types;

use std::net::SocketAddr;

pub use state::AppState;
pub use types::{Config, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig, StorageConfig};

/// Config file used when no path is given on the command line
pub const DEFAULT_CONFIG_PATH: &str = "minidav.toml";

impl Config {
    /// Load configuration from the specified file path
    ///
    /// Sources, lowest precedence first: built-in defaults, the file (optional),
    /// then `MINIDAV_*` environment variables (`MINIDAV_SERVER__PORT=9000`).
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        Self::builder_with_defaults()?
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("MINIDAV")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }

    /// Load configuration from an in-memory TOML document layered over the defaults
    pub fn from_toml_str(source: &str) -> Result<Self, config::ConfigError> {
        Self::builder_with_defaults()?
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    fn builder_with_defaults(
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
        config::Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("storage.root", ".")?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("performance.keep_alive", true)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("http.server_name", "minidav")?
            .set_default("http.max_body_size", 1_048_576) // 1MB
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    /// Upper bound on the lifetime of a single connection
    pub fn connection_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(std::cmp::max(
            self.performance.read_timeout,
            self.performance.write_timeout,
        ))
    }

    /// Effective configuration rendered as TOML, for startup diagnostics
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_apply_to_empty_document() {
        let cfg = Config::from_toml_str("").unwrap();
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.server.workers, None);
        assert_eq!(cfg.storage.root, ".");
        assert_eq!(cfg.storage.index_files, vec!["index.html", "index.htm"]);
        assert_eq!(cfg.logging.access_log_format, "combined");
        assert_eq!(cfg.http.max_body_size, 1_048_576);
        assert_eq!(cfg.http.server_name, "minidav");
    }

    #[test]
    fn test_file_values_override_defaults() {
        let cfg = Config::from_toml_str(
            r#"
            [server]
            port = 9090
            workers = 2

            [storage]
            root = "/srv/dav"

            [logging]
            level = "debug"
            access_log = false
            access_log_format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.server.port, 9090);
        assert_eq!(cfg.server.workers, Some(2));
        assert_eq!(cfg.storage.root, "/srv/dav");
        assert_eq!(cfg.logging.level, "debug");
        assert!(!cfg.logging.access_log);
        assert_eq!(cfg.logging.access_log_format, "json");
    }

    #[test]
    fn test_socket_addr() {
        let cfg = Config::from_toml_str("[server]\nhost = \"0.0.0.0\"\nport = 4918\n").unwrap();
        assert_eq!(cfg.get_socket_addr().unwrap().port(), 4918);

        let bad = Config::from_toml_str("[server]\nhost = \"not an ip\"\n").unwrap();
        assert!(bad.get_socket_addr().is_err());
    }

    #[test]
    fn test_connection_timeout_uses_larger_bound() {
        let cfg = Config::from_toml_str(
            "[performance]\nread_timeout = 5\nwrite_timeout = 12\n",
        )
        .unwrap();
        assert_eq!(cfg.connection_timeout().as_secs(), 12);
    }

    #[test]
    fn test_to_toml_round_trips_port() {
        let cfg = Config::from_toml_str("[server]\nport = 7000\n").unwrap();
        let rendered = cfg.to_toml().unwrap();
        assert!(rendered.contains("port = 7000"));
    }

    #[test]
    fn test_app_state_exposes_root() {
        let cfg = Config::from_toml_str("[storage]\nroot = \"fixtures/root\"\n").unwrap();
        let state = AppState::new(&cfg);
        assert_eq!(state.storage_root(), std::path::Path::new("fixtures/root"));
        assert!(state.access_log());
    }
}
