// Configuration module entry point
// Loads layered configuration (file, environment, defaults) and holds runtime state

mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::{Config, LogLevel};

/// Default config file name (without extension)
pub const DEFAULT_CONFIG_PATH: &str = "config";

/// Environment variable prefix, e.g. `FLAGSERVE_SERVER__PORT=9000`
const ENV_PREFIX: &str = "FLAGSERVE";

/// Rejected configuration values
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("server.port must not be 0")]
    ZeroPort,
    #[error("flags.route_prefix must start with '/', got '{0}'")]
    RoutePrefix(String),
    #[error("unknown logging.level '{0}'")]
    LogLevel(String),
    #[error("server.backlog must be positive, got {0}")]
    Backlog(i32),
}

impl Config {
    /// Load configuration from specified file path (without extension)
    /// Default config file is "config.toml" when no path specified
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.backlog", 128)?
            .set_default("flags.route_prefix", "/api")?
            .set_default("flags.max_age", 86_400)?
            .set_default("http.default_content_type", "text/html; charset=utf-8")?
            .set_default("http.server_name", "flagserve")?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .build()?;

        settings.try_deserialize()
    }

    /// Check values that deserialize fine but cannot be served with
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.server.port == 0 {
            return Err(ConfigValidationError::ZeroPort);
        }
        if self.server.backlog <= 0 {
            return Err(ConfigValidationError::Backlog(self.server.backlog));
        }
        if !self.flags.route_prefix.starts_with('/') {
            return Err(ConfigValidationError::RoutePrefix(
                self.flags.route_prefix.clone(),
            ));
        }
        if LogLevel::parse(&self.logging.level).is_none() {
            return Err(ConfigValidationError::LogLevel(self.logging.level.clone()));
        }
        Ok(())
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    pub fn log_level(&self) -> LogLevel {
        LogLevel::parse(&self.logging.level).unwrap_or(LogLevel::Info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn defaults() -> Config {
        Config::load_from("__flagserve_missing_config__").unwrap()
    }

    #[test]
    fn test_defaults() {
        let cfg = defaults();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.server.backlog, 128);
        assert_eq!(cfg.flags.route_prefix, "/api");
        assert_eq!(cfg.flags.max_age, 86_400);
        assert!(cfg.flags.dir.is_none());
        assert_eq!(cfg.http.default_content_type, "text/html; charset=utf-8");
        assert!(cfg.health.enabled);
        assert_eq!(cfg.health.liveness_path, "/healthz");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flags.toml");
        std::fs::write(
            &path,
            "[server]\nport = 9090\n\n[flags]\ndir = \"/srv/flags\"\nroute_prefix = \"/flag\"\n",
        )
        .unwrap();

        let base = dir.path().join("flags");
        let cfg = Config::load_from(base.to_str().unwrap()).unwrap();
        assert_eq!(cfg.server.port, 9090);
        assert_eq!(cfg.flags.route_prefix, "/flag");
        assert_eq!(cfg.flags.dir, Some(PathBuf::from("/srv/flags")));
        assert_eq!(cfg.flags.max_age, 86_400);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut cfg = defaults();
        cfg.flags.route_prefix = "api".to_string();
        assert_eq!(
            cfg.validate(),
            Err(ConfigValidationError::RoutePrefix("api".to_string()))
        );

        let mut cfg = defaults();
        cfg.logging.level = "loud".to_string();
        assert_eq!(
            cfg.validate(),
            Err(ConfigValidationError::LogLevel("loud".to_string()))
        );

        let mut cfg = defaults();
        cfg.server.port = 0;
        assert_eq!(cfg.validate(), Err(ConfigValidationError::ZeroPort));
    }

    #[test]
    fn test_socket_addr() {
        let cfg = defaults();
        assert_eq!(cfg.get_socket_addr().unwrap().port(), 8080);

        let mut cfg = defaults();
        cfg.server.host = "not an ip".to_string();
        assert!(cfg.get_socket_addr().is_err());
    }

    #[test]
    fn test_log_level_parse() {
        assert_eq!(LogLevel::parse("DEBUG"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::parse("warning"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::parse("verbose"), None);
        assert!(LogLevel::Error < LogLevel::Warn);
        assert!(LogLevel::Info < LogLevel::Debug);
    }
}
