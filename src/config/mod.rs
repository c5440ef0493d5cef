// Configuration module entry point
// Loads service, listener and logging settings

mod types;

use std::net::SocketAddr;

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError};

// Re-export public types
pub use types::{
    Config, DemoConfig, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig,
    ServiceConfig,
};

/// Default config file name (without extension)
pub const DEFAULT_CONFIG_PATH: &str = "config";

impl Config {
    /// Load configuration from the default `config.toml`
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from specified file path (without extension)
    ///
    /// The file is optional; `RESTBASE__SECTION__KEY` environment variables
    /// override both the file and the defaults.
    pub fn load_from(config_path: &str) -> Result<Self, ConfigError> {
        with_defaults()?
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("RESTBASE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    #[cfg(test)]
    pub(crate) fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        with_defaults()?
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}

fn with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    config::Config::builder()
        .set_default("service.domain_root", "http://127.0.0.1:8080")?
        .set_default("service.base_uri", "/api")?
        .set_default("service.first_resource_separator", "/")?
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 8080)?
        .set_default("server.backlog", 128)?
        .set_default("http.server_name", "restbase/0.1")?
        .set_default("http.max_body_size", 10_485_760)? // 10MB
        .set_default("performance.header_read_timeout", 30)?
        .set_default("performance.keep_alive", true)?
        .set_default("logging.level", "info")?
        .set_default("logging.access_log", true)?
        .set_default("logging.access_log_format", "combined")?
        .set_default("demo.download_dir", "static")
}
