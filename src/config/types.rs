// Configuration types module
// Defines all configuration-related data structures

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub service: ServiceConfig,
    pub server: ServerConfig,
    pub http: HttpConfig,
    pub performance: PerformanceConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub demo: DemoConfig,
}

/// Settings a REST service is constructed with
///
/// Immutable once built; shared between requests behind an `Arc`.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Domain root used to build absolute resource URLs, e.g. `https://example.org`
    pub domain_root: String,
    /// Base URI where resource parsing begins, e.g. `/api`
    pub base_uri: String,
    /// Separator between the base URI and the first resource
    #[serde(default = "default_separator")]
    pub first_resource_separator: String,
}

#[allow(clippy::missing_const_for_fn)]
fn default_separator() -> String {
    "/".to_string()
}

impl ServiceConfig {
    pub fn new(domain_root: impl Into<String>, base_uri: impl Into<String>) -> Self {
        Self {
            domain_root: domain_root.into(),
            base_uri: base_uri.into(),
            first_resource_separator: default_separator(),
        }
    }

    /// Replace the first resource separator; an empty value keeps `/`
    #[must_use]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.first_resource_separator = separator.into();
        self
    }

    /// Separator actually used for parsing
    pub fn separator(&self) -> &str {
        if self.first_resource_separator.is_empty() {
            "/"
        } else {
            &self.first_resource_separator
        }
    }

    /// `base_uri` followed by the separator
    pub fn resource_prefix(&self) -> String {
        format!("{}{}", self.base_uri, self.separator())
    }

    /// Absolute URL of a resource path below the base URI
    ///
    /// Each segment is percent-encoded before joining.
    pub fn resource_url<S: AsRef<str>>(&self, segments: &[S]) -> String {
        let path = segments
            .iter()
            .map(|s| urlencoding::encode(s.as_ref()).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        format!("{}{}{path}", self.domain_root, self.resource_prefix())
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::new("http://127.0.0.1:8080", "/api")
    }
}

/// Listener configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
    pub backlog: i32,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpConfig {
    pub server_name: String,
    pub max_body_size: u64,
}

/// Connection handling configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    /// Seconds allowed for a client to send request headers
    pub header_read_timeout: u64,
    pub keep_alive: bool,
    pub max_connections: Option<u64>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common or json)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            access_log: true,
            access_log_format: default_access_log_format(),
            access_log_file: None,
            error_log_file: None,
        }
    }
}

/// Settings of the bundled demo service
#[derive(Debug, Deserialize, Clone)]
pub struct DemoConfig {
    /// Directory the demo serves downloads from
    pub download_dir: String,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            download_dir: "static".to_string(),
        }
    }
}
