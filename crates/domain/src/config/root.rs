use serde::{Deserialize, Serialize};

use super::errors::ConfigError;
use super::logging::LoggingConfig;
use super::resolve::ResolveConfig;
use super::server::ServerConfig;

const LOCAL_CONFIG_PATH: &str = "dohgate.toml";
const SYSTEM_CONFIG_PATH: &str = "/etc/dohgate/config.toml";

/// Main configuration structure for dohgate
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Listener configuration (addresses, TLS material)
    #[serde(default)]
    pub server: ServerConfig,

    /// Request handling configuration (endpoint, TTL, content type)
    #[serde(default)]
    pub resolve: ResolveConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file or use defaults
    ///
    /// Priority order:
    /// 1. Explicitly provided path
    /// 2. dohgate.toml in current directory
    /// 3. /etc/dohgate/config.toml
    /// 4. Default configuration
    ///
    /// Command-line overrides are applied on top of whichever source won.
    pub fn load(path: Option<&str>, cli_overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = path {
            Self::from_file(path)?
        } else if std::path::Path::new(LOCAL_CONFIG_PATH).exists() {
            Self::from_file(LOCAL_CONFIG_PATH)?
        } else if std::path::Path::new(SYSTEM_CONFIG_PATH).exists() {
            Self::from_file(SYSTEM_CONFIG_PATH)?
        } else {
            Self::default()
        };

        config.apply_cli_overrides(cli_overrides);
        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;
        Self::from_toml(&contents)
    }

    /// Apply command-line overrides to configuration
    pub fn apply_cli_overrides(&mut self, overrides: CliOverrides) {
        if let Some(cert) = overrides.cert {
            self.server.cert = cert;
        }
        if let Some(key) = overrides.key {
            self.server.key = key;
        }
        if let Some(http) = overrides.http {
            self.server.http = http;
        }
        if let Some(https) = overrides.https {
            self.server.https = https;
        }
        if let Some(fcgi) = overrides.fcgi {
            self.server.fcgi = fcgi;
        }
        if overrides.remove_fcgi_socket {
            self.server.remove_fcgi_socket = true;
        }
        if let Some(content_type) = overrides.content_type {
            self.resolve.content_type = content_type;
        }
        if let Some(ttl) = overrides.ttl {
            self.resolve.ttl = ttl;
        }
        if let Some(endpoint) = overrides.endpoint {
            self.resolve.endpoint = endpoint;
        }
        if let Some(timeout) = overrides.query_timeout {
            self.resolve.query_timeout = timeout;
        }
        if overrides.verbose {
            self.logging.verbose = true;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.resolve.endpoint.starts_with('/') {
            return Err(ConfigError::Validation(format!(
                "Endpoint '{}' must start with '/'",
                self.resolve.endpoint
            )));
        }

        // Router path syntax: braces are captures, `:`/`*` segments are rejected.
        let endpoint = &self.resolve.endpoint;
        if endpoint.contains(['{', '}'])
            || endpoint
                .split('/')
                .any(|segment| segment.starts_with(':') || segment.starts_with('*'))
        {
            return Err(ConfigError::Validation(format!(
                "Endpoint '{}' must be a literal path without '{{', '}}' or ':'/'*' segments",
                endpoint
            )));
        }

        if self.resolve.content_type.trim().is_empty() {
            return Err(ConfigError::Validation(
                "Default content type cannot be empty".to_string(),
            ));
        }

        if !self.server.any_enabled() {
            return Err(ConfigError::Validation(
                "All listeners (http, https, fcgi) are disabled".to_string(),
            ));
        }

        Ok(())
    }
}

/// Command-line overrides for configuration
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub cert: Option<String>,
    pub key: Option<String>,
    pub http: Option<String>,
    pub https: Option<String>,
    pub fcgi: Option<String>,
    pub remove_fcgi_socket: bool,
    pub content_type: Option<String>,
    pub ttl: Option<u32>,
    pub endpoint: Option<String>,
    pub query_timeout: Option<u64>,
    pub verbose: bool,
    pub log_level: Option<String>,
}
