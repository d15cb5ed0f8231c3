use serde::{Deserialize, Serialize};

use super::listen::{ListenAddr, DISABLED_SENTINEL};

/// Listener configuration. Each address may be set to `"no"` to disable
/// that listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_disabled")]
    pub http: String,

    #[serde(default = "default_https")]
    pub https: String,

    /// `host:port` or a Unix socket path.
    #[serde(default = "default_disabled")]
    pub fcgi: String,

    #[serde(default)]
    pub remove_fcgi_socket: bool,

    #[serde(default = "default_cert")]
    pub cert: String,

    #[serde(default = "default_key")]
    pub key: String,
}

impl ServerConfig {
    pub fn http_addr(&self) -> ListenAddr {
        ListenAddr::parse(&self.http)
    }

    pub fn https_addr(&self) -> ListenAddr {
        ListenAddr::parse(&self.https)
    }

    pub fn fcgi_addr(&self) -> ListenAddr {
        ListenAddr::parse(&self.fcgi)
    }

    pub fn any_enabled(&self) -> bool {
        self.http_addr().is_enabled()
            || self.https_addr().is_enabled()
            || self.fcgi_addr().is_enabled()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http: default_disabled(),
            https: default_https(),
            fcgi: default_disabled(),
            remove_fcgi_socket: false,
            cert: default_cert(),
            key: default_key(),
        }
    }
}

fn default_disabled() -> String {
    DISABLED_SENTINEL.to_string()
}

fn default_https() -> String {
    "127.0.0.1:4433".to_string()
}

fn default_cert() -> String {
    "cert.pem".to_string()
}

fn default_key() -> String {
    "key.pem".to_string()
}
