use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolveConfig {
    /// The one request path that is served
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Content-Type sent when the client does not override it
    #[serde(default = "default_content_type")]
    pub content_type: String,

    /// TTL stamped on every answer, in seconds
    #[serde(default = "default_ttl")]
    pub ttl: u32,

    /// Upper bound for a single lookup, in seconds (0 = unbounded)
    #[serde(default = "default_query_timeout")]
    pub query_timeout: u64,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            content_type: default_content_type(),
            ttl: default_ttl(),
            query_timeout: default_query_timeout(),
        }
    }
}

fn default_endpoint() -> String {
    "/resolve".to_string()
}

fn default_content_type() -> String {
    "application/json".to_string()
}

fn default_ttl() -> u32 {
    1800
}

fn default_query_timeout() -> u64 {
    10
}
