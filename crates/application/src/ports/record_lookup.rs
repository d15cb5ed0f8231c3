use async_trait::async_trait;
use dohgate_domain::DomainError;
use std::net::IpAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MxRecord {
    pub preference: u16,
    pub exchange: String,
}

impl MxRecord {
    pub fn new(preference: u16, exchange: impl Into<String>) -> Self {
        Self {
            preference,
            exchange: exchange.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrvRecord {
    pub priority: u16,
    pub weight: u16,
    pub port: u16,
    pub target: String,
}

impl SrvRecord {
    pub fn new(priority: u16, weight: u16, port: u16, target: impl Into<String>) -> Self {
        Self {
            priority,
            weight,
            port,
            target: target.into(),
        }
    }
}

/// The host's name-resolution engine, one call per lookup kind.
///
/// Host names are returned as the engine renders them (possibly fully
/// qualified with a trailing dot); shaping them is the caller's job.
#[async_trait]
pub trait RecordLookup: Send + Sync {
    /// All addresses of `name`, both families, in resolver order.
    async fn lookup_ip(&self, name: &str) -> Result<Vec<IpAddr>, DomainError>;

    async fn lookup_ns(&self, name: &str) -> Result<Vec<String>, DomainError>;

    /// The canonical name of `name`; `name` itself when it is not an alias.
    async fn lookup_cname(&self, name: &str) -> Result<String, DomainError>;

    /// Reverse lookup. `addr` must be a textual IP address.
    async fn lookup_addr(&self, addr: &str) -> Result<Vec<String>, DomainError>;

    async fn lookup_mx(&self, name: &str) -> Result<Vec<MxRecord>, DomainError>;

    /// One string per TXT record, its character-strings concatenated.
    async fn lookup_txt(&self, name: &str) -> Result<Vec<String>, DomainError>;

    async fn lookup_srv(&self, name: &str) -> Result<Vec<SrvRecord>, DomainError>;
}
