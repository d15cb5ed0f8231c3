//! [`RecordLookup`] backed by the host's resolver configuration.
//!
//! Name servers and options come from the platform (`/etc/resolv.conf` on
//! Unix) via hickory's system-config support; nothing here selects upstreams.

use async_trait::async_trait;
use dohgate_application::ports::{MxRecord, RecordLookup, SrvRecord};
use dohgate_domain::DomainError;
use hickory_resolver::config::LookupIpStrategy;
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::proto::rr::{RData, RecordType};
use hickory_resolver::{ResolveError, TokioResolver};
use std::future::Future;
use std::net::IpAddr;
use std::time::Duration;
use tracing::debug;

pub struct SystemRecordLookup {
    resolver: TokioResolver,
    timeout: Option<Duration>,
}

impl SystemRecordLookup {
    /// Builds a resolver from the system configuration. `query_timeout` is
    /// in seconds; 0 leaves lookups unbounded.
    pub fn from_system_conf(query_timeout: u64) -> Result<Self, DomainError> {
        let mut builder = TokioResolver::builder_tokio().map_err(|e| {
            DomainError::ConfigError(format!("Failed to read system resolver configuration: {}", e))
        })?;

        builder.options_mut().ip_strategy = LookupIpStrategy::Ipv4AndIpv6;
        if query_timeout > 0 {
            builder.options_mut().timeout = Duration::from_secs(query_timeout);
        }

        Ok(Self::new(builder.build(), query_timeout))
    }

    /// Wraps an existing resolver. A and AAAA answers are both split out of
    /// one address lookup, so a resolver with any other IP strategy is
    /// rebuilt to query both families in parallel.
    pub fn new(resolver: TokioResolver, query_timeout: u64) -> Self {
        Self {
            resolver: with_dual_stack(resolver),
            timeout: (query_timeout > 0).then(|| Duration::from_secs(query_timeout)),
        }
    }

    async fn bounded<T, F>(&self, name: &str, record_type: RecordType, lookup: F) -> Result<T, DomainError>
    where
        F: Future<Output = Result<T, ResolveError>>,
    {
        let result = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, lookup)
                .await
                .map_err(|_| DomainError::QueryTimeout(name.to_string()))?,
            None => lookup.await,
        };

        result.map_err(|e| {
            debug!(name = %name, record_type = %record_type, error = %e, "Lookup failed");
            map_resolve_error(name, record_type, e)
        })
    }
}

fn with_dual_stack(resolver: TokioResolver) -> TokioResolver {
    if resolver.options().ip_strategy == LookupIpStrategy::Ipv4AndIpv6 {
        return resolver;
    }

    let mut options = resolver.options().clone();
    options.ip_strategy = LookupIpStrategy::Ipv4AndIpv6;
    TokioResolver::builder_with_config(
        resolver.config().clone(),
        TokioConnectionProvider::default(),
    )
    .with_options(options)
    .build()
}

fn map_resolve_error(name: &str, record_type: RecordType, error: ResolveError) -> DomainError {
    if error.is_nx_domain() {
        DomainError::NxDomain(name.to_string())
    } else if error.is_no_records_found() {
        DomainError::NoRecordsFound {
            name: name.to_string(),
            record_type: record_type.to_string(),
        }
    } else {
        DomainError::ResolutionFailed(format!("lookup {}: {}", name, error))
    }
}

#[async_trait]
impl RecordLookup for SystemRecordLookup {
    async fn lookup_ip(&self, name: &str) -> Result<Vec<IpAddr>, DomainError> {
        let lookup = self
            .bounded(name, RecordType::A, self.resolver.lookup_ip(name))
            .await?;
        Ok(lookup.iter().collect())
    }

    async fn lookup_ns(&self, name: &str) -> Result<Vec<String>, DomainError> {
        let lookup = self
            .bounded(name, RecordType::NS, self.resolver.ns_lookup(name))
            .await?;
        Ok(lookup.iter().map(|ns| ns.0.to_utf8()).collect())
    }

    async fn lookup_cname(&self, name: &str) -> Result<String, DomainError> {
        let result = self
            .bounded(
                name,
                RecordType::CNAME,
                self.resolver.lookup(name, RecordType::CNAME),
            )
            .await;

        match result {
            // The last link of the chain is the canonical name.
            Ok(lookup) => Ok(lookup
                .iter()
                .filter_map(|rdata| match rdata {
                    RData::CNAME(cname) => Some(cname.0.to_utf8()),
                    _ => None,
                })
                .last()
                .unwrap_or_else(|| name.to_string())),
            // Not an alias: the name is its own canonical name.
            Err(DomainError::NoRecordsFound { .. }) => Ok(name.to_string()),
            Err(e) => Err(e),
        }
    }

    async fn lookup_addr(&self, addr: &str) -> Result<Vec<String>, DomainError> {
        let ip: IpAddr = addr
            .parse()
            .map_err(|_| DomainError::InvalidIpAddress(addr.to_string()))?;

        let lookup = self
            .bounded(addr, RecordType::PTR, self.resolver.reverse_lookup(ip))
            .await?;
        Ok(lookup.iter().map(|ptr| ptr.0.to_utf8()).collect())
    }

    async fn lookup_mx(&self, name: &str) -> Result<Vec<MxRecord>, DomainError> {
        let lookup = self
            .bounded(name, RecordType::MX, self.resolver.mx_lookup(name))
            .await?;
        Ok(lookup
            .iter()
            .map(|mx| MxRecord::new(mx.preference(), mx.exchange().to_utf8()))
            .collect())
    }

    async fn lookup_txt(&self, name: &str) -> Result<Vec<String>, DomainError> {
        let lookup = self
            .bounded(name, RecordType::TXT, self.resolver.txt_lookup(name))
            .await?;
        Ok(lookup
            .iter()
            .map(|txt| {
                txt.txt_data()
                    .iter()
                    .map(|chunk| String::from_utf8_lossy(chunk))
                    .collect::<String>()
            })
            .collect())
    }

    async fn lookup_srv(&self, name: &str) -> Result<Vec<SrvRecord>, DomainError> {
        let lookup = self
            .bounded(name, RecordType::SRV, self.resolver.srv_lookup(name))
            .await?;
        Ok(lookup
            .iter()
            .map(|srv| {
                SrvRecord::new(
                    srv.priority(),
                    srv.weight(),
                    srv.port(),
                    srv.target().to_utf8(),
                )
            })
            .collect())
    }
}
