use dohgate_domain::{DomainError, RecordType, ResolvedRecords};
use std::cmp::Reverse;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::ports::{MxRecord, RecordLookup, SrvRecord};

/// Maps a request type token to one lookup and flattens its result into
/// answer strings.
pub struct RecordResolver {
    lookup: Arc<dyn RecordLookup>,
}

impl RecordResolver {
    pub fn new(lookup: Arc<dyn RecordLookup>) -> Self {
        Self { lookup }
    }

    /// Resolves `name` for the type named by `token` (decimal code or
    /// mnemonic, any case).
    #[instrument(skip(self), name = "record_resolver")]
    pub async fn resolve(&self, name: &str, token: &str) -> Result<ResolvedRecords, DomainError> {
        let record_type = RecordType::from_token(token)
            .ok_or_else(|| DomainError::UnsupportedType(token.to_string()))?;

        let data = self.resolve_type(name, record_type).await?;

        debug!(
            name = %name,
            record_type = %record_type,
            answers = data.len(),
            "Lookup normalized"
        );

        Ok(ResolvedRecords::new(record_type, data))
    }

    async fn resolve_type(
        &self,
        name: &str,
        record_type: RecordType,
    ) -> Result<Vec<String>, DomainError> {
        let data = match record_type {
            RecordType::A => ipv4_only(&self.lookup.lookup_ip(name).await?),
            RecordType::AAAA => ipv6_only(&self.lookup.lookup_ip(name).await?),
            RecordType::NS => hosts(self.lookup.lookup_ns(name).await?),
            RecordType::CNAME => vec![host(&self.lookup.lookup_cname(name).await?).to_string()],
            RecordType::PTR => hosts(self.lookup.lookup_addr(name).await?),
            RecordType::MX => {
                let mut records = self.lookup.lookup_mx(name).await?;
                records.sort_by_key(|mx| mx.preference);
                records.iter().map(format_mx).collect()
            }
            RecordType::TXT => self.lookup.lookup_txt(name).await?,
            RecordType::SRV => {
                let mut records = self.lookup.lookup_srv(name).await?;
                records.sort_by_key(|srv| (srv.priority, Reverse(srv.weight)));
                records.iter().map(format_srv).collect()
            }
        };
        Ok(data)
    }
}

/// IPv4 addresses (including IPv4-mapped IPv6) in dotted-decimal form.
pub fn ipv4_only(addrs: &[IpAddr]) -> Vec<String> {
    addrs
        .iter()
        .filter_map(|ip| match ip {
            IpAddr::V4(v4) => Some(*v4),
            IpAddr::V6(v6) => v6.to_ipv4_mapped(),
        })
        .map(|v4| v4.to_string())
        .collect()
}

/// Exactly the addresses [`ipv4_only`] drops, in standard IPv6 text.
pub fn ipv6_only(addrs: &[IpAddr]) -> Vec<String> {
    addrs
        .iter()
        .filter(|ip| match ip {
            IpAddr::V4(_) => false,
            IpAddr::V6(v6) => v6.to_ipv4_mapped().is_none(),
        })
        .map(|ip| ip.to_string())
        .collect()
}

pub fn format_mx(mx: &MxRecord) -> String {
    format!("{} {}", mx.preference, host(&mx.exchange))
}

pub fn format_srv(srv: &SrvRecord) -> String {
    format!(
        "{} {} {} {}",
        srv.priority,
        srv.weight,
        srv.port,
        host(&srv.target)
    )
}

/// Drops the trailing root label dot of a fully-qualified name.
fn host(name: &str) -> &str {
    match name.strip_suffix('.') {
        Some(stripped) if !stripped.is_empty() => stripped,
        _ => name,
    }
}

fn hosts(names: Vec<String>) -> Vec<String> {
    names.iter().map(|n| host(n).to_string()).collect()
}
