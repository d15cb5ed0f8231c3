use async_trait::async_trait;
use dohgate_application::ports::{MxRecord, RecordLookup, SrvRecord};
use dohgate_domain::DomainError;
use std::collections::HashMap;
use std::net::IpAddr;

/// Fixed answers for a handful of names; anything else is NXDOMAIN.
#[derive(Default)]
pub struct ZoneLookup {
    ips: HashMap<&'static str, Vec<IpAddr>>,
    ns: HashMap<&'static str, Vec<String>>,
    cnames: HashMap<&'static str, String>,
    ptrs: HashMap<&'static str, Vec<String>>,
    mx: HashMap<&'static str, Vec<MxRecord>>,
    txt: HashMap<&'static str, Vec<String>>,
    srv: HashMap<&'static str, Vec<SrvRecord>>,
    failing: HashMap<&'static str, DomainError>,
}

impl ZoneLookup {
    pub fn example() -> Self {
        let mut zone = Self::default();
        zone.ips.insert(
            "example.com",
            ["93.184.216.34", "2606:2800:220:1:248:1893:25c8:1946", "::ffff:10.1.2.3"]
                .iter()
                .map(|ip| ip.parse().unwrap())
                .collect(),
        );
        zone.ips
            .insert("v6only.example.com", vec!["2001:db8::53".parse().unwrap()]);
        zone.ns.insert(
            "example.com",
            vec!["a.iana-servers.net.".into(), "b.iana-servers.net.".into()],
        );
        zone.cnames.insert("www.example.com", "example.com.".into());
        zone.ptrs.insert("93.184.216.34", vec!["example.com.".into()]);
        zone.mx.insert(
            "example.com",
            vec![
                MxRecord::new(10, "mail1.example.com."),
                MxRecord::new(20, "mail2.example.com."),
            ],
        );
        zone.txt.insert("example.com", vec!["v=spf1 -all".into()]);
        zone.srv.insert(
            "_sip._tcp.example.com",
            vec![SrvRecord::new(10, 60, 5060, "sip.example.com.")],
        );
        zone.failing.insert(
            "broken.example.com",
            DomainError::ResolutionFailed("lookup broken.example.com: server misbehaving".into()),
        );
        zone
    }

    fn check(&self, name: &str) -> Result<(), DomainError> {
        match self.failing.get(name) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

fn found<T: Clone>(table: &HashMap<&'static str, T>, name: &str) -> Result<T, DomainError> {
    table
        .get(name)
        .cloned()
        .ok_or_else(|| DomainError::NxDomain(name.to_string()))
}

#[async_trait]
impl RecordLookup for ZoneLookup {
    async fn lookup_ip(&self, name: &str) -> Result<Vec<IpAddr>, DomainError> {
        self.check(name)?;
        found(&self.ips, name)
    }

    async fn lookup_ns(&self, name: &str) -> Result<Vec<String>, DomainError> {
        self.check(name)?;
        found(&self.ns, name)
    }

    async fn lookup_cname(&self, name: &str) -> Result<String, DomainError> {
        self.check(name)?;
        Ok(self
            .cnames
            .get(name)
            .cloned()
            .unwrap_or_else(|| format!("{}.", name)))
    }

    async fn lookup_addr(&self, addr: &str) -> Result<Vec<String>, DomainError> {
        if addr.parse::<IpAddr>().is_err() {
            return Err(DomainError::InvalidIpAddress(addr.to_string()));
        }
        found(&self.ptrs, addr)
    }

    async fn lookup_mx(&self, name: &str) -> Result<Vec<MxRecord>, DomainError> {
        self.check(name)?;
        found(&self.mx, name)
    }

    async fn lookup_txt(&self, name: &str) -> Result<Vec<String>, DomainError> {
        self.check(name)?;
        found(&self.txt, name)
    }

    async fn lookup_srv(&self, name: &str) -> Result<Vec<SrvRecord>, DomainError> {
        self.check(name)?;
        found(&self.srv, name)
    }
}
