#![allow(dead_code)]

use async_trait::async_trait;
use dohgate_application::ports::{MxRecord, RecordLookup, SrvRecord};
use dohgate_domain::DomainError;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, Mutex, RwLock};

/// In-memory lookup table keyed by (kind, name).
#[derive(Clone, Default)]
pub struct MockRecordLookup {
    ips: Arc<RwLock<HashMap<String, Vec<IpAddr>>>>,
    ns: Arc<RwLock<HashMap<String, Vec<String>>>>,
    cnames: Arc<RwLock<HashMap<String, String>>>,
    ptrs: Arc<RwLock<HashMap<String, Vec<String>>>>,
    mx: Arc<RwLock<HashMap<String, Vec<MxRecord>>>>,
    txt: Arc<RwLock<HashMap<String, Vec<String>>>>,
    srv: Arc<RwLock<HashMap<String, Vec<SrvRecord>>>>,
    errors: Arc<RwLock<HashMap<String, DomainError>>>,
    calls: Arc<Mutex<Vec<(&'static str, String)>>>,
}

impl MockRecordLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ips(self, name: &str, ips: &[&str]) -> Self {
        let parsed = ips.iter().map(|ip| ip.parse().unwrap()).collect();
        self.ips.write().unwrap().insert(name.to_string(), parsed);
        self
    }

    pub fn with_ns(self, name: &str, hosts: &[&str]) -> Self {
        self.ns.write().unwrap().insert(name.to_string(), owned(hosts));
        self
    }

    pub fn with_cname(self, name: &str, target: &str) -> Self {
        self.cnames
            .write()
            .unwrap()
            .insert(name.to_string(), target.to_string());
        self
    }

    pub fn with_ptr(self, addr: &str, hosts: &[&str]) -> Self {
        self.ptrs.write().unwrap().insert(addr.to_string(), owned(hosts));
        self
    }

    pub fn with_mx(self, name: &str, records: &[(u16, &str)]) -> Self {
        let records = records
            .iter()
            .map(|(pref, host)| MxRecord::new(*pref, *host))
            .collect();
        self.mx.write().unwrap().insert(name.to_string(), records);
        self
    }

    pub fn with_txt(self, name: &str, values: &[&str]) -> Self {
        self.txt.write().unwrap().insert(name.to_string(), owned(values));
        self
    }

    pub fn with_srv(self, name: &str, records: &[(u16, u16, u16, &str)]) -> Self {
        let records = records
            .iter()
            .map(|(priority, weight, port, target)| {
                SrvRecord::new(*priority, *weight, *port, *target)
            })
            .collect();
        self.srv.write().unwrap().insert(name.to_string(), records);
        self
    }

    pub fn with_error(self, name: &str, error: DomainError) -> Self {
        self.errors.write().unwrap().insert(name.to_string(), error);
        self
    }

    pub fn calls(&self) -> Vec<(&'static str, String)> {
        self.calls.lock().unwrap().clone()
    }

    fn record_call(&self, kind: &'static str, name: &str) -> Result<(), DomainError> {
        self.calls.lock().unwrap().push((kind, name.to_string()));
        match self.errors.read().unwrap().get(name) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn not_found(name: &str) -> DomainError {
        DomainError::NxDomain(name.to_string())
    }
}

fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[async_trait]
impl RecordLookup for MockRecordLookup {
    async fn lookup_ip(&self, name: &str) -> Result<Vec<IpAddr>, DomainError> {
        self.record_call("ip", name)?;
        self.ips
            .read()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| Self::not_found(name))
    }

    async fn lookup_ns(&self, name: &str) -> Result<Vec<String>, DomainError> {
        self.record_call("ns", name)?;
        self.ns
            .read()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| Self::not_found(name))
    }

    async fn lookup_cname(&self, name: &str) -> Result<String, DomainError> {
        self.record_call("cname", name)?;
        Ok(self
            .cnames
            .read()
            .unwrap()
            .get(name)
            .cloned()
            .unwrap_or_else(|| format!("{}.", name)))
    }

    async fn lookup_addr(&self, addr: &str) -> Result<Vec<String>, DomainError> {
        self.record_call("addr", addr)?;
        if addr.parse::<IpAddr>().is_err() {
            return Err(DomainError::InvalidIpAddress(addr.to_string()));
        }
        self.ptrs
            .read()
            .unwrap()
            .get(addr)
            .cloned()
            .ok_or_else(|| Self::not_found(addr))
    }

    async fn lookup_mx(&self, name: &str) -> Result<Vec<MxRecord>, DomainError> {
        self.record_call("mx", name)?;
        self.mx
            .read()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| Self::not_found(name))
    }

    async fn lookup_txt(&self, name: &str) -> Result<Vec<String>, DomainError> {
        self.record_call("txt", name)?;
        self.txt
            .read()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| Self::not_found(name))
    }

    async fn lookup_srv(&self, name: &str) -> Result<Vec<SrvRecord>, DomainError> {
        self.record_call("srv", name)?;
        self.srv
            .read()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| Self::not_found(name))
    }
}
