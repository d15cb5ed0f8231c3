//! dohgate Domain Layer
pub mod config;
pub mod dns_record;
pub mod doh_response;
pub mod errors;
pub mod resolution_request;

pub use config::{CliOverrides, Config, ConfigError, ListenAddr};
pub use dns_record::{RecordType, ResolvedRecords};
pub use doh_response::{Answer, DohResponse, Question};
pub use errors::DomainError;
pub use resolution_request::ResolutionRequest;
