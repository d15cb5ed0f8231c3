use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("unsupported query type: {0}")]
    UnsupportedType(String),

    #[error("{0}")]
    ResolutionFailed(String),

    #[error("no such host: {0}")]
    NxDomain(String),

    #[error("no {record_type} records found for {name}")]
    NoRecordsFound { name: String, record_type: String },

    #[error("unrecognized address: {0}")]
    InvalidIpAddress(String),

    #[error("lookup of {0} timed out")]
    QueryTimeout(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}
