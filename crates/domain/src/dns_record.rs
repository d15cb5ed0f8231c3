pub mod record_type;

pub use record_type::RecordType;

/// Normalized outcome of one lookup: the concrete type and its answer values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRecords {
    pub record_type: RecordType,
    pub data: Vec<String>,
}

impl ResolvedRecords {
    pub fn new(record_type: RecordType, data: Vec<String>) -> Self {
        Self { record_type, data }
    }
}
