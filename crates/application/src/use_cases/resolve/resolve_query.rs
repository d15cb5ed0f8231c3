use dohgate_domain::{DohResponse, DomainError, ResolutionRequest};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::ports::RecordLookup;
use crate::services::RecordResolver;

/// Resolves one request and shapes the result into the response document.
pub struct ResolveQueryUseCase {
    resolver: RecordResolver,
    ttl: u32,
}

impl ResolveQueryUseCase {
    pub fn new(lookup: Arc<dyn RecordLookup>, ttl: u32) -> Self {
        Self {
            resolver: RecordResolver::new(lookup),
            ttl,
        }
    }

    #[instrument(skip(self, request), fields(name = %request.name, qtype = %request.qtype))]
    pub async fn execute(&self, request: &ResolutionRequest) -> Result<DohResponse, DomainError> {
        let records = self.resolver.resolve(&request.name, &request.qtype).await?;

        let response = DohResponse::from_records(&request.name, &records, self.ttl);

        debug!(
            record_type = records.record_type.to_u16(),
            answers = response.answer.len(),
            "Response built"
        );

        Ok(response)
    }
}
