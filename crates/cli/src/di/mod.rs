use dohgate_api::{AppState, ResolveSettings};
use dohgate_application::use_cases::ResolveQueryUseCase;
use dohgate_domain::Config;
use dohgate_infrastructure::dns::SystemRecordLookup;
use std::sync::Arc;
use tracing::info;

/// Wires the system resolver into the resolve use case and the HTTP state.
pub fn build_app_state(config: &Config) -> anyhow::Result<AppState> {
    let lookup = SystemRecordLookup::from_system_conf(config.resolve.query_timeout)?;

    info!(
        ttl = config.resolve.ttl,
        query_timeout_secs = config.resolve.query_timeout,
        "System resolver ready"
    );

    let resolve = Arc::new(ResolveQueryUseCase::new(
        Arc::new(lookup),
        config.resolve.ttl,
    ));

    Ok(AppState::new(resolve, ResolveSettings::from_config(config)))
}
