use dohgate_application::use_cases::ResolveQueryUseCase;
use dohgate_domain::Config;
use std::fmt;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub resolve: Arc<ResolveQueryUseCase>,
    pub settings: Arc<ResolveSettings>,
}

impl AppState {
    pub fn new(resolve: Arc<ResolveQueryUseCase>, settings: ResolveSettings) -> Self {
        Self {
            resolve,
            settings: Arc::new(settings),
        }
    }
}

/// Request handling settings fixed at startup.
#[derive(Debug, Clone)]
pub struct ResolveSettings {
    pub endpoint: String,
    pub content_type: String,
    pub verbose: bool,
}

impl ResolveSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            endpoint: config.resolve.endpoint.clone(),
            content_type: config.resolve.content_type.clone(),
            verbose: config.logging.verbose,
        }
    }
}

/// Peer address of the connection a request arrived on, inserted as a
/// request extension by every listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteAddr(pub String);

impl fmt::Display for RemoteAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
