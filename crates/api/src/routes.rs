use crate::errors::ApiError;
use crate::handlers;
use crate::state::AppState;
use axum::{routing::any, Router};

/// Serves the resolve handler on the configured endpoint only; every other
/// path is a plain 404.
pub fn create_doh_routes(state: AppState) -> Router {
    let endpoint = state.settings.endpoint.clone();

    Router::new()
        .route(&endpoint, any(handlers::resolve))
        .fallback(|| async { ApiError::NotFound })
        .with_state(state)
}
