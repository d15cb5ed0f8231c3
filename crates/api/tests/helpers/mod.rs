#![allow(dead_code)]

mod log_capture;
mod zone_lookup;

pub use log_capture::{capture_logs, LogWriter};
pub use zone_lookup::ZoneLookup;

use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use dohgate_api::{create_doh_routes, AppState, ResolveSettings};
use dohgate_application::use_cases::ResolveQueryUseCase;
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;

pub const TTL: u32 = 1800;

pub fn settings() -> ResolveSettings {
    ResolveSettings {
        endpoint: "/resolve".to_string(),
        content_type: "application/json".to_string(),
        verbose: true,
    }
}

pub fn app_with(lookup: ZoneLookup, settings: ResolveSettings) -> Router {
    let resolve = Arc::new(ResolveQueryUseCase::new(Arc::new(lookup), TTL));
    create_doh_routes(AppState::new(resolve, settings))
}

pub fn app() -> Router {
    app_with(ZoneLookup::example(), settings())
}

pub async fn get(app: Router, uri: &str) -> (Response<Body>, String) {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

pub async fn send(app: Router, request: Request<Body>) -> (Response<Body>, String) {
    let response = app.oneshot(request).await.unwrap();
    let (parts, body) = response.into_parts();
    let bytes = body.collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    (Response::from_parts(parts, Body::empty()), text)
}

pub fn header<'a>(response: &'a Response<Body>, name: &str) -> Option<&'a str> {
    response.headers().get(name).and_then(|v| v.to_str().ok())
}

/// True when `body` is exactly a redacted error line.
pub fn is_redacted(body: &str) -> bool {
    body.strip_prefix("Error number ")
        .and_then(|rest| rest.strip_suffix('\n'))
        .is_some_and(|code| {
            code.len() == 16
                && code
                    .chars()
                    .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        })
}
