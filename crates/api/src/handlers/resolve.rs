use axum::{
    body::{self, Body},
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
};
use dohgate_domain::ResolutionRequest;
use std::net::SocketAddr;
use tracing::{debug, info, instrument};

use crate::errors::{report, ApiError, RequestContext};
use crate::state::{AppState, RemoteAddr};
use crate::utils::form::is_form_content_type;
use crate::utils::{render_json, FormError, FormParams, MAX_FORM_BODY};

pub const NAME_PARAM: &str = "name";
pub const TYPE_PARAM: &str = "type";
pub const CONTENT_TYPE_PARAM: &str = "content-type";
pub const PRETTY_PARAM: &str = "pp";

#[instrument(skip_all, name = "api_resolve")]
pub async fn resolve(State(state): State<AppState>, request: Request) -> Response {
    let ctx = request_context(&request);
    let verbose = state.settings.verbose;

    let form = match read_form(request).await {
        Ok(form) => form,
        Err(e) => return report(&ctx, e.into(), None, verbose),
    };

    let Some(name) = form.non_empty(NAME_PARAM) else {
        return report(&ctx, bad_request("No name provided"), None, verbose);
    };
    let Some(qtype) = form.non_empty(TYPE_PARAM) else {
        return report(&ctx, bad_request("No query type provided"), None, verbose);
    };

    let mut query = ResolutionRequest::new(name, qtype).with_pretty(form.contains(PRETTY_PARAM));
    if let Some(content_type) = form.non_empty(CONTENT_TYPE_PARAM) {
        query = query.with_content_type(content_type);
    }
    let content_type = content_type_header(
        query.effective_content_type(&state.settings.content_type),
        &state.settings.content_type,
    );

    let body = match state.resolve.execute(&query).await {
        Ok(response) => match render_json(&response, query.pretty) {
            Ok(body) => {
                if verbose {
                    info!(
                        remote = %ctx.remote,
                        status = StatusCode::OK.as_u16(),
                        method = %ctx.method,
                        host = %ctx.host,
                        url = %ctx.uri,
                        answers = ?response.answer_data(),
                        "Resolved"
                    );
                }
                body
            }
            Err(e) => return report(&ctx, e.into(), Some(&content_type), verbose),
        },
        Err(e) => return report(&ctx, e.into(), Some(&content_type), verbose),
    };

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, content_type)],
        body,
    )
        .into_response()
}

fn bad_request(message: &str) -> ApiError {
    ApiError::BadRequest(message.to_string())
}

fn request_context(request: &Request) -> RequestContext {
    let remote = request
        .extensions()
        .get::<RemoteAddr>()
        .cloned()
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| RemoteAddr(addr.to_string()))
        })
        .unwrap_or_else(|| RemoteAddr("unknown".to_string()));

    let host = request
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
        .or_else(|| request.uri().authority().map(|a| a.to_string()))
        .unwrap_or_default();

    RequestContext {
        remote,
        method: request.method().clone(),
        host,
        uri: request.uri().clone(),
    }
}

/// Collects parameters from the query string and, for form submissions,
/// from the body.
async fn read_form(request: Request) -> Result<FormParams, FormError> {
    let query = request.uri().query().map(String::from);
    let (parts, body) = request.into_parts();

    let body = if carries_form_body(&parts.method, &parts.headers) {
        Some(read_body(&parts.headers, body).await?)
    } else {
        None
    };

    FormParams::parse(query.as_deref(), body.as_deref())
}

fn carries_form_body(method: &Method, headers: &HeaderMap) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
        && headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(is_form_content_type)
}

async fn read_body(headers: &HeaderMap, body: Body) -> Result<Vec<u8>, FormError> {
    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    if declared.is_some_and(|len| len > MAX_FORM_BODY as u64) {
        return Err(FormError::BodyTooLarge);
    }

    body::to_bytes(body, MAX_FORM_BODY)
        .await
        .map(|bytes| bytes.to_vec())
        .map_err(|e| FormError::BodyRead(e.to_string()))
}

/// Header value for the effective content type. A value that cannot be sent
/// as a header falls back to the configured default.
fn content_type_header(effective: &str, default: &str) -> HeaderValue {
    HeaderValue::from_str(effective)
        .or_else(|_| {
            debug!(content_type = %effective, "Unusable content type, using default");
            HeaderValue::from_str(default)
        })
        .unwrap_or_else(|_| HeaderValue::from_static("application/json"))
}
