use axum::{
    http::{header, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use dohgate_domain::DomainError;
use thiserror::Error;
use tracing::info;

use crate::state::RemoteAddr;
use crate::utils::{ErrorCode, FormError};

const PLAIN_TEXT: &str = "text/plain; charset=utf-8";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("404 page not found")]
    NotFound,

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("{0}")]
    Serialization(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Domain(DomainError::UnsupportedType(_)) => StatusCode::NOT_IMPLEMENTED,
            ApiError::Domain(_) | ApiError::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Client-caused errors carry their message to the client; all others
    /// are redacted.
    pub fn is_client_error(&self) -> bool {
        matches!(self, ApiError::NotFound | ApiError::BadRequest(_))
    }
}

impl From<FormError> for ApiError {
    fn from(err: FormError) -> Self {
        ApiError::BadRequest(format!("Parse error: {}", err))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Serialization(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if self.is_client_error() {
            (status, format!("{}\n", self)).into_response()
        } else {
            redacted_response(status, &ErrorCode::generate(), None)
        }
    }
}

/// Request line details attached to verbose log entries.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub remote: RemoteAddr,
    pub method: Method,
    pub host: String,
    pub uri: Uri,
}

/// Turns a failed request into its client response.
///
/// Client errors are returned as-is. Everything else is replaced by a fresh
/// [`ErrorCode`]; when `verbose` is set the real message is logged next to
/// that code so an operator can correlate the two.
pub fn report(
    ctx: &RequestContext,
    err: ApiError,
    content_type: Option<&HeaderValue>,
    verbose: bool,
) -> Response {
    let status = err.status_code();

    if err.is_client_error() {
        if verbose {
            info!(
                remote = %ctx.remote,
                status = status.as_u16(),
                method = %ctx.method,
                host = %ctx.host,
                url = %ctx.uri,
                error = %err,
                "Rejected request"
            );
        }
        return err.into_response();
    }

    let code = ErrorCode::generate();
    if verbose {
        info!(
            remote = %ctx.remote,
            status = status.as_u16(),
            method = %ctx.method,
            host = %ctx.host,
            url = %ctx.uri,
            error = %err,
            error_number = %code,
            "Request failed"
        );
    }
    redacted_response(status, &code, content_type)
}

fn redacted_response(
    status: StatusCode,
    code: &ErrorCode,
    content_type: Option<&HeaderValue>,
) -> Response {
    let content_type = content_type
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static(PLAIN_TEXT));

    (
        status,
        [
            (header::CONTENT_TYPE, content_type),
            (
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ),
        ],
        format!("Error number {}\n", code),
    )
        .into_response()
}
