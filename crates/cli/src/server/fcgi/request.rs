use axum::body::Body;
use bytes::{BufMut, Bytes, BytesMut};
use dohgate_api::utils::MAX_FORM_BODY;
use dohgate_api::RemoteAddr;
use http::{header, HeaderName, HeaderValue, Method, Request, Response, Version};
use http_body_util::BodyExt;

use super::FcgiError;

/// Largest STDIN stream kept per request. One byte above the form body cap
/// so an oversized body is still seen as oversized downstream.
pub const MAX_STDIN: usize = MAX_FORM_BODY + 1;

/// One request being assembled from BEGIN_REQUEST, PARAMS and STDIN records.
#[derive(Debug)]
pub struct PendingRequest {
    pub keep_conn: bool,
    params: BytesMut,
    stdin: BytesMut,
}

impl PendingRequest {
    pub fn new(keep_conn: bool) -> Self {
        Self {
            keep_conn,
            params: BytesMut::new(),
            stdin: BytesMut::new(),
        }
    }

    pub fn push_params(&mut self, content: &[u8]) {
        self.params.extend_from_slice(content);
    }

    pub fn push_stdin(&mut self, content: &[u8]) {
        let room = MAX_STDIN.saturating_sub(self.stdin.len());
        self.stdin
            .extend_from_slice(&content[..content.len().min(room)]);
    }

    pub fn into_http(self) -> Result<Request<Body>, FcgiError> {
        let params = super::codec::decode_pairs(&self.params)?;
        build_request(&params, self.stdin.freeze())
    }
}

fn param<'a>(params: &'a [(String, String)], name: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
        .filter(|v| !v.is_empty())
}

/// Maps CGI variables onto an HTTP request.
pub fn build_request(params: &[(String, String)], body: Bytes) -> Result<Request<Body>, FcgiError> {
    let method = param(params, "REQUEST_METHOD").ok_or(FcgiError::MissingParam("REQUEST_METHOD"))?;
    let method = Method::from_bytes(method.as_bytes())
        .map_err(|_| FcgiError::InvalidParam("REQUEST_METHOD", method.to_string()))?;

    let uri = match param(params, "REQUEST_URI") {
        Some(uri) => uri.to_string(),
        None => {
            let mut uri = format!(
                "{}{}",
                param(params, "SCRIPT_NAME").unwrap_or(""),
                param(params, "PATH_INFO").unwrap_or("")
            );
            if uri.is_empty() {
                uri.push('/');
            }
            if let Some(query) = param(params, "QUERY_STRING") {
                uri.push('?');
                uri.push_str(query);
            }
            uri
        }
    };

    let version = match param(params, "SERVER_PROTOCOL") {
        Some("HTTP/1.0") => Version::HTTP_10,
        Some("HTTP/2") | Some("HTTP/2.0") => Version::HTTP_2,
        _ => Version::HTTP_11,
    };

    let mut builder = Request::builder().method(method).uri(&uri).version(version);

    for (name, value) in params {
        let header_name = match name.as_str() {
            "CONTENT_TYPE" => Some(header::CONTENT_TYPE),
            "CONTENT_LENGTH" => Some(header::CONTENT_LENGTH),
            other => other
                .strip_prefix("HTTP_")
                .and_then(|h| HeaderName::from_bytes(h.replace('_', "-").as_bytes()).ok()),
        };
        if let (Some(header_name), Ok(value)) = (header_name, HeaderValue::from_str(value)) {
            if !value.is_empty() {
                builder = builder.header(header_name, value);
            }
        }
    }

    if let Some(remote) = remote_addr(params) {
        builder = builder.extension(remote);
    }

    builder
        .body(Body::from(body))
        .map_err(|e| FcgiError::InvalidParam("REQUEST_URI", format!("{}: {}", uri, e)))
}

fn remote_addr(params: &[(String, String)]) -> Option<RemoteAddr> {
    let addr = param(params, "REMOTE_ADDR")?;
    let remote = match param(params, "REMOTE_PORT") {
        Some(port) if addr.contains(':') => format!("[{}]:{}", addr, port),
        Some(port) => format!("{}:{}", addr, port),
        None => addr.to_string(),
    };
    Some(RemoteAddr(remote))
}

/// Renders a response as CGI output: a `Status:` line, headers, a blank
/// line, then the body.
pub async fn cgi_output(response: Response<Body>) -> Result<Bytes, FcgiError> {
    let (parts, body) = response.into_parts();
    let body = body
        .collect()
        .await
        .map_err(|e| FcgiError::Response(e.to_string()))?
        .to_bytes();

    let mut out = BytesMut::with_capacity(128 + body.len());
    out.put_slice(
        format!(
            "Status: {} {}\r\n",
            parts.status.as_u16(),
            parts.status.canonical_reason().unwrap_or("")
        )
        .as_bytes(),
    );
    for (name, value) in &parts.headers {
        out.put_slice(name.as_str().as_bytes());
        out.put_slice(b": ");
        out.put_slice(value.as_bytes());
        out.put_slice(b"\r\n");
    }
    out.put_slice(b"\r\n");
    out.put_slice(&body);
    Ok(out.freeze())
}
