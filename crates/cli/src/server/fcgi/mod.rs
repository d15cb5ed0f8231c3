//! FastCGI responder.
//!
//! Each connection runs one reader loop that assembles requests and one
//! writer task that owns the socket's write half. Requests are dispatched to
//! the router on their own tasks, so several request ids can be in flight on
//! one connection.

pub mod codec;
pub mod request;

use axum::Router;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, FramedWrite};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use tracing::{debug, info, warn};

use codec::{
    decode_pairs, encode_pairs, BeginRequest, FcgiCodec, ProtocolStatus, Record, RecordType,
    MANAGEMENT_REQUEST_ID, ROLE_RESPONDER,
};
use request::{cgi_output, PendingRequest};

const OUTGOING_QUEUE: usize = 64;

#[derive(Debug, Error)]
pub enum FcgiError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("unsupported FastCGI version {0}")]
    UnsupportedVersion(u8),

    #[error("record content of {0} bytes exceeds the FastCGI limit")]
    ContentTooLong(usize),

    #[error("malformed record: {0}")]
    Malformed(&'static str),

    #[error("missing CGI variable {0}")]
    MissingParam(&'static str),

    #[error("invalid CGI variable {0}: {1}")]
    InvalidParam(&'static str, String),

    #[error("unable to render response: {0}")]
    Response(String),
}

/// Where the FastCGI listener binds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FcgiBind {
    Tcp(SocketAddr),
    Unix(PathBuf),
}

impl FcgiBind {
    /// An address that resolves as `host:port` is TCP; anything else is a
    /// filesystem path for a Unix socket.
    pub async fn classify(addr: &str) -> Self {
        match tokio::net::lookup_host(addr).await {
            Ok(mut addrs) => match addrs.next() {
                Some(socket_addr) => FcgiBind::Tcp(socket_addr),
                None => FcgiBind::Unix(PathBuf::from(addr)),
            },
            Err(_) => FcgiBind::Unix(PathBuf::from(addr)),
        }
    }
}

pub async fn start_fcgi_server(
    addr: String,
    remove_socket: bool,
    router: Router,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    match FcgiBind::classify(&addr).await {
        FcgiBind::Tcp(socket_addr) => {
            let listener = TcpListener::bind(socket_addr).await?;
            info!(bind_address = %listener.local_addr()?, "Serving FastCGI requests");

            loop {
                let (stream, peer) = tokio::select! {
                    _ = shutdown.cancelled() => return Ok(()),
                    accepted = listener.accept() => accepted?,
                };
                spawn_connection(stream, peer.to_string(), router.clone(), shutdown.clone());
            }
        }
        FcgiBind::Unix(path) => serve_unix(&path, remove_socket, router, shutdown).await,
    }
}

#[cfg(unix)]
async fn serve_unix(
    path: &Path,
    remove_socket: bool,
    router: Router,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    use tokio::net::UnixListener;

    if remove_socket && path.exists() {
        std::fs::remove_file(path)?;
        debug!(path = %path.display(), "Removed existing FastCGI socket");
    }

    let listener = UnixListener::bind(path)?;
    let _guard = SocketPathGuard(path.to_path_buf());
    info!(bind_address = %path.display(), "Serving FastCGI requests");

    loop {
        let (stream, _) = tokio::select! {
            _ = shutdown.cancelled() => return Ok(()),
            accepted = listener.accept() => accepted?,
        };
        spawn_connection(stream, path.display().to_string(), router.clone(), shutdown.clone());
    }
}

#[cfg(not(unix))]
async fn serve_unix(
    path: &Path,
    _remove_socket: bool,
    _router: Router,
    _shutdown: CancellationToken,
) -> anyhow::Result<()> {
    anyhow::bail!(
        "FastCGI address {} is not host:port and Unix sockets are unavailable",
        path.display()
    )
}

/// Unlinks the socket path when the listener goes away.
#[cfg(unix)]
struct SocketPathGuard(PathBuf);

#[cfg(unix)]
impl Drop for SocketPathGuard {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.0) {
            warn!(path = %self.0.display(), error = %e, "Unable to remove FastCGI socket");
        }
    }
}

fn spawn_connection<S>(stream: S, peer: String, router: Router, shutdown: CancellationToken)
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = serve_connection(stream, router, shutdown).await {
            debug!(peer = %peer, error = %e, "FastCGI connection closed with error");
        }
    });
}

enum Outgoing {
    Record(Record),
    Close,
}

/// Serves one FastCGI connection until the peer closes it, a request
/// without `keep_conn` completes, or `shutdown` fires.
pub async fn serve_connection<S>(
    stream: S,
    router: Router,
    shutdown: CancellationToken,
) -> Result<(), FcgiError>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (reader, writer) = tokio::io::split(stream);
    let mut records = FramedRead::new(reader, FcgiCodec);
    let (tx, rx) = mpsc::channel(OUTGOING_QUEUE);
    let closed = CancellationToken::new();

    let writer_task = tokio::spawn(write_records(
        FramedWrite::new(writer, FcgiCodec),
        rx,
        closed.clone(),
    ));

    let mut pending: HashMap<u16, PendingRequest> = HashMap::new();
    let mut in_flight: HashMap<u16, CancellationToken> = HashMap::new();

    loop {
        let record = tokio::select! {
            _ = shutdown.cancelled() => {
                for cancel in in_flight.values() {
                    cancel.cancel();
                }
                break;
            }
            _ = closed.cancelled() => break,
            next = records.next() => match next {
                Some(record) => record?,
                None => break,
            },
        };
        let id = record.request_id;

        match record.record_type {
            RecordType::BeginRequest => {
                let begin = BeginRequest::parse(&record.content)?;
                if begin.role != ROLE_RESPONDER {
                    debug!(request_id = id, role = begin.role, "Rejecting non-responder role");
                    send(&tx, Record::end_request(id, 0, ProtocolStatus::UnknownRole)).await;
                    continue;
                }
                in_flight.remove(&id);
                pending.insert(id, PendingRequest::new(begin.keep_conn));
            }
            RecordType::Params => {
                if let Some(request) = pending.get_mut(&id) {
                    request.push_params(&record.content);
                }
            }
            RecordType::Stdin => {
                if !record.content.is_empty() {
                    if let Some(request) = pending.get_mut(&id) {
                        request.push_stdin(&record.content);
                    }
                } else if let Some(request) = pending.remove(&id) {
                    let cancel = CancellationToken::new();
                    in_flight.insert(id, cancel.clone());
                    tokio::spawn(respond(id, request, router.clone(), tx.clone(), cancel));
                }
            }
            RecordType::AbortRequest => {
                if pending.remove(&id).is_some() {
                    send(&tx, Record::end_request(id, 0, ProtocolStatus::RequestComplete)).await;
                } else if let Some(cancel) = in_flight.remove(&id) {
                    cancel.cancel();
                }
            }
            RecordType::GetValues => {
                send(&tx, get_values_result(&record.content)?).await;
            }
            RecordType::Other(unknown) => {
                send(&tx, Record::unknown_type(unknown)).await;
            }
            other if id == MANAGEMENT_REQUEST_ID => {
                send(&tx, Record::unknown_type(other.to_u8())).await;
            }
            other => {
                debug!(request_id = id, record_type = ?other, "Ignoring unexpected record");
            }
        }
    }

    // Requests still running hold their own sender; the writer drains them
    // before closing.
    drop(tx);
    let _ = writer_task.await;
    Ok(())
}

async fn write_records<W>(
    mut sink: FramedWrite<W, FcgiCodec>,
    mut rx: mpsc::Receiver<Outgoing>,
    closed: CancellationToken,
) where
    W: AsyncWrite + Send + Unpin,
{
    while let Some(outgoing) = rx.recv().await {
        match outgoing {
            Outgoing::Record(record) => {
                if let Err(e) = sink.send(record).await {
                    debug!(error = %e, "FastCGI write failed");
                    break;
                }
            }
            Outgoing::Close => break,
        }
    }
    let _ = sink.close().await;
    closed.cancel();
}

async fn send(tx: &mpsc::Sender<Outgoing>, record: Record) {
    // The writer only goes away once the connection is closing.
    let _ = tx.send(Outgoing::Record(record)).await;
}

fn get_values_result(content: &[u8]) -> Result<Record, FcgiError> {
    let asked = decode_pairs(content)?;
    let known: Vec<(&str, &str)> = asked
        .iter()
        .filter(|(name, _)| name == "FCGI_MPXS_CONNS")
        .map(|_| ("FCGI_MPXS_CONNS", "1"))
        .collect();
    Ok(Record::new(
        RecordType::GetValuesResult,
        MANAGEMENT_REQUEST_ID,
        encode_pairs(known),
    ))
}

async fn respond(
    id: u16,
    request: PendingRequest,
    router: Router,
    tx: mpsc::Sender<Outgoing>,
    cancel: CancellationToken,
) {
    let keep_conn = request.keep_conn;

    let output = match request.into_http() {
        Ok(http_request) => {
            let response = tokio::select! {
                _ = cancel.cancelled() => None,
                response = router.oneshot(http_request) => response.ok(),
            };
            match response {
                Some(response) => cgi_output(response).await,
                None => {
                    debug!(request_id = id, "FastCGI request aborted");
                    send(&tx, Record::end_request(id, 0, ProtocolStatus::RequestComplete)).await;
                    return;
                }
            }
        }
        Err(e) => Err(e),
    };

    match output {
        Ok(body) => {
            for record in Record::stream(RecordType::Stdout, id, body) {
                send(&tx, record).await;
            }
            send(&tx, Record::new(RecordType::Stdout, id, Bytes::new())).await;
            send(&tx, Record::end_request(id, 0, ProtocolStatus::RequestComplete)).await;
        }
        Err(e) => {
            warn!(request_id = id, error = %e, "Unable to serve FastCGI request");
            let message = Bytes::from(e.to_string());
            for record in Record::stream(RecordType::Stderr, id, message) {
                send(&tx, record).await;
            }
            send(&tx, Record::new(RecordType::Stderr, id, Bytes::new())).await;
            send(&tx, Record::end_request(id, 500, ProtocolStatus::RequestComplete)).await;
        }
    }

    if !keep_conn {
        let _ = tx.send(Outgoing::Close).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;
    use bytes::BytesMut;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio_util::codec::{Decoder, Encoder};

    fn router() -> Router {
        Router::new().route("/resolve", get(|| async { "ok" }))
    }

    fn begin(id: u16, role: u16, keep_conn: bool) -> Record {
        let mut body = vec![0u8; 8];
        body[..2].copy_from_slice(&role.to_be_bytes());
        body[2] = keep_conn as u8;
        Record::new(RecordType::BeginRequest, id, body)
    }

    fn request_records(id: u16, keep_conn: bool, uri: &str) -> Vec<Record> {
        vec![
            begin(id, ROLE_RESPONDER, keep_conn),
            Record::new(
                RecordType::Params,
                id,
                encode_pairs([("REQUEST_METHOD", "GET"), ("REQUEST_URI", uri)]),
            ),
            Record::new(RecordType::Params, id, Bytes::new()),
            Record::new(RecordType::Stdin, id, Bytes::new()),
        ]
    }

    /// Writes `input` to a fresh connection and returns every record written
    /// back until the server closes its side. With `half_close` the client
    /// also shuts down its write side after sending.
    async fn exchange(input: Vec<Record>, half_close: bool) -> Vec<Record> {
        let (client, server) = tokio::io::duplex(1 << 16);
        let task = tokio::spawn(serve_connection(server, router(), CancellationToken::new()));

        let (mut rd, mut wr) = tokio::io::split(client);
        let mut buf = BytesMut::new();
        for record in input {
            FcgiCodec.encode(record, &mut buf).unwrap();
        }
        wr.write_all(&buf).await.unwrap();
        if half_close {
            wr.shutdown().await.unwrap();
        }

        let mut raw = Vec::new();
        rd.read_to_end(&mut raw).await.unwrap();
        task.await.unwrap().unwrap();

        let mut raw = BytesMut::from(&raw[..]);
        let mut out = Vec::new();
        while let Some(record) = FcgiCodec.decode(&mut raw).unwrap() {
            out.push(record);
        }
        out
    }

    fn stdout_text(records: &[Record], id: u16) -> String {
        records
            .iter()
            .filter(|r| r.record_type == RecordType::Stdout && r.request_id == id)
            .map(|r| String::from_utf8_lossy(&r.content).into_owned())
            .collect()
    }

    #[tokio::test]
    async fn responds_and_closes_without_keep_conn() {
        let out = exchange(request_records(1, false, "/resolve"), false).await;

        let stdout = stdout_text(&out, 1);
        assert!(stdout.starts_with("Status: 200 OK\r\n"));
        assert!(stdout.contains("content-type: text/plain; charset=utf-8\r\n"));
        assert!(stdout.ends_with("\r\n\r\nok"));
        let last = out.last().unwrap();
        assert_eq!(last.record_type, RecordType::EndRequest);
        assert_eq!(&last.content[..5], &[0, 0, 0, 0, 0]);
    }

    #[tokio::test]
    async fn multiplexed_requests_on_one_connection() {
        let mut input = request_records(1, true, "/resolve");
        input.extend(request_records(2, true, "/missing"));

        let out = exchange(input, true).await;

        assert!(stdout_text(&out, 1).starts_with("Status: 200 OK\r\n"));
        assert!(stdout_text(&out, 2).starts_with("Status: 404 Not Found\r\n"));
        let ended: Vec<u16> = out
            .iter()
            .filter(|r| r.record_type == RecordType::EndRequest)
            .map(|r| r.request_id)
            .collect();
        assert!(ended.contains(&1) && ended.contains(&2));
    }

    #[tokio::test]
    async fn unknown_role_is_rejected() {
        let mut input = vec![begin(5, 2, true)];
        input.extend(request_records(6, false, "/resolve"));

        let out = exchange(input, false).await;

        let rejected = out.iter().find(|r| r.request_id == 5).unwrap();
        assert_eq!(rejected.record_type, RecordType::EndRequest);
        assert_eq!(rejected.content[4], ProtocolStatus::UnknownRole as u8);
    }

    #[tokio::test]
    async fn management_records() {
        let mut input = vec![
            Record::new(
                RecordType::GetValues,
                MANAGEMENT_REQUEST_ID,
                encode_pairs([("FCGI_MPXS_CONNS", ""), ("FCGI_MAX_REQS", "")]),
            ),
            Record::new(RecordType::Other(99), MANAGEMENT_REQUEST_ID, Bytes::new()),
        ];
        input.extend(request_records(1, false, "/resolve"));

        let out = exchange(input, false).await;

        let values = out
            .iter()
            .find(|r| r.record_type == RecordType::GetValuesResult)
            .unwrap();
        assert_eq!(
            decode_pairs(&values.content).unwrap(),
            vec![("FCGI_MPXS_CONNS".to_string(), "1".to_string())]
        );
        let unknown = out
            .iter()
            .find(|r| r.record_type == RecordType::UnknownType)
            .unwrap();
        assert_eq!(unknown.content[0], 99);
    }

    #[tokio::test]
    async fn abort_before_stdin_ends_request() {
        let mut input = vec![
            begin(3, ROLE_RESPONDER, true),
            Record::new(RecordType::AbortRequest, 3, Bytes::new()),
        ];
        input.extend(request_records(4, false, "/resolve"));

        let out = exchange(input, false).await;

        let aborted: Vec<&Record> = out.iter().filter(|r| r.request_id == 3).collect();
        assert_eq!(aborted.len(), 1);
        assert_eq!(aborted[0].record_type, RecordType::EndRequest);
    }

    #[tokio::test]
    async fn missing_method_reports_on_stderr() {
        let input = vec![
            begin(1, ROLE_RESPONDER, false),
            Record::new(
                RecordType::Params,
                1,
                encode_pairs([("REQUEST_URI", "/resolve")]),
            ),
            Record::new(RecordType::Params, 1, Bytes::new()),
            Record::new(RecordType::Stdin, 1, Bytes::new()),
        ];

        let out = exchange(input, false).await;

        let stderr: String = out
            .iter()
            .filter(|r| r.record_type == RecordType::Stderr)
            .map(|r| String::from_utf8_lossy(&r.content).into_owned())
            .collect();
        assert!(stderr.contains("REQUEST_METHOD"));
        let end = out.last().unwrap();
        assert_eq!(&end.content[..4], &500u32.to_be_bytes());
    }

    #[tokio::test]
    async fn classify_addresses() {
        assert_eq!(
            FcgiBind::classify("127.0.0.1:9000").await,
            FcgiBind::Tcp("127.0.0.1:9000".parse().unwrap())
        );
        assert_eq!(
            FcgiBind::classify("/run/dohgate/fcgi.sock").await,
            FcgiBind::Unix(PathBuf::from("/run/dohgate/fcgi.sock"))
        );
        assert_eq!(
            FcgiBind::classify("fcgi.sock").await,
            FcgiBind::Unix(PathBuf::from("fcgi.sock"))
        );
    }
}
