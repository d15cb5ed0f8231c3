//! Record framing for the FastCGI protocol, version 1.
//!
//! Every record is an 8-byte header (version, type, request id, content
//! length, padding length, reserved) followed by the content and padding.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::trace;

use super::FcgiError;

pub const FCGI_VERSION_1: u8 = 1;
pub const HEADER_LEN: usize = 8;
pub const MAX_CONTENT_LEN: usize = u16::MAX as usize;

pub const ROLE_RESPONDER: u16 = 1;
pub const FLAG_KEEP_CONN: u8 = 1;

pub const MANAGEMENT_REQUEST_ID: u16 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
    BeginRequest,
    AbortRequest,
    EndRequest,
    Params,
    Stdin,
    Stdout,
    Stderr,
    Data,
    GetValues,
    GetValuesResult,
    UnknownType,
    Other(u8),
}

impl RecordType {
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => RecordType::BeginRequest,
            2 => RecordType::AbortRequest,
            3 => RecordType::EndRequest,
            4 => RecordType::Params,
            5 => RecordType::Stdin,
            6 => RecordType::Stdout,
            7 => RecordType::Stderr,
            8 => RecordType::Data,
            9 => RecordType::GetValues,
            10 => RecordType::GetValuesResult,
            11 => RecordType::UnknownType,
            other => RecordType::Other(other),
        }
    }

    pub fn to_u8(self) -> u8 {
        match self {
            RecordType::BeginRequest => 1,
            RecordType::AbortRequest => 2,
            RecordType::EndRequest => 3,
            RecordType::Params => 4,
            RecordType::Stdin => 5,
            RecordType::Stdout => 6,
            RecordType::Stderr => 7,
            RecordType::Data => 8,
            RecordType::GetValues => 9,
            RecordType::GetValuesResult => 10,
            RecordType::UnknownType => 11,
            RecordType::Other(other) => other,
        }
    }
}

/// `protocolStatus` of an END_REQUEST record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolStatus {
    RequestComplete = 0,
    UnknownRole = 3,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub record_type: RecordType,
    pub request_id: u16,
    pub content: Bytes,
}

impl Record {
    pub fn new(record_type: RecordType, request_id: u16, content: impl Into<Bytes>) -> Self {
        Self {
            record_type,
            request_id,
            content: content.into(),
        }
    }

    pub fn end_request(request_id: u16, app_status: u32, status: ProtocolStatus) -> Self {
        let mut body = BytesMut::with_capacity(8);
        body.put_u32(app_status);
        body.put_u8(status as u8);
        body.put_bytes(0, 3);
        Self::new(RecordType::EndRequest, request_id, body.freeze())
    }

    pub fn unknown_type(record_type: u8) -> Self {
        let mut body = BytesMut::with_capacity(8);
        body.put_u8(record_type);
        body.put_bytes(0, 7);
        Self::new(RecordType::UnknownType, MANAGEMENT_REQUEST_ID, body.freeze())
    }

    /// Splits `data` into records of at most [`MAX_CONTENT_LEN`] bytes. The
    /// empty record that closes a stream is not included.
    pub fn stream(record_type: RecordType, request_id: u16, data: Bytes) -> Vec<Self> {
        let mut records = Vec::with_capacity(data.len() / MAX_CONTENT_LEN + 1);
        let mut rest = data;
        while !rest.is_empty() {
            let chunk = rest.split_to(rest.len().min(MAX_CONTENT_LEN));
            records.push(Self::new(record_type, request_id, chunk));
        }
        records
    }
}

/// Body of a BEGIN_REQUEST record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeginRequest {
    pub role: u16,
    pub keep_conn: bool,
}

impl BeginRequest {
    pub fn parse(content: &[u8]) -> Result<Self, FcgiError> {
        if content.len() < 8 {
            return Err(FcgiError::Malformed("short BEGIN_REQUEST body"));
        }
        Ok(Self {
            role: u16::from_be_bytes([content[0], content[1]]),
            keep_conn: content[2] & FLAG_KEEP_CONN != 0,
        })
    }
}

/// Decodes a run of FastCGI name-value pairs.
pub fn decode_pairs(mut content: &[u8]) -> Result<Vec<(String, String)>, FcgiError> {
    let mut pairs = Vec::new();
    while content.has_remaining() {
        let name_len = read_length(&mut content)?;
        let value_len = read_length(&mut content)?;
        if content.remaining() < name_len + value_len {
            return Err(FcgiError::Malformed("truncated name-value pair"));
        }
        let name = String::from_utf8_lossy(&content[..name_len]).into_owned();
        let value = String::from_utf8_lossy(&content[name_len..name_len + value_len]).into_owned();
        content.advance(name_len + value_len);
        pairs.push((name, value));
    }
    Ok(pairs)
}

pub fn encode_pairs<'a, I>(pairs: I) -> Bytes
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut out = BytesMut::new();
    for (name, value) in pairs {
        write_length(&mut out, name.len());
        write_length(&mut out, value.len());
        out.put_slice(name.as_bytes());
        out.put_slice(value.as_bytes());
    }
    out.freeze()
}

fn read_length(content: &mut &[u8]) -> Result<usize, FcgiError> {
    if !content.has_remaining() {
        return Err(FcgiError::Malformed("missing pair length"));
    }
    if content[0] & 0x80 == 0 {
        return Ok(content.get_u8() as usize);
    }
    if content.remaining() < 4 {
        return Err(FcgiError::Malformed("truncated pair length"));
    }
    Ok((content.get_u32() & 0x7fff_ffff) as usize)
}

fn write_length(out: &mut BytesMut, len: usize) {
    if len < 0x80 {
        out.put_u8(len as u8);
    } else {
        out.put_u32(len as u32 | 0x8000_0000);
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FcgiCodec;

impl Decoder for FcgiCodec {
    type Item = Record;
    type Error = FcgiError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Record>, FcgiError> {
        if src.len() < HEADER_LEN {
            return Ok(None);
        }

        let version = src[0];
        if version != FCGI_VERSION_1 {
            return Err(FcgiError::UnsupportedVersion(version));
        }

        let content_len = u16::from_be_bytes([src[4], src[5]]) as usize;
        let padding_len = src[6] as usize;
        let total = HEADER_LEN + content_len + padding_len;
        if src.len() < total {
            src.reserve(total - src.len());
            return Ok(None);
        }

        let record_type = RecordType::from_u8(src[1]);
        let request_id = u16::from_be_bytes([src[2], src[3]]);
        src.advance(HEADER_LEN);
        let content = src.split_to(content_len).freeze();
        src.advance(padding_len);

        trace!(?record_type, request_id, content_len, "decoded record");
        Ok(Some(Record {
            record_type,
            request_id,
            content,
        }))
    }
}

impl Encoder<Record> for FcgiCodec {
    type Error = FcgiError;

    fn encode(&mut self, record: Record, dst: &mut BytesMut) -> Result<(), FcgiError> {
        let content_len = record.content.len();
        if content_len > MAX_CONTENT_LEN {
            return Err(FcgiError::ContentTooLong(content_len));
        }
        let padding_len = (8 - content_len % 8) % 8;

        dst.reserve(HEADER_LEN + content_len + padding_len);
        dst.put_u8(FCGI_VERSION_1);
        dst.put_u8(record.record_type.to_u8());
        dst.put_u16(record.request_id);
        dst.put_u16(content_len as u16);
        dst.put_u8(padding_len as u8);
        dst.put_u8(0);
        dst.put_slice(&record.content);
        dst.put_bytes(0, padding_len);
        Ok(())
    }
}
