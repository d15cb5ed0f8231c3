use thiserror::Error;

/// Largest urlencoded request body read for parameters.
pub const MAX_FORM_BODY: usize = 10 << 20;

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("invalid URL escape \"{0}\"")]
    InvalidEscape(String),

    #[error("invalid semicolon separator in query")]
    Semicolon,

    #[error("request body too large")]
    BodyTooLarge,

    #[error("unable to read request body: {0}")]
    BodyRead(String),

    #[error("{0}")]
    Decode(String),
}

/// Request parameters merged from an urlencoded body and the URL query.
///
/// Body pairs are stored first, so for a key present in both the body value
/// is the one [`FormParams::get`] returns.
#[derive(Debug, Default, Clone)]
pub struct FormParams {
    pairs: Vec<(String, String)>,
}

impl FormParams {
    pub fn parse(query: Option<&str>, body: Option<&[u8]>) -> Result<Self, FormError> {
        let mut pairs = Vec::new();

        if let Some(body) = body {
            let text = std::str::from_utf8(body)
                .map_err(|e| FormError::Decode(e.to_string()))?;
            pairs.extend(decode(text)?);
        }
        if let Some(query) = query {
            pairs.extend(decode(query)?);
        }

        Ok(Self { pairs })
    }

    /// First value for `key`, or `None` when the key is absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// First value for `key` unless it is absent or empty.
    pub fn non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty())
    }

    /// Whether `key` appeared at all, even with an empty value.
    pub fn contains(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }
}

/// True when a `Content-Type` header value names an urlencoded form.
pub fn is_form_content_type(value: &str) -> bool {
    value
        .split(';')
        .next()
        .map(|mime| mime.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE))
        .unwrap_or(false)
}

fn decode(input: &str) -> Result<Vec<(String, String)>, FormError> {
    validate(input)?;
    serde_urlencoded::from_str::<Vec<(String, String)>>(input)
        .map_err(|e| FormError::Decode(e.to_string()))
}

/// Rejects what a lenient decoder would silently accept: `%` not followed by
/// two hex digits, and `;` used as a pair separator.
fn validate(input: &str) -> Result<(), FormError> {
    let bytes = input.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let valid = bytes.len() > i + 2
                    && bytes[i + 1].is_ascii_hexdigit()
                    && bytes[i + 2].is_ascii_hexdigit();
                if !valid {
                    let end = (i + 3).min(bytes.len());
                    let escape = String::from_utf8_lossy(&bytes[i..end]).into_owned();
                    return Err(FormError::InvalidEscape(escape));
                }
                i += 3;
            }
            b';' => return Err(FormError::Semicolon),
            _ => i += 1,
        }
    }
    Ok(())
}
