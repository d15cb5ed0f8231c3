use std::fmt;

/// Address value that turns a listener off.
pub const DISABLED_SENTINEL: &str = "no";

/// A listener address as configured: either off, or the raw address string.
///
/// The string is kept unparsed because the FastCGI listener accepts both
/// `host:port` and filesystem paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenAddr {
    Disabled,
    Enabled(String),
}

impl ListenAddr {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() || raw == DISABLED_SENTINEL {
            ListenAddr::Disabled
        } else {
            ListenAddr::Enabled(raw.to_string())
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, ListenAddr::Enabled(_))
    }

    pub fn address(&self) -> Option<&str> {
        match self {
            ListenAddr::Disabled => None,
            ListenAddr::Enabled(addr) => Some(addr),
        }
    }
}

impl fmt::Display for ListenAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenAddr::Disabled => f.write_str(DISABLED_SENTINEL),
            ListenAddr::Enabled(addr) => f.write_str(addr),
        }
    }
}
