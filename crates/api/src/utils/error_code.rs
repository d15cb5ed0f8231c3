use ring::error::Unspecified;
use ring::rand::{SecureRandom, SystemRandom};
use std::fmt;
use tracing::warn;

pub const ERROR_CODE_LEN: usize = 8;

/// Random token shown to clients in place of an error message and logged
/// next to the real one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorCode([u8; ERROR_CODE_LEN]);

impl ErrorCode {
    pub fn generate() -> Self {
        let rng = SystemRandom::new();
        Self::from_source(|buf| rng.fill(buf))
    }

    /// Fills a fresh code from `fill`. A failing source leaves the code
    /// zeroed; the failure is logged and otherwise ignored.
    pub fn from_source<F>(fill: F) -> Self
    where
        F: FnOnce(&mut [u8]) -> Result<(), Unspecified>,
    {
        let mut buf = [0u8; ERROR_CODE_LEN];
        if fill(&mut buf).is_err() {
            warn!("Unable to read random bytes for error number");
            buf = [0u8; ERROR_CODE_LEN];
        }
        Self(buf)
    }

    pub fn as_bytes(&self) -> &[u8; ERROR_CODE_LEN] {
        &self.0
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}
