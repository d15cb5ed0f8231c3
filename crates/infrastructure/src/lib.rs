//! dohgate Infrastructure Layer
pub mod dns;
