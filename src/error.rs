//! Construction-time validation errors (§7).
//!
//! `process_packet` itself never returns an error: malformed or unrecognized
//! packets are silently dropped with a log line. Only `BeaconTracker`
//! construction can fail, on clearly invalid configuration.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("exponent K must be in 0..=15, got {0}")]
    InvalidExponent(u8),
    #[error("window_size must be >= 1, got {0}")]
    InvalidWindowSize(usize),
    #[error("identity_key must be 16 bytes, got {0}")]
    InvalidKeyLength(usize),
}
