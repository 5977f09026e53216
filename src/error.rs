use thiserror::Error;

/// Errors surfaced to callers of the aggregation layer.
///
/// Upstream fetch failures are deliberately absent here: fetchers absorb
/// them into `None`/empty values so a degraded report is still a valid
/// result. Only request validation and local I/O reach the caller as errors.
#[derive(Debug, Error)]
pub enum IntelError {
    #[error("invalid CVE identifier: {0}")]
    InvalidCveId(String),

    #[error("too many CVE identifiers: {given} (maximum {max})")]
    TooManyIds { given: usize, max: usize },

    #[error("unsupported file format: {0}. Use TXT or CSV")]
    UnsupportedFormat(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
