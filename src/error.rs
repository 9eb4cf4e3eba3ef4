//! Error types for the synthesis client library.

use thiserror::Error;

/// Error type for all synthesis client operations.
///
/// Each variant identifies one failure class so callers can decide whether to
/// retry, back off, or give up. [`Error::is_retryable`] encodes that policy
/// hint; the client itself never retries.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid construction parameters, e.g. an empty voice name or a zero
    /// sample rate.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Credential rejected by the remote service.
    #[error("authentication rejected: {0}")]
    Auth(String),

    /// Connection failed or dropped mid-stream.
    #[error("network error: {0}")]
    Network(String),

    /// Rate or usage limit exceeded.
    #[error("quota exceeded: {0}")]
    Quota(String),

    /// The service rejected the text/voice combination.
    #[error("synthesis rejected: {0}")]
    Synthesis(String),

    /// Local storage failure while writing the output file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Out-of-order or malformed chunk sequence from the transport.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// API misuse, e.g. finalizing a sink twice.
    #[error("invalid state: {0}")]
    State(String),
}

impl Error {
    /// Returns true if the whole operation may be retried by the caller.
    ///
    /// Quota errors additionally warrant a backoff before the retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Network(_) | Error::Quota(_))
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for Error {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        Error::Network(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Network(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Protocol(e.to_string())
    }
}
