// src/error.rs
//! Error taxonomy for one pipeline run.
//!
//! Per-article and per-topic failures are absorbed where they happen and show
//! up in the `RunOutcome`; only an empty digest (and setup errors) surface as
//! `Err` from the pipeline itself.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DigestError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("feed parse error: {0}")]
    Parse(String),

    #[error("source unavailable for topic {topic}: {reason}")]
    SourceUnavailable { topic: String, reason: String },

    #[error("empty digest: no entries survived filtering")]
    EmptyDigest,

    #[error("{kind} sink failed: {reason}")]
    Sink {
        kind: &'static str,
        reason: String,
        permanent: bool,
    },

    #[error("history commit failed: {0}")]
    HistoryCommit(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DigestError {
    /// Whether another attempt could plausibly succeed. Auth failures and
    /// malformed payloads are permanent; network trouble is not.
    pub fn is_transient(&self) -> bool {
        match self {
            DigestError::Http(e) => {
                if e.is_timeout() || e.is_connect() {
                    return true;
                }
                match e.status() {
                    Some(s) => s.is_server_error() || s.as_u16() == 408 || s.as_u16() == 429,
                    // No HTTP status means the transport gave up mid-flight.
                    None => true,
                }
            }
            DigestError::Sink { permanent, .. } => !permanent,
            DigestError::Io(_) => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, DigestError>;
