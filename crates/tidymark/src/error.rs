//! Error types shared across the crate.

use std::path::PathBuf;

/// The reviewer (or a process interrupt) asked to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cancelled by user")]
pub struct Cancelled;

/// Failure talking to the bookmark service.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("service rejected the request: {0}")]
    Rejected(String),
    #[error("invalid request URL: {0}")]
    Url(String),
}

/// Failure obtaining a completion from the language model.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to parse response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("API error: {0}")]
    Api(String),
    #[error("empty completion")]
    Empty,
}

/// Failure reading or writing a durable session record.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("state file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode session record: {0}")]
    Encode(#[from] serde_json::Error),
}

impl StateError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StateError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors that end a cleanup run early.
#[derive(Debug, thiserror::Error)]
pub enum CleanupError {
    /// Stopped by the reviewer or by an interrupt. State was checkpointed.
    #[error("cleanup cancelled; progress saved")]
    Cancelled,
    /// A checkpoint could not be written.
    #[error(transparent)]
    State(#[from] StateError),
}

impl From<Cancelled> for CleanupError {
    fn from(_: Cancelled) -> Self {
        CleanupError::Cancelled
    }
}

impl CleanupError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CleanupError::Cancelled)
    }
}
