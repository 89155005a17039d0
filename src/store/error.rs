use std::path::PathBuf;

use thiserror::Error;

use crate::types::SessionId;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to create store directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error while {operation} {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid sequence number {0}: sequence numbers start at 1")]
    InvalidSeqNum(u64),

    #[error("sequence number {0} cannot be incremented without overflowing")]
    SeqNumOverflow(u64),

    #[error("store is closed; refresh it before use")]
    Closed,

    #[error("corrupt header line {line} in {path}: {content:?}")]
    CorruptHeader {
        path: PathBuf,
        line: usize,
        content: String,
    },

    #[error(
        "header line {line} in {path} points past the end of the body file \
         (offset {offset}, length {length}, body size {body_len})"
    )]
    DanglingEntry {
        path: PathBuf,
        line: usize,
        offset: u64,
        length: u64,
        body_len: u64,
    },

    #[error("message visitor stopped replay: {0}")]
    Visitor(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("invalid session id {0:?}")]
    InvalidSessionId(String),

    #[error("unknown session: {0}")]
    UnknownSession(SessionId),

    #[error("invalid store configuration: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    #[must_use]
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    /// Wrap an error raised by a replay visitor
    #[must_use]
    pub fn visitor<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Visitor(error.into())
    }
}
