//! Error types for pymirror-fetch.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("no mirrors configured")]
    NoMirrors,

    #[error("invalid mirror URL: {0}")]
    InvalidMirror(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timeout after {0:?}")]
    Timeout(Duration),

    #[error("digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },

    #[error("filesystem error at {path}: {source}")]
    Filesystem {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("download task aborted: {0}")]
    TaskAborted(String),
}

impl FetchError {
    pub(crate) fn fs(path: impl Into<PathBuf>, source: io::Error) -> Self {
        FetchError::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Whether another attempt (possibly against another mirror) can help.
    ///
    /// Local filesystem failures and configuration errors are fatal for the
    /// obligation; everything network- or content-related is retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FetchError::Transport(_)
                | FetchError::Timeout(_)
                | FetchError::DigestMismatch { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(FetchError::Transport("HTTP 500".into()).is_retryable());
        assert!(FetchError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(
            FetchError::DigestMismatch {
                expected: "a".into(),
                actual:   "b".into(),
            }
            .is_retryable()
        );
        assert!(!FetchError::fs("/tmp/x", io::Error::other("read-only")).is_retryable());
        assert!(!FetchError::NoMirrors.is_retryable());
    }
}
