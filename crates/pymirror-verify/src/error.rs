use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("failed to read {path}: {source}")]
    Read {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid {algorithm} digest: {value}")]
    InvalidDigest {
        algorithm: &'static str,
        value:     String,
    },

    #[error("hash worker stopped: {0}")]
    WorkerLost(String),
}

pub type Result<T> = std::result::Result<T, VerifyError>;
