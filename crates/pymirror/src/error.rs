use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SyncError>;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    #[error(transparent)]
    Figment(#[from] Box<figment::Error>),

    #[error("config file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("requirements file not found: {0}")]
    RequirementsNotFound(PathBuf),

    #[error("failed to access {path}: {source}")]
    Io {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An external resolver or index builder is missing or exited non-zero.
    #[error("{tool} is unavailable: {reason}")]
    CollaboratorUnavailable { tool: String, reason: String },

    #[error(transparent)]
    Fetch(#[from] pymirror_fetch::FetchError),
}

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to open log file {path}: {source}")]
    LogFile {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to install log subscriber: {0}")]
    SubscriberInit(#[from] tracing_subscriber::util::TryInitError),
}

impl SyncError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SyncError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<figment::Error> for SyncError {
    fn from(e: figment::Error) -> Self { SyncError::Figment(Box::new(e)) }
}
