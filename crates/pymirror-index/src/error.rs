use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("invalid requirement: {0}")]
    InvalidRequirement(String),

    #[error("invalid metadata for {package}: {source}")]
    Malformed {
        package: String,
        #[source]
        source:  serde_json::Error,
    },

    #[error("metadata unavailable for {package}: {last_error}")]
    MetadataUnavailable { package: String, last_error: String },

    #[error(transparent)]
    Fetch(#[from] pymirror_fetch::FetchError),
}

pub type Result<T> = std::result::Result<T, IndexError>;
