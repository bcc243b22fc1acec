//! Data layer: immutable types describing what to fetch and what happened.

pub mod obligation;
pub mod options;
pub mod progress;

pub use obligation::{Completed, DownloadObligation, DownloadOutcome, FailureReason, SkipReason};
pub use options::{DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_CONCURRENCY, FetchOptions};
pub use progress::{ProgressObserver, ProgressSnapshot, SyncProgress};
