//! Mirror-aware artifact downloading with bounded concurrency and retry.
//!
//! # Architecture
//!
//! This crate follows the three-layer pattern:
//! - [`data`] - Immutable obligations, outcomes and options
//! - [`core`] - Pure retry arithmetic
//! - [`effects`] - I/O operations with trait abstraction
//!
//! [`mirror`] holds the registry of index mirrors and the per-operation
//! cursors used for fallback.
//!
//! # Key Features
//!
//! - **Single-Pass**: bodies are hashed while streaming to a staging file
//! - **Atomic Placement**: verified files are renamed into place, failed ones removed
//! - **Shared Gate**: one semaphore bounds every download of a run
//! - **Mirror Fallback**: each retry moves to the next mirror, wrapping around

pub mod core;
pub mod data;
pub mod effects;
pub mod mirror;

mod error;

pub use core::{RetryBudget, retry_delay};
pub use data::{
    Completed, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_CONCURRENCY, DownloadObligation, DownloadOutcome, FailureReason,
    FetchOptions, ProgressObserver, ProgressSnapshot, SkipReason, SyncProgress,
};
#[cfg(feature = "reqwest")]
pub use effects::ReqwestClient;
pub use effects::{BodyStream, BoxStream, DownloadScheduler, Fetcher, HttpClient, PIP_USER_AGENT};
pub use error::{FetchError, Result};
pub use mirror::{Mirror, MirrorCursor, MirrorKind, MirrorRegistry, OFFICIAL_INDEX, WELL_KNOWN_MIRRORS};
