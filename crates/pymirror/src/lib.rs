//! Bulk synchronization of package index artifacts into a local directory,
//! for building offline mirrors.
//!
//! A run reads a requirements file (optionally resolved by an external
//! resolver first), fetches each package's metadata with mirror fallback,
//! selects versions, filters files by wheel tags and downloads what is missing
//! or stale under one shared concurrency gate. Every requirement ends with a
//! [`SyncStatus`].

pub mod aggregate;
pub mod cli;
pub mod collab;
pub mod config;
pub mod logging;
pub mod report;
pub mod sync;

mod error;

pub use aggregate::{PackageSyncResult, SyncStatus, Tally, any_failed};
pub use collab::{IndexBuilder, Resolver, requirements_text};
pub use config::{Overrides, Settings};
pub use error::{LoggingError, Result, SyncError};
pub use sync::{PackagePlan, SyncReport, Synchronizer, write_url_list};
