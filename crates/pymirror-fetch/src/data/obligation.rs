use std::fmt;
use std::path::PathBuf;

use pymirror_verify::Digest;

use crate::error::FetchError;

/// One file the engine has decided to fetch or verify in this run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadObligation {
    /// Artifact filename, also the last component of `destination`.
    pub filename:    String,

    /// Download URL as published by the index, before mirror rewriting.
    pub url:         String,

    /// Declared content digest, if the index published one.
    pub digest:      Option<Digest>,

    /// Declared size in bytes, informational.
    pub size:        Option<u64>,

    pub destination: PathBuf,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// The destination already holds content matching the declared digest.
    HashMatched,

    /// Dry run: the obligation was planned but not executed.
    DryRun,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureReason {
    /// Every attempt in the retry budget failed.
    RetriesExhausted,

    /// The destination could not be created or written.
    Filesystem,

    /// The task driving the obligation did not complete.
    Aborted,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::RetriesExhausted => write!(f, "retries exhausted"),
            FailureReason::Filesystem => write!(f, "filesystem error"),
            FailureReason::Aborted => write!(f, "aborted"),
        }
    }
}

/// Terminal result of one obligation.
#[derive(Debug)]
pub enum DownloadOutcome {
    Downloaded {
        attempts: u32,
        bytes:    u64,

        /// Mirror URL that served the file.
        url:      String,
    },
    Skipped(SkipReason),
    Failed {
        reason:     FailureReason,
        last_error: FetchError,
        attempts:   u32,
    },
}

impl DownloadOutcome {
    pub fn is_success(&self) -> bool { !matches!(self, DownloadOutcome::Failed { .. }) }

    /// Network attempts spent on this obligation.
    pub fn attempts(&self) -> u32 {
        match self {
            DownloadOutcome::Downloaded { attempts, .. } | DownloadOutcome::Failed { attempts, .. } => *attempts,
            DownloadOutcome::Skipped(_) => 0,
        }
    }
}

/// An obligation paired with its outcome.
#[derive(Debug)]
pub struct Completed {
    pub obligation: DownloadObligation,
    pub outcome:    DownloadOutcome,
}
