//! Per-package terminal status.
//!
//! Ratios are always taken against the filtered obligation count, never the
//! raw number of files the index lists for a package.

use std::fmt;

use pymirror_fetch::DownloadOutcome;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SyncStatus {
    Synchronized,
    PartialSync,
    Failed,

    /// Nothing left after version selection and tag filtering.
    NoFiles,
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SyncStatus::Synchronized => "Synchronized",
            SyncStatus::PartialSync => "Partial Sync",
            SyncStatus::Failed => "Failed",
            SyncStatus::NoFiles => "No Files",
        };
        f.write_str(s)
    }
}

/// Outcome counts for one package.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tally {
    pub downloaded: usize,
    pub skipped:    usize,
    pub failed:     usize,
}

impl Tally {
    pub fn record(&mut self, outcome: &DownloadOutcome) {
        match outcome {
            DownloadOutcome::Downloaded { .. } => self.downloaded += 1,
            DownloadOutcome::Skipped(_) => self.skipped += 1,
            DownloadOutcome::Failed { .. } => self.failed += 1,
        }
    }

    pub fn succeeded(&self) -> usize { self.downloaded + self.skipped }

    pub fn settled(&self) -> usize { self.succeeded() + self.failed }
}

impl<'a> FromIterator<&'a DownloadOutcome> for Tally {
    fn from_iter<I: IntoIterator<Item = &'a DownloadOutcome>>(iter: I) -> Self {
        let mut tally = Tally::default();
        for outcome in iter {
            tally.record(outcome);
        }
        tally
    }
}

pub fn status_for(filtered: usize, tally: &Tally) -> SyncStatus {
    if filtered == 0 {
        SyncStatus::NoFiles
    } else if tally.failed == 0 && tally.succeeded() == filtered {
        SyncStatus::Synchronized
    } else if tally.succeeded() > 0 {
        SyncStatus::PartialSync
    } else {
        SyncStatus::Failed
    }
}

/// One row of the run summary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackageSyncResult {
    pub package:  String,
    pub version:  String,
    pub status:   SyncStatus,
    pub filtered: usize,
    pub tally:    Tally,
    pub details:  String,
}

impl PackageSyncResult {
    pub fn from_outcomes<'a>(
        package: impl Into<String>,
        version: impl Into<String>,
        filtered: usize,
        outcomes: impl IntoIterator<Item = &'a DownloadOutcome>,
    ) -> Self {
        let tally: Tally = outcomes.into_iter().collect();
        let status = status_for(filtered, &tally);
        let details = match status {
            SyncStatus::Synchronized => format!("All {filtered} file(s) processed"),
            SyncStatus::PartialSync => format!("{}/{filtered} file(s) processed", tally.succeeded()),
            SyncStatus::Failed => format!("No files downloaded (0/{filtered})"),
            SyncStatus::NoFiles => "No downloadable files found for this version".to_string(),
        };
        Self {
            package: package.into(),
            version: version.into(),
            status,
            filtered,
            tally,
            details,
        }
    }

    /// Every mirror failed to supply metadata.
    pub fn metadata_unavailable(package: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            package:  package.into(),
            version:  version.into(),
            status:   SyncStatus::Failed,
            filtered: 0,
            tally:    Tally::default(),
            details:  "Failed to fetch metadata".to_string(),
        }
    }

    /// `succeeded/filtered`, e.g. `93/93`.
    pub fn ratio(&self) -> String { format!("{}/{}", self.tally.succeeded(), self.filtered) }

    pub fn is_failure(&self) -> bool { self.status == SyncStatus::Failed }
}

pub fn any_failed(results: &[PackageSyncResult]) -> bool { results.iter().any(PackageSyncResult::is_failure) }
