use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::data::obligation::DownloadOutcome;

/// Point-in-time view of a run's download progress.
///
/// This struct is passed to progress observers each time an obligation settles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProgressSnapshot {
    /// Obligations handed to the scheduler so far.
    pub total: u64,

    /// Obligations whose content was fetched and verified.
    pub downloaded: u64,

    /// Obligations satisfied without a fetch.
    pub skipped: u64,

    pub failed: u64,

    /// Bytes written to final destinations.
    pub bytes: u64,
}

impl ProgressSnapshot {
    pub fn settled(&self) -> u64 { self.downloaded + self.skipped + self.failed }
}

/// Callback invoked with a fresh snapshot after every settled obligation.
pub type ProgressObserver = Arc<dyn Fn(&ProgressSnapshot) + Send + Sync>;

/// Shared, lock-free counters for one run.
#[derive(Default)]
pub struct SyncProgress {
    total:      AtomicU64,
    downloaded: AtomicU64,
    skipped:    AtomicU64,
    failed:     AtomicU64,
    bytes:      AtomicU64,
    observer:   Option<ProgressObserver>,
}

impl fmt::Debug for SyncProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncProgress")
            .field("snapshot", &self.snapshot())
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

impl SyncProgress {
    pub fn new() -> Self { Self::default() }

    pub fn with_observer(observer: ProgressObserver) -> Self {
        Self {
            observer: Some(observer),
            ..Self::default()
        }
    }

    pub fn add_total(&self, count: u64) { self.total.fetch_add(count, Ordering::Relaxed); }

    pub fn record(&self, outcome: &DownloadOutcome) {
        match outcome {
            DownloadOutcome::Downloaded { bytes, .. } => {
                self.bytes.fetch_add(*bytes, Ordering::Relaxed);
                self.downloaded.fetch_add(1, Ordering::Relaxed);
            }
            DownloadOutcome::Skipped(_) => {
                self.skipped.fetch_add(1, Ordering::Relaxed);
            }
            DownloadOutcome::Failed { .. } => {
                self.failed.fetch_add(1, Ordering::Relaxed);
            }
        }
        if let Some(observer) = &self.observer {
            observer(&self.snapshot());
        }
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            total:      self.total.load(Ordering::Relaxed),
            downloaded: self.downloaded.load(Ordering::Relaxed),
            skipped:    self.skipped.load(Ordering::Relaxed),
            failed:     self.failed.load(Ordering::Relaxed),
            bytes:      self.bytes.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::obligation::{FailureReason, SkipReason};
    use crate::error::FetchError;
    use std::sync::Mutex;

    #[test]
    fn counts_each_outcome_kind() {
        let progress = SyncProgress::new();
        progress.add_total(3);
        progress.record(&DownloadOutcome::Downloaded {
            attempts: 1,
            bytes:    10,
            url:      "https://pypi.example/a.whl".into(),
        });
        progress.record(&DownloadOutcome::Skipped(SkipReason::HashMatched));
        progress.record(&DownloadOutcome::Failed {
            reason:     FailureReason::RetriesExhausted,
            last_error: FetchError::Transport("HTTP 503".into()),
            attempts:   5,
        });

        let snapshot = progress.snapshot();
        assert_eq!(snapshot.total, 3);
        assert_eq!(snapshot.settled(), 3);
        assert_eq!(snapshot.bytes, 10);
        assert_eq!(snapshot.failed, 1);
    }

    #[test]
    fn observer_sees_every_settlement() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let progress = SyncProgress::with_observer(Arc::new(move |s: &ProgressSnapshot| {
            sink.lock().unwrap().push(s.settled());
        }));
        progress.add_total(2);
        progress.record(&DownloadOutcome::Skipped(SkipReason::DryRun));
        progress.record(&DownloadOutcome::Skipped(SkipReason::DryRun));
        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }
}
