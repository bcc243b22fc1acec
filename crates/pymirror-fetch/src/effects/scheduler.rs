//! Bounded-concurrency download scheduling.
//!
//! Every obligation of a run passes through one admission gate, so the number
//! of in-flight downloads never exceeds `max_concurrency` regardless of how
//! many packages contributed obligations. Each obligation settles into exactly
//! one [`DownloadOutcome`].

use std::sync::Arc;

use futures_util::{FutureExt, StreamExt, stream::FuturesUnordered};
use pymirror_verify::HashPool;
use tokio::sync::Semaphore;

use crate::core::{RetryBudget, retry_delay};
use crate::data::{Completed, DownloadObligation, DownloadOutcome, FailureReason, SkipReason, SyncProgress};
use crate::effects::fetcher::Fetcher;
use crate::effects::http::HttpClient;
use crate::error::FetchError;
use crate::mirror::MirrorRegistry;

pub struct DownloadScheduler<C: HttpClient> {
    fetcher:  Arc<Fetcher<C>>,
    registry: Arc<MirrorRegistry>,
    hashes:   HashPool,
    gate:     Arc<Semaphore>,
    progress: Arc<SyncProgress>,
}

impl<C: HttpClient> Clone for DownloadScheduler<C> {
    fn clone(&self) -> Self {
        Self {
            fetcher:  Arc::clone(&self.fetcher),
            registry: Arc::clone(&self.registry),
            hashes:   self.hashes.clone(),
            gate:     Arc::clone(&self.gate),
            progress: Arc::clone(&self.progress),
        }
    }
}

impl<C: HttpClient> DownloadScheduler<C> {
    pub fn new(fetcher: Fetcher<C>, registry: Arc<MirrorRegistry>) -> Self {
        let permits = fetcher.options().max_concurrency.max(1);
        Self {
            fetcher: Arc::new(fetcher),
            registry,
            hashes: HashPool::default(),
            gate: Arc::new(Semaphore::new(permits)),
            progress: Arc::new(SyncProgress::new()),
        }
    }

    #[must_use]
    pub fn with_hash_pool(mut self, hashes: HashPool) -> Self {
        self.hashes = hashes;
        self
    }

    #[must_use]
    pub fn with_progress(mut self, progress: Arc<SyncProgress>) -> Self {
        self.progress = progress;
        self
    }

    pub fn progress(&self) -> &Arc<SyncProgress> { &self.progress }

    pub fn registry(&self) -> &Arc<MirrorRegistry> { &self.registry }

    /// Permits currently free in the admission gate.
    pub fn available_permits(&self) -> usize { self.gate.available_permits() }

    /// URL the first attempt of `obligation` would use.
    pub fn planned_url(&self, obligation: &DownloadObligation) -> String {
        self.registry.cursor().current().file_url(&obligation.url)
    }

    /// Settle every obligation, returning outcomes in input order.
    ///
    /// Obligations run as independent tasks; a task that panics is reported as
    /// [`FailureReason::Aborted`] and never affects its siblings.
    pub async fn run(&self, obligations: Vec<DownloadObligation>) -> Vec<Completed> {
        self.progress.add_total(obligations.len() as u64);

        let mut tasks: FuturesUnordered<_> = obligations
            .iter()
            .cloned()
            .enumerate()
            .map(|(index, obligation)| {
                let this = self.clone();
                tokio::spawn(async move { this.settle(&obligation).await }).map(move |joined| (index, joined))
            })
            .collect();

        let mut outcomes: Vec<Option<DownloadOutcome>> = (0..obligations.len()).map(|_| None).collect();
        while let Some((index, joined)) = tasks.next().await {
            let outcome = joined.unwrap_or_else(|e| {
                tracing::error!(file = %obligations[index].filename, error = %e, "download task aborted");
                let outcome = aborted(e.to_string());
                self.progress.record(&outcome);
                outcome
            });
            outcomes[index] = Some(outcome);
        }

        obligations
            .into_iter()
            .zip(outcomes)
            .map(|(obligation, outcome)| Completed {
                obligation,
                outcome: outcome.unwrap_or_else(|| aborted("task never settled".into())),
            })
            .collect()
    }

    /// Settle a single obligation under the shared gate and record it.
    pub async fn settle(&self, obligation: &DownloadObligation) -> DownloadOutcome {
        let outcome = match self.gate.acquire().await {
            Ok(_permit) => self.execute(obligation).await,
            Err(e) => aborted(e.to_string()),
        };
        self.progress.record(&outcome);
        outcome
    }

    async fn execute(&self, obligation: &DownloadObligation) -> DownloadOutcome {
        let options = self.fetcher.options();
        let file = obligation.filename.as_str();

        if options.dry_run {
            return DownloadOutcome::Skipped(SkipReason::DryRun);
        }

        if let Some(expected) = &obligation.digest
            && self.hashes.is_valid(&obligation.destination, expected).await
        {
            tracing::debug!(file, "digest matches, skipping");
            return DownloadOutcome::Skipped(SkipReason::HashMatched);
        }

        let mut budget = RetryBudget::new(options.max_attempts);
        let mut cursor = self.registry.cursor();
        let mut last_error = None;

        while let Some(attempt) = budget.take() {
            let mirror = cursor.current();
            let url = mirror.file_url(&obligation.url);
            tracing::trace!(file, mirror = mirror.base(), attempt, "download attempt");

            match self.fetcher.attempt(&url, obligation).await {
                Ok(bytes) => {
                    tracing::info!(file, mirror = mirror.base(), attempt, bytes, "downloaded");
                    return DownloadOutcome::Downloaded {
                        attempts: attempt,
                        bytes,
                        url,
                    };
                }
                Err(e) if !e.is_retryable() => {
                    tracing::error!(file, error = %e, "download failed");
                    let reason = match e {
                        FetchError::Filesystem { .. } => FailureReason::Filesystem,
                        _ => FailureReason::Aborted,
                    };
                    return DownloadOutcome::Failed {
                        reason,
                        last_error: e,
                        attempts: attempt,
                    };
                }
                Err(e) => {
                    tracing::warn!(file, mirror = mirror.base(), attempt, error = %e, "download attempt failed");
                    last_error = Some(e);
                    if budget.has_remaining() {
                        if !cursor.advance() {
                            cursor.rewind();
                        }
                        tokio::time::sleep(retry_delay(attempt - 1, options.retry_backoff)).await;
                    }
                }
            }
        }

        let attempts = budget.used();
        tracing::error!(file, attempts, "download failed after all attempts");
        DownloadOutcome::Failed {
            reason: FailureReason::RetriesExhausted,
            last_error: last_error.unwrap_or_else(|| FetchError::TaskAborted("no attempt made".into())),
            attempts,
        }
    }
}

fn aborted(message: String) -> DownloadOutcome {
    DownloadOutcome::Failed {
        reason:     FailureReason::Aborted,
        last_error: FetchError::TaskAborted(message),
        attempts:   0,
    }
}
