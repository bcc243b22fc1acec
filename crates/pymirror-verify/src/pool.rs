//! Bounded worker pool for digest work.
//!
//! Hashing large artifacts is CPU and disk bound. Jobs run on tokio's blocking
//! thread pool, gated by a semaphore so that at most `size` files are hashed at
//! once, independently of how many network operations are in flight.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::digest::{Digest, DigestAlgorithm};
use crate::error::{Result, VerifyError};
use crate::file;

/// Upper bound on hash workers regardless of core count.
pub const MAX_WORKERS: usize = 32;

/// Workers per available core.
pub const WORKERS_PER_CORE: usize = 4;

#[derive(Clone, Debug)]
pub struct HashPool {
    permits: Arc<Semaphore>,
    size:    usize,
}

impl Default for HashPool {
    fn default() -> Self { Self::new(Self::default_size()) }
}

impl HashPool {
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    /// `min(32, 4 * available_parallelism)`.
    pub fn default_size() -> usize {
        let cores = std::thread::available_parallelism().map_or(1, NonZeroUsize::get);
        cores.saturating_mul(WORKERS_PER_CORE).min(MAX_WORKERS)
    }

    pub fn size(&self) -> usize { self.size }

    /// Stream `path` through a hasher on a pool worker.
    pub async fn digest_of(&self, path: &Path, algorithm: DigestAlgorithm) -> Result<Digest> {
        let path = path.to_path_buf();
        self.run(move || file::digest_of(&path, algorithm)).await?
    }

    /// Pool-backed [`file::is_valid`].
    pub async fn is_valid(&self, path: &Path, expected: &Digest) -> bool {
        let path: PathBuf = path.to_path_buf();
        let expected = expected.clone();
        match self.run(move || file::is_valid(&path, &expected)).await {
            Ok(valid) => valid,
            Err(e) => {
                tracing::warn!(error = %e, "hash worker failed");
                false
            }
        }
    }

    async fn run<T, F>(&self, job: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|e| VerifyError::WorkerLost(e.to_string()))?;

        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            job()
        })
        .await
        .map_err(|e| VerifyError::WorkerLost(e.to_string()))
    }
}
