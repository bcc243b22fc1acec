use std::sync::Arc;
use std::time::Duration;

/// Default admission gate size shared by every obligation of a run.
pub const DEFAULT_MAX_CONCURRENCY: usize = 256;

/// Attempts per obligation, mirror rotations included.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Configuration for downloading and scheduling.
///
/// # Examples
///
/// ```
/// use pymirror_fetch::FetchOptions;
/// use std::time::Duration;
///
/// let options = FetchOptions::default()
///     .max_concurrency(32)
///     .retry_backoff(Duration::from_millis(50))
///     .header("Accept", "*/*");
/// assert_eq!(options.max_attempts, 5);
/// ```
#[derive(Clone, Debug)]
pub struct FetchOptions {
    /// Size of the admission gate. Default: 256.
    pub max_concurrency: usize,

    /// Total attempts per obligation across retries and mirrors. Default: 5.
    pub max_attempts: u32,

    /// Base delay for exponential backoff between attempts. Default: 250ms.
    pub retry_backoff: Duration,

    /// Time allowed to receive response headers, per attempt. Default: 60s.
    pub connect_timeout: Duration,

    /// Longest allowed gap between body chunks, per attempt. Default: 60s.
    pub read_timeout: Duration,

    /// Plan every obligation without touching network or disk.
    pub dry_run: bool,

    /// Extra headers sent with every download request.
    pub headers: Arc<[(String, String)]>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            max_attempts:    DEFAULT_MAX_ATTEMPTS,
            retry_backoff:   Duration::from_millis(250),
            connect_timeout: Duration::from_secs(60),
            read_timeout:    Duration::from_secs(60),
            dry_run:         false,
            headers:         Arc::new([]),
        }
    }
}

impl FetchOptions {
    #[must_use]
    pub fn max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    #[must_use]
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    #[must_use]
    pub fn retry_backoff(mut self, retry_backoff: Duration) -> Self {
        self.retry_backoff = retry_backoff;
        self
    }

    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    #[must_use]
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Add a single custom HTTP header.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut headers: Vec<_> = self.headers.iter().cloned().collect();
        headers.push((key.into(), value.into()));
        self.headers = Arc::from(headers);
        self
    }
}
