use std::time::Duration;

/// Delay before retry number `retry_count` (0-indexed) using exponential backoff.
///
/// The delay formula is `base * 2^retry_count`, saturating instead of overflowing.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use pymirror_fetch::retry_delay;
///
/// assert_eq!(retry_delay(0, Duration::from_millis(100)), Duration::from_millis(100));
/// assert_eq!(retry_delay(1, Duration::from_millis(100)), Duration::from_millis(200));
/// assert_eq!(retry_delay(2, Duration::from_millis(100)), Duration::from_millis(400));
/// ```
pub fn retry_delay(retry_count: u32, base: Duration) -> Duration {
    let multiplier = 2_u32.saturating_pow(retry_count);
    base.saturating_mul(multiplier)
}

/// Budget of attempts for one obligation, counting mirror rotations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryBudget {
    max_attempts: u32,
    used:         u32,
}

impl RetryBudget {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            used:         0,
        }
    }

    /// Consume one attempt, returning its 1-based number, or `None` when spent.
    pub fn take(&mut self) -> Option<u32> {
        if self.used >= self.max_attempts {
            return None;
        }
        self.used += 1;
        Some(self.used)
    }

    pub fn used(&self) -> u32 { self.used }

    pub fn has_remaining(&self) -> bool { self.used < self.max_attempts }
}
