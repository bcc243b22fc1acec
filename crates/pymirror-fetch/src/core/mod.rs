//! Core layer: pure retry arithmetic.

mod retry;

pub use retry::{RetryBudget, retry_delay};
