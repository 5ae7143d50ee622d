//! Failsafe mechanisms: bounded retry with linear backoff

mod retry;

pub use retry::{DEFAULT_RETRY_DELAY, RetryPolicy, with_retry};
