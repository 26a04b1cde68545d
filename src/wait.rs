//! Polling with exponential backoff.
//!
//! CloudFormation stack operations take minutes; the deployer polls the stack
//! status with a growing, jittered delay until it reaches a terminal state.

use crate::error::{Error, Result};
use rand::Rng;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::debug;

/// Configuration for polling with exponential backoff.
#[derive(Debug, Clone)]
pub struct WaitConfig {
    /// Initial delay between checks
    pub initial_delay: Duration,
    /// Maximum delay between checks (cap for exponential growth)
    pub max_delay: Duration,
    /// Maximum total time to wait before timeout
    pub timeout: Duration,
    /// Jitter factor (0.0 - 1.0) to add randomness to delays
    pub jitter: f64,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(15),
            timeout: Duration::from_secs(30 * 60),
            jitter: 0.25,
        }
    }
}

impl WaitConfig {
    /// Create a new WaitConfig with the given timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Default::default()
        }
    }
}

/// Poll `check` until it yields a value.
///
/// `check` returns `Ok(Some(value))` when done and `Ok(None)` to keep
/// polling. Errors from `check` end the wait immediately. Running past
/// `config.timeout` yields [`Error::WaitTimeout`] for `stack`.
pub async fn poll_until<T, F, Fut>(config: &WaitConfig, stack: &str, mut check: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let start = Instant::now();
    let mut delay = config.initial_delay;
    let mut attempts = 0u32;

    loop {
        attempts += 1;

        if let Some(value) = check().await? {
            debug!(stack = %stack, attempts, "Wait finished");
            return Ok(value);
        }

        if start.elapsed() >= config.timeout {
            return Err(Error::WaitTimeout {
                stack: stack.to_string(),
                timeout_secs: config.timeout.as_secs(),
            });
        }

        let jittered = jittered_delay(delay, config.jitter);
        debug!(
            stack = %stack,
            attempt = attempts,
            delay_ms = jittered.as_millis() as u64,
            "Stack not settled, retrying"
        );
        tokio::time::sleep(jittered).await;

        delay = (delay * 2).min(config.max_delay);
    }
}

/// Add jitter to a duration.
fn jittered_delay(base: Duration, jitter_factor: f64) -> Duration {
    if jitter_factor <= 0.0 {
        return base;
    }
    let jitter = rand::thread_rng().gen_range(0.0..jitter_factor);
    Duration::from_secs_f64(base.as_secs_f64() * (1.0 + jitter))
}
