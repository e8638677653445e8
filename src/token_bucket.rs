//! Token bucket that refills one token per interval from a background task.
//!
//! The bucket starts full. Every successful acquisition removes one token; the bucket's
//! [`PeriodicTask`] adds one back each interval until `capacity` is reached. Blocking
//! acquisition re-polls once per interval until it succeeds or the caller cancels.

use crate::driver::{deadline_after, PeriodicTask};
use crate::limiter::{Admission, RateLimiter};
use crate::{AcquireError, ConfigError, TokenBucketConfig};
use async_trait::async_trait;
use std::future::Future;
use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
struct TokenState {
    tokens: usize,
    closed: bool,
}

#[derive(Debug)]
struct TokenShared {
    state: Mutex<TokenState>,
    capacity: usize,
}

impl TokenShared {
    fn lock(&self) -> MutexGuard<'_, TokenState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn refill(&self) -> ControlFlow<()> {
        let mut state = self.lock();
        if state.closed {
            return ControlFlow::Break(());
        }
        if state.tokens < self.capacity {
            state.tokens += 1;
            tracing::trace!(tokens = state.tokens, capacity = self.capacity, "token refilled");
        }
        ControlFlow::Continue(())
    }
}

/// Capacity-bounded token bucket refilled by a per-instance background task.
///
/// Must be created inside a tokio runtime. Share it between tasks with `Arc`. Dropping the
/// bucket stops it.
///
/// # Examples
/// ```
/// use ratelimiter::TokenBucket;
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let bucket = TokenBucket::new(2, Duration::from_millis(200)).unwrap();
/// assert!(bucket.try_acquire());
/// assert!(bucket.try_acquire());
/// assert!(!bucket.try_acquire());
/// bucket.stop();
/// # }
/// ```
#[derive(Debug)]
pub struct TokenBucket {
    shared: Arc<TokenShared>,
    config: TokenBucketConfig,
    driver: PeriodicTask,
}

impl TokenBucket {
    /// Create a full bucket holding `capacity` tokens, refilled by one token every `interval`.
    pub fn new(capacity: usize, interval: Duration) -> Result<Self, ConfigError> {
        Self::with_config(TokenBucketConfig::new(capacity, interval)?)
    }

    /// Create a bucket from an explicit config and start its refill task.
    pub fn with_config(config: TokenBucketConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let shared = Arc::new(TokenShared {
            state: Mutex::new(TokenState { tokens: config.capacity(), closed: false }),
            capacity: config.capacity(),
        });
        let driver = PeriodicTask::spawn(
            "token_bucket_refill",
            config.interval(),
            Arc::downgrade(&shared),
            TokenShared::refill,
        )?;
        tracing::debug!(
            capacity = config.capacity(),
            interval = ?config.interval(),
            "token bucket started"
        );
        Ok(Self { shared, config, driver })
    }

    /// Take one token if one is available right now. Never blocks.
    ///
    /// Returns `false` when the bucket is empty or stopped.
    pub fn try_acquire(&self) -> bool {
        let mut state = self.shared.lock();
        if state.closed || state.tokens == 0 {
            return false;
        }
        state.tokens -= 1;
        true
    }

    /// Take one token, waiting for a refill if none is available.
    ///
    /// Re-polls once per refill interval until a token is obtained or `cancel` fires. The
    /// cancellation is checked before every retry. Returns [`AcquireError::Stopped`] once the
    /// bucket is stopped.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<(), AcquireError> {
        self.acquire_until(cancel.cancelled()).await
    }

    /// Like [`acquire`](Self::acquire), giving up after `timeout`.
    pub async fn acquire_timeout(&self, timeout: Duration) -> Result<(), AcquireError> {
        self.acquire_until(time::sleep(timeout)).await
    }

    async fn acquire_until<F>(&self, cancelled: F) -> Result<(), AcquireError>
    where
        F: Future<Output = ()>,
    {
        if self.try_acquire() {
            return Ok(());
        }

        let started = Instant::now();
        let period = self.config.interval();
        let mut poll = time::interval_at(deadline_after(started, period), period);
        poll.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(cancelled);

        loop {
            if self.is_stopped() {
                return Err(AcquireError::Stopped);
            }
            tokio::select! {
                biased;
                () = &mut cancelled => {
                    let waited = started.elapsed();
                    tracing::debug!(waited = ?waited, "token acquisition cancelled");
                    return Err(AcquireError::Cancelled { waited });
                }
                _ = poll.tick() => {
                    if self.try_acquire() {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Stop refilling and reject all further acquisitions.
    ///
    /// Idempotent and safe to call concurrently with any other operation.
    pub fn stop(&self) {
        {
            let mut state = self.shared.lock();
            if state.closed {
                return;
            }
            state.closed = true;
        }
        self.driver.cancel();
        tracing::debug!(capacity = self.config.capacity(), "token bucket stopped");
    }

    /// Whether [`stop`](Self::stop) has been called.
    pub fn is_stopped(&self) -> bool {
        self.shared.lock().closed
    }

    /// Tokens currently in the bucket. Advisory: may change as soon as it is read.
    pub fn available(&self) -> usize {
        self.shared.lock().tokens
    }

    /// Maximum number of tokens.
    pub fn capacity(&self) -> usize {
        self.config.capacity()
    }

    /// Refill period.
    pub fn interval(&self) -> Duration {
        self.config.interval()
    }

    /// Configuration the bucket was built from.
    pub fn config(&self) -> &TokenBucketConfig {
        &self.config
    }

    /// Whether the refill task has exited. Becomes true shortly after [`stop`](Self::stop).
    pub fn is_driver_finished(&self) -> bool {
        self.driver.is_finished()
    }
}

impl Drop for TokenBucket {
    fn drop(&mut self) {
        self.stop();
    }
}

impl Admission for TokenBucket {
    fn try_acquire(&self) -> bool {
        TokenBucket::try_acquire(self)
    }
}

#[async_trait]
impl RateLimiter for TokenBucket {
    async fn acquire(&self, cancel: &CancellationToken) -> Result<(), AcquireError> {
        TokenBucket::acquire(self, cancel).await
    }
}
