//! Leaky bucket admission control.
//!
//! Each admitted request occupies one slot. A background task drains `leak_count` slots every
//! interval; once all `capacity` slots are occupied further requests are rejected until the
//! next drain. Admission never blocks.

use crate::driver::PeriodicTask;
use crate::limiter::Admission;
use crate::{ConfigError, LeakyBucketConfig};
use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

#[derive(Debug)]
struct LeakyState {
    occupied: usize,
    closed: bool,
}

#[derive(Debug)]
struct LeakyShared {
    state: Mutex<LeakyState>,
    leak_count: usize,
}

impl LeakyShared {
    fn lock(&self) -> MutexGuard<'_, LeakyState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn leak(&self) -> ControlFlow<()> {
        let mut state = self.lock();
        if state.closed {
            return ControlFlow::Break(());
        }
        let leaked = self.leak_count.min(state.occupied);
        if leaked > 0 {
            state.occupied -= leaked;
            tracing::trace!(leaked, occupied = state.occupied, "leaky bucket drained");
        }
        ControlFlow::Continue(())
    }
}

/// Capacity-bounded leaky bucket drained by a per-instance background task.
///
/// Must be created inside a tokio runtime. Dropping the bucket stops it.
///
/// # Examples
/// ```
/// use ratelimiter::LeakyBucket;
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// // Holds 10 in-flight requests and drains 2 every 100ms.
/// let bucket = LeakyBucket::new(10, Duration::from_millis(100), 2).unwrap();
/// assert!(bucket.allow());
/// assert_eq!(bucket.current_size(), 1);
/// # }
/// ```
#[derive(Debug)]
pub struct LeakyBucket {
    shared: Arc<LeakyShared>,
    config: LeakyBucketConfig,
    driver: PeriodicTask,
}

impl LeakyBucket {
    /// Create an empty bucket holding up to `capacity` units and draining `leak_count` of them
    /// every `interval`.
    pub fn new(
        capacity: usize,
        interval: Duration,
        leak_count: usize,
    ) -> Result<Self, ConfigError> {
        Self::with_config(LeakyBucketConfig::new(capacity, interval)?.with_leak_count(leak_count)?)
    }

    /// Create a bucket from an explicit config and start its drain task.
    pub fn with_config(config: LeakyBucketConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let shared = Arc::new(LeakyShared {
            state: Mutex::new(LeakyState { occupied: 0, closed: false }),
            leak_count: config.leak_count(),
        });
        let driver = PeriodicTask::spawn(
            "leaky_bucket_drain",
            config.interval(),
            Arc::downgrade(&shared),
            LeakyShared::leak,
        )?;
        tracing::debug!(
            capacity = config.capacity(),
            interval = ?config.interval(),
            leak_count = config.leak_count(),
            "leaky bucket started"
        );
        Ok(Self { shared, config, driver })
    }

    /// Occupy one slot if the bucket has room. Never blocks.
    ///
    /// Returns `false` when the bucket is full or stopped.
    pub fn allow(&self) -> bool {
        let mut state = self.shared.lock();
        if state.closed || state.occupied >= self.config.capacity() {
            return false;
        }
        state.occupied += 1;
        true
    }

    /// Stop draining and reject all further admissions.
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
        tracing::debug!(capacity = self.config.capacity(), "leaky bucket stopped");
    }

    /// Whether [`stop`](Self::stop) has been called.
    pub fn is_stopped(&self) -> bool {
        self.shared.lock().closed
    }

    /// Occupied slots right now. Advisory: may change as soon as it is read.
    pub fn current_size(&self) -> usize {
        self.shared.lock().occupied
    }

    /// Maximum number of occupied slots.
    pub fn capacity(&self) -> usize {
        self.config.capacity()
    }

    /// Drain period.
    pub fn interval(&self) -> Duration {
        self.config.interval()
    }

    /// Slots freed per drain.
    pub fn leak_count(&self) -> usize {
        self.config.leak_count()
    }

    /// Configuration the bucket was built from.
    pub fn config(&self) -> &LeakyBucketConfig {
        &self.config
    }

    /// Whether the drain task has exited. Becomes true shortly after [`stop`](Self::stop).
    pub fn is_driver_finished(&self) -> bool {
        self.driver.is_finished()
    }
}

impl Drop for LeakyBucket {
    fn drop(&mut self) {
        self.stop();
    }
}

impl Admission for LeakyBucket {
    fn try_acquire(&self) -> bool {
        self.allow()
    }
}
