//! Per-instance periodic task that drives refill and drain.
//!
//! Each bucket owns exactly one [`PeriodicTask`]. The task holds only a [`Weak`] reference to
//! the bucket's shared state, so it never keeps a dropped bucket alive, and it exits as soon as
//! the tick handler reports [`ControlFlow::Break`], the weak reference dies, or [`cancel`]
//! is called.
//!
//! [`cancel`]: PeriodicTask::cancel

use crate::ConfigError;
use std::ops::ControlFlow;
use std::sync::Weak;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Handle to a recurring background task running on the tokio runtime it was spawned from.
#[derive(Debug)]
pub struct PeriodicTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl PeriodicTask {
    /// Spawn `on_tick` to run every `period` against `target`.
    ///
    /// The first tick fires one full period after this call. Ticks missed because the runtime
    /// was busy are skipped rather than replayed in a burst.
    ///
    /// Errors with [`ConfigError::ZeroInterval`] for a zero period and
    /// [`ConfigError::NoRuntime`] when called outside a tokio runtime.
    pub fn spawn<T, F>(
        name: &'static str,
        period: Duration,
        target: Weak<T>,
        mut on_tick: F,
    ) -> Result<Self, ConfigError>
    where
        T: Send + Sync + 'static,
        F: FnMut(&T) -> ControlFlow<()> + Send + 'static,
    {
        if period.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        let runtime = Handle::try_current().map_err(|_| ConfigError::NoRuntime)?;

        let cancel = CancellationToken::new();
        let stop = cancel.clone();
        let first_tick = deadline_after(Instant::now(), period);

        let handle = runtime.spawn(async move {
            let mut ticker = time::interval_at(first_tick, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            tracing::debug!(task = name, period = ?period, "periodic task started");

            loop {
                tokio::select! {
                    biased;
                    _ = stop.cancelled() => break,
                    _ = ticker.tick() => {
                        let Some(target) = target.upgrade() else { break };
                        if on_tick(&*target).is_break() {
                            break;
                        }
                    }
                }
            }

            tracing::debug!(task = name, "periodic task exited");
        });

        Ok(Self { cancel, handle })
    }

    /// Ask the task to exit. Idempotent and safe to call from any thread.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Whether the background task has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// `start + period`, clamped to a far-future instant when the sum overflows.
pub(crate) fn deadline_after(start: Instant, period: Duration) -> Instant {
    start.checked_add(period).unwrap_or_else(|| start + FAR_FUTURE)
}

// Roughly 30 years, the same horizon tokio uses for unbounded sleeps.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
