//! Error types for bucket construction, blocking acquisition and admission middleware
use std::time::Duration;

/// Failure of a blocking acquisition.
///
/// Running out of units on the non-blocking path is not an error; it is reported as `false`.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireError {
    /// The caller's cancellation signal (token or deadline) fired before a unit became available.
    #[error("cancelled after waiting {waited:?} for a token")]
    Cancelled {
        /// Time spent waiting before the cancellation was observed.
        waited: Duration,
    },
    /// The bucket has been stopped and will never hand out another unit.
    ///
    /// Cancellation-equivalent: [`is_cancelled`](Self::is_cancelled) is true for it too, so
    /// callers that only handle cancellation treat a stopped bucket the same way.
    #[error("rate limiter is stopped")]
    Stopped,
}

impl AcquireError {
    /// Check if the acquisition gave up without a unit. True for every variant; use
    /// [`is_stopped`](Self::is_stopped) or [`waited`](Self::waited) to tell them apart.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. } | Self::Stopped)
    }

    /// Check if the acquisition was refused because the bucket is stopped.
    pub fn is_stopped(&self) -> bool {
        matches!(self, Self::Stopped)
    }

    /// Time waited before cancellation, if this is a `Cancelled` error.
    pub fn waited(&self) -> Option<Duration> {
        match self {
            Self::Cancelled { waited } => Some(*waited),
            Self::Stopped => None,
        }
    }
}

/// Errors produced when validating bucket configuration or starting its driver.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The tick interval must be non-zero.
    #[error("interval must be > 0")]
    ZeroInterval,
    /// A leaky bucket must drain at least one unit per tick.
    #[error("leak_count must be >= 1 (got 0)")]
    ZeroLeakCount,
    /// Buckets spawn their driver on the ambient tokio runtime.
    #[error("no tokio runtime available to drive the bucket")]
    NoRuntime,
}

/// Outcome of a request passing through [`AdmissionLayer`](crate::AdmissionLayer).
#[derive(thiserror::Error, Debug)]
pub enum AdmissionError<E> {
    /// The limiter had no room; the inner service was not called.
    #[error("too many requests")]
    Rejected,
    /// The inner service failed.
    #[error(transparent)]
    Inner(E),
}

impl<E> AdmissionError<E> {
    /// Check if the request was turned away by the limiter.
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected)
    }

    /// Get the inner error if this is an `Inner` variant.
    pub fn into_inner(self) -> Option<E> {
        match self {
            Self::Inner(e) => Some(e),
            Self::Rejected => None,
        }
    }
}
