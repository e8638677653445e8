//! Capability contract shared by the bucket implementations.
//!
//! - [`Admission`]: the non-blocking attempt. Both buckets implement it, so hot-path callers
//!   (like [`AdmissionLayer`](crate::AdmissionLayer)) can be backed by either.
//! - [`RateLimiter`]: adds the blocking attempt with cancellation. Only buckets that can
//!   promise a future unit implement it.

use crate::AcquireError;
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Non-blocking admission check.
pub trait Admission: Send + Sync {
    /// Take one unit if one is available right now. `false` means reject or back off.
    fn try_acquire(&self) -> bool;
}

/// Admission with an additional blocking attempt.
#[async_trait]
pub trait RateLimiter: Admission {
    /// Wait for one unit until it is obtained or `cancel` fires.
    async fn acquire(&self, cancel: &CancellationToken) -> Result<(), AcquireError>;
}

impl<L: Admission + ?Sized> Admission for Arc<L> {
    fn try_acquire(&self) -> bool {
        (**self).try_acquire()
    }
}

impl<L: Admission + ?Sized> Admission for &L {
    fn try_acquire(&self) -> bool {
        (**self).try_acquire()
    }
}

#[async_trait]
impl<L: RateLimiter + ?Sized> RateLimiter for Arc<L> {
    async fn acquire(&self, cancel: &CancellationToken) -> Result<(), AcquireError> {
        (**self).acquire(cancel).await
    }
}
