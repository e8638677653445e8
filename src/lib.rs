#![forbid(unsafe_code)]
#![cfg_attr(not(test), deny(clippy::all))]

//! # ratelimiter
//!
//! Interval-driven admission control for async Rust.
//!
//! ## Features
//!
//! - **Token bucket**: starts full, refills one token per interval, offers non-blocking
//!   [`try_acquire`](TokenBucket::try_acquire) and cancellable blocking
//!   [`acquire`](TokenBucket::acquire)
//! - **Leaky bucket**: starts empty, drains a fixed batch per interval, offers non-blocking
//!   [`allow`](LeakyBucket::allow) plus occupancy introspection
//! - **Background driver**: each bucket owns one tokio task that applies the refill or drain
//!   under the bucket's mutex and stops exactly once
//! - **Tower middleware**: [`AdmissionLayer`] rejects requests a limiter has no room for
//!
//! ## Quick Start
//!
//! ```rust
//! use ratelimiter::{RateLimiter, TokenBucket};
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() {
//!     // Up to 5 immediate requests, then one more every 200ms.
//!     let limiter = TokenBucket::new(5, Duration::from_millis(200)).unwrap();
//!
//!     if !limiter.try_acquire() {
//!         // reject: too many requests
//!     }
//!
//!     // Or wait for a token, giving up after one second.
//!     let cancel = CancellationToken::new();
//!     let _ = limiter.acquire_timeout(Duration::from_secs(1)).await;
//!     let _ = RateLimiter::acquire(&limiter, &cancel).await;
//!
//!     limiter.stop();
//! }
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod layer;
pub mod leaky_bucket;
pub mod limiter;
pub mod prelude;
pub mod token_bucket;

// Re-exports
pub use config::{LeakyBucketConfig, TokenBucketConfig};
pub use driver::PeriodicTask;
pub use error::{AcquireError, AdmissionError, ConfigError};
pub use layer::{AdmissionLayer, AdmissionService};
pub use leaky_bucket::LeakyBucket;
pub use limiter::{Admission, RateLimiter};
pub use token_bucket::TokenBucket;
