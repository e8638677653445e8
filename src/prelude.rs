//! Convenient re-exports for common limiter types.
pub use crate::{
    AcquireError, Admission, AdmissionError, AdmissionLayer, LeakyBucket, LeakyBucketConfig,
    RateLimiter, TokenBucket, TokenBucketConfig,
};
