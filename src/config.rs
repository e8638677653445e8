//! Validated construction parameters for the bucket types.

use crate::ConfigError;
use std::time::Duration;

/// Validated configuration for a [`TokenBucket`](crate::TokenBucket).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TokenBucketConfig {
    capacity: usize,
    interval: Duration,
}

impl TokenBucketConfig {
    /// Create a config with validation. Errors if `interval` is zero.
    ///
    /// A zero `capacity` is accepted and produces a bucket that rejects every attempt.
    ///
    /// # Examples
    /// ```
    /// use ratelimiter::TokenBucketConfig;
    /// use std::time::Duration;
    /// let cfg = TokenBucketConfig::new(5, Duration::from_millis(200)).unwrap();
    /// assert_eq!(cfg.capacity(), 5);
    /// ```
    pub fn new(capacity: usize, interval: Duration) -> Result<Self, ConfigError> {
        let cfg = Self { capacity, interval };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Override the capacity.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Override the refill interval; must be > 0.
    pub fn with_interval(mut self, interval: Duration) -> Result<Self, ConfigError> {
        self.interval = interval;
        self.validate()?;
        Ok(self)
    }

    /// Maximum number of tokens the bucket holds.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Time between single-token refills.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        Ok(())
    }
}

/// Validated configuration for a [`LeakyBucket`](crate::LeakyBucket).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LeakyBucketConfig {
    capacity: usize,
    interval: Duration,
    #[cfg_attr(feature = "serde", serde(default = "default_leak_count"))]
    leak_count: usize,
}

#[cfg(feature = "serde")]
fn default_leak_count() -> usize {
    LeakyBucketConfig::DEFAULT_LEAK_COUNT
}

impl LeakyBucketConfig {
    /// Units drained per tick unless overridden.
    pub const DEFAULT_LEAK_COUNT: usize = 1;

    /// Create a config draining [`DEFAULT_LEAK_COUNT`](Self::DEFAULT_LEAK_COUNT) unit per tick.
    /// Errors if `interval` is zero.
    pub fn new(capacity: usize, interval: Duration) -> Result<Self, ConfigError> {
        let cfg = Self { capacity, interval, leak_count: Self::DEFAULT_LEAK_COUNT };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Override how many units drain per tick; must be >= 1.
    ///
    /// # Examples
    /// ```
    /// use ratelimiter::{ConfigError, LeakyBucketConfig};
    /// use std::time::Duration;
    /// let cfg = LeakyBucketConfig::new(10, Duration::from_millis(100)).unwrap();
    /// assert_eq!(cfg.with_leak_count(3).unwrap().leak_count(), 3);
    /// assert_eq!(cfg.with_leak_count(0), Err(ConfigError::ZeroLeakCount));
    /// ```
    pub fn with_leak_count(mut self, leak_count: usize) -> Result<Self, ConfigError> {
        self.leak_count = leak_count;
        self.validate()?;
        Ok(self)
    }

    /// Override the capacity.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Maximum number of in-flight units.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Time between drains.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Units removed per drain.
    pub fn leak_count(&self) -> usize {
        self.leak_count
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        if self.leak_count == 0 {
            return Err(ConfigError::ZeroLeakCount);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_config_rejects_zero_interval() {
        assert_eq!(TokenBucketConfig::new(3, Duration::ZERO), Err(ConfigError::ZeroInterval));
    }

    #[test]
    fn token_config_accepts_zero_capacity() {
        let cfg = TokenBucketConfig::new(0, Duration::from_millis(10)).unwrap();
        assert_eq!(cfg.capacity(), 0);
    }

    #[test]
    fn token_config_setters() {
        let cfg = TokenBucketConfig::new(1, Duration::from_millis(10))
            .unwrap()
            .with_capacity(8)
            .with_interval(Duration::from_millis(25))
            .unwrap();
        assert_eq!(cfg.capacity(), 8);
        assert_eq!(cfg.interval(), Duration::from_millis(25));
        assert!(cfg.with_interval(Duration::ZERO).is_err());
    }

    #[test]
    fn leaky_config_defaults_to_single_leak() {
        let cfg = LeakyBucketConfig::new(4, Duration::from_millis(50)).unwrap();
        assert_eq!(cfg.leak_count(), 1);
        assert_eq!(cfg.capacity(), 4);
        assert_eq!(cfg.interval(), Duration::from_millis(50));
    }

    #[test]
    fn leaky_config_validation() {
        assert_eq!(LeakyBucketConfig::new(4, Duration::ZERO), Err(ConfigError::ZeroInterval));
        let cfg = LeakyBucketConfig::new(4, Duration::from_millis(50)).unwrap();
        assert_eq!(cfg.with_leak_count(0), Err(ConfigError::ZeroLeakCount));
        assert_eq!(cfg.with_capacity(9).capacity(), 9);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn leaky_config_deserializes_with_default_leak() {
        let cfg: LeakyBucketConfig =
            serde_json::from_str(r#"{"capacity":5,"interval":{"secs":0,"nanos":100000000}}"#)
                .unwrap();
        assert_eq!(cfg.leak_count(), 1);
        assert_eq!(cfg.interval(), Duration::from_millis(100));
    }
}
