//! Configuration types for directory-contacts

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::Semaphore;

/// Contact fetching configuration
///
/// Every field has a default, so an empty JSON object deserializes into
/// [`ContactsConfig::default()`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ContactsConfig {
    /// Contact group whose members are fetched (default: "contactGroups/all")
    #[serde(default = "default_group_id")]
    pub group_id: String,

    /// Upper bound on member IDs requested from the group listing (default: 10000)
    #[serde(default = "default_max_members")]
    pub max_members: usize,

    /// Number of contact IDs sent per batch-get call (default: 50)
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Maximum batch-get calls in flight at once (default: 16)
    #[serde(default = "default_max_concurrent_batches")]
    pub max_concurrent_batches: usize,

    /// Retry policy for quota errors
    #[serde(default)]
    pub retry: QuotaRetryConfig,
}

impl Default for ContactsConfig {
    fn default() -> Self {
        Self {
            group_id: default_group_id(),
            max_members: default_max_members(),
            batch_size: default_batch_size(),
            max_concurrent_batches: default_max_concurrent_batches(),
            retry: QuotaRetryConfig::default(),
        }
    }
}

impl ContactsConfig {
    /// Reject settings the fetcher cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.group_id.trim().is_empty() {
            return Err(config_error("group_id must not be empty", "group_id"));
        }
        if self.max_members == 0 {
            return Err(config_error("max_members must be at least 1", "max_members"));
        }
        if self.batch_size == 0 {
            return Err(config_error("batch_size must be at least 1", "batch_size"));
        }
        if self.max_concurrent_batches == 0 {
            return Err(config_error(
                "max_concurrent_batches must be at least 1",
                "max_concurrent_batches",
            ));
        }
        if self.max_concurrent_batches > Semaphore::MAX_PERMITS {
            return Err(config_error(
                "max_concurrent_batches exceeds the semaphore permit limit",
                "max_concurrent_batches",
            ));
        }
        if self.retry.max_attempts == Some(0) {
            return Err(config_error(
                "retry.max_attempts must be at least 1 (omit it to retry until cancelled)",
                "retry.max_attempts",
            ));
        }
        let multiplier = self.retry.backoff_multiplier;
        if !multiplier.is_finite() || multiplier < 1.0 {
            return Err(config_error(
                "retry.backoff_multiplier must be a finite number >= 1.0",
                "retry.backoff_multiplier",
            ));
        }
        if self.retry.initial_delay > self.retry.max_delay {
            return Err(config_error(
                "retry.initial_delay must not exceed retry.max_delay",
                "retry.initial_delay",
            ));
        }
        Ok(())
    }
}

fn config_error(message: &str, key: &str) -> Error {
    Error::Config {
        message: message.to_string(),
        key: Some(key.to_string()),
    }
}

/// Retry behavior for throttled batch-get calls
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QuotaRetryConfig {
    /// Total calls allowed per batch, including the first (default: 10)
    ///
    /// `None` retries until the governing cancellation token fires.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: Option<u32>,

    /// Delay before the first retry (default: 1 second)
    #[serde(default = "default_initial_delay", with = "duration_millis_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between retries (default: 30 seconds)
    #[serde(default = "default_max_delay", with = "duration_millis_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for QuotaRetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

impl QuotaRetryConfig {
    /// Retry forever at a flat one-second interval, stopping only on cancellation.
    ///
    /// Callers using this policy must supply a cancellation token with a deadline.
    #[must_use]
    pub fn fixed_interval() -> Self {
        Self {
            max_attempts: None,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(1),
            backoff_multiplier: 1.0,
            jitter: false,
        }
    }
}

fn default_group_id() -> String {
    "contactGroups/all".to_string()
}

fn default_max_members() -> usize {
    10_000
}

fn default_batch_size() -> usize {
    50
}

fn default_max_concurrent_batches() -> usize {
    16
}

fn default_max_attempts() -> Option<u32> {
    Some(10)
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(30)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_true() -> bool {
    true
}

// Duration serialization helper (integer milliseconds)
mod duration_millis_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
