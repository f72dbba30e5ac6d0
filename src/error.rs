//! Error types for directory-contacts
//!
//! Two layers:
//! - [`DirectoryError`] describes a failure reported by the remote directory
//!   collaborator (transport, HTTP status, undecodable payload)
//! - [`Error`] is what the fetcher and contact book return to their callers,
//!   carrying which stage failed

use thiserror::Error;

/// Result type alias for directory-contacts operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for directory-contacts
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "batch_size")
        key: Option<String>,
    },

    /// The group member listing failed
    #[error("failed to list group members: {0}")]
    Listing(#[source] DirectoryError),

    /// A batch-get call failed with a non-quota error
    #[error("failed to fetch contact batch {batch}: {source}")]
    Batch {
        /// Zero-based index of the failed batch
        batch: usize,
        /// The directory error returned for the batch
        #[source]
        source: DirectoryError,
    },

    /// Quota errors persisted past the configured retry limit
    #[error("contact batch {batch} still throttled after {attempts} attempts")]
    QuotaExhausted {
        /// Zero-based index of the throttled batch
        batch: usize,
        /// Number of calls made before giving up
        attempts: u32,
    },

    /// The governing cancellation token fired
    #[error("contact fetch cancelled")]
    Cancelled,

    /// A batch worker task panicked or was aborted
    #[error("contact batch worker failed: {0}")]
    WorkerPanicked(String),
}

/// Errors reported by a [`DirectoryClient`](crate::directory::DirectoryClient)
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The request never produced a response (DNS, connect, TLS, timeout)
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The directory answered with a non-success HTTP status
    #[error("HTTP {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body or reason phrase
        message: String,
    },

    /// The response body could not be decoded
    #[error("invalid response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Any other collaborator failure
    #[error("{0}")]
    Other(String),
}

impl DirectoryError {
    /// Whether this error signals rate limiting.
    ///
    /// The directory does not expose a dedicated error code for throttling on
    /// every path, so the rendered message is checked for "quota". HTTP 429 is
    /// treated as throttling regardless of the body.
    pub fn is_quota(&self) -> bool {
        if let DirectoryError::Status { status: 429, .. } = self {
            return true;
        }
        self.to_string().to_ascii_lowercase().contains("quota")
    }
}
