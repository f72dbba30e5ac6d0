//! # directory-contacts
//!
//! Concurrent, rate-limit-aware bulk fetcher for a remote contact directory.
//!
//! The member IDs of one contact group are listed once, then fetched in
//! fixed-size batches by concurrent workers. Throttled batches are retried with
//! backoff, the first hard failure aborts the whole fetch, and every email is
//! rendered as an RFC 5322 mailbox string. The result is sorted
//! deterministically and kept in a [`ContactBook`] for cheap, lock-guarded reads.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use directory_contacts::{ContactBook, ContactsConfig, PeopleApiClient};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Arc::new(PeopleApiClient::new("ya29.access-token")?);
//!     let book = ContactBook::new(client, ContactsConfig::default())?;
//!
//!     let cancel = CancellationToken::new();
//!     book.load_contacts(&cancel).await?;
//!
//!     for contact in book.contacts() {
//!         println!("{contact}");
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Mailbox formatting and ordering
pub mod address;
/// Process-wide contact list
pub mod book;
/// Configuration types
pub mod config;
/// Remote directory abstraction and HTTP client
pub mod directory;
/// Error types
pub mod error;
/// Batched, concurrent contact fetching
pub mod fetcher;
/// Retry logic with exponential backoff
pub mod retry;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export commonly used types
pub use address::{format_address, sort_addresses};
pub use book::{ContactBook, SELF_ENTRY};
pub use config::{ContactsConfig, QuotaRetryConfig};
pub use directory::{
    ContactId, DirectoryClient, GroupMembers, PeopleApiClient, PersonField, PersonRecord,
};
pub use error::{DirectoryError, Error, Result};
pub use fetcher::ContactFetcher;
