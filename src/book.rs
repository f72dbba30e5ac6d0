//! Process-wide contact list with lock-guarded load and read access.

use std::sync::{Arc, PoisonError, RwLock};

use tokio_util::sync::CancellationToken;

use crate::config::ContactsConfig;
use crate::directory::DirectoryClient;
use crate::error::Result;
use crate::fetcher::ContactFetcher;

/// Entry that always heads [`ContactBook::contacts`], standing for the local user
pub const SELF_ENTRY: &str = "me";

/// Holds the most recently loaded contact list.
///
/// Readers share a read lock and never wait on the network; a load fetches
/// without holding any lock and then swaps the whole list in under the write
/// lock, so readers see either the old list or the new one.
pub struct ContactBook {
    fetcher: ContactFetcher,
    contacts: RwLock<Arc<Vec<String>>>,
}

impl ContactBook {
    /// Create an empty contact book
    pub fn new(client: Arc<dyn DirectoryClient>, config: ContactsConfig) -> Result<Self> {
        Ok(Self::from_fetcher(ContactFetcher::new(client, config)?))
    }

    /// Create an empty contact book around an existing fetcher
    pub fn from_fetcher(fetcher: ContactFetcher) -> Self {
        Self {
            fetcher,
            contacts: RwLock::new(Arc::new(Vec::new())),
        }
    }

    /// Refresh the stored contacts from the directory.
    ///
    /// On failure the previously loaded contacts are kept.
    pub async fn load_contacts(&self, cancel: &CancellationToken) -> Result<()> {
        let contacts = self.fetcher.get_contacts(cancel).await?;
        let count = contacts.len();
        {
            let mut guard = self
                .contacts
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            *guard = Arc::new(contacts);
        }
        tracing::info!(contacts = count, "Loaded contacts");
        Ok(())
    }

    /// Fetch contacts without touching the stored list
    pub async fn get_contacts(&self, cancel: &CancellationToken) -> Result<Vec<String>> {
        self.fetcher.get_contacts(cancel).await
    }

    /// The loaded contacts, preceded by [`SELF_ENTRY`].
    ///
    /// Returns just `["me"]` before the first successful load.
    pub fn contacts(&self) -> Vec<String> {
        let loaded = Arc::clone(
            &self
                .contacts
                .read()
                .unwrap_or_else(PoisonError::into_inner),
        );
        let mut contacts = Vec::with_capacity(loaded.len() + 1);
        contacts.push(SELF_ENTRY.to_string());
        contacts.extend(loaded.iter().cloned());
        contacts
    }

    /// Number of loaded contacts, excluding [`SELF_ENTRY`]
    pub fn len(&self) -> usize {
        self.contacts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no contacts have been loaded
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
