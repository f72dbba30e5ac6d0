//! Contact fetching: group listing, batch fan-out and result aggregation.
//!
//! Split into focused submodules:
//! - [`worker`] - Per-batch fetch with quota retry and outcome reporting

mod worker;


use std::sync::Arc;

use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::address::sort_addresses;
use crate::config::ContactsConfig;
use crate::directory::{ContactId, DirectoryClient};
use crate::error::{Error, Result};

use worker::{WorkerParams, run_worker};

/// Fetches every contact of the configured group as sorted, formatted addresses.
#[derive(Clone)]
pub struct ContactFetcher {
    client: Arc<dyn DirectoryClient>,
    config: Arc<ContactsConfig>,
}

impl ContactFetcher {
    /// Create a fetcher, validating `config` first
    pub fn new(client: Arc<dyn DirectoryClient>, config: ContactsConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    /// The configuration this fetcher runs with
    pub fn config(&self) -> &ContactsConfig {
        &self.config
    }

    /// Get every contact's email addresses in `Name <email@example.com>` form.
    ///
    /// Lists the group once, fetches member details in concurrent batches and
    /// returns the addresses sorted by [`sort_addresses`]. The result is
    /// all-or-nothing: the first batch error is returned and partial results are
    /// discarded. Cancelling `cancel` stops every in-flight batch and makes this
    /// return [`Error::Cancelled`].
    pub async fn get_contacts(&self, cancel: &CancellationToken) -> Result<Vec<String>> {
        let listing = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            listing = self
                .client
                .list_group_members(&self.config.group_id, self.config.max_members) => listing,
        };
        let members = listing.map_err(Error::Listing)?;
        tracing::info!(
            retrieved = members.member_ids.len(),
            total = members.total_count,
            "Retrieved {} of {} contacts",
            members.member_ids.len(),
            members.total_count
        );

        let member_count = members.member_ids.len();
        let batches = partition_batches(&members.member_ids, self.config.batch_size);
        // one slot per possible batch so no worker ever waits to report an error
        let error_capacity = member_count / self.config.batch_size + 1;

        let (results_tx, mut results_rx) = mpsc::unbounded_channel::<String>();
        let (errors_tx, mut errors_rx) = mpsc::channel::<Error>(error_capacity);

        let abort = cancel.child_token();
        // stop stragglers if this future is dropped mid-fetch
        let _abort_on_drop = abort.clone().drop_guard();
        let limiter = Arc::new(Semaphore::new(self.config.max_concurrent_batches));

        let mut workers = JoinSet::new();
        for (index, ids) in batches.into_iter().enumerate() {
            let span = tracing::debug_span!("contact_batch", batch = index);
            workers.spawn(
                run_worker(WorkerParams {
                    index,
                    ids,
                    client: Arc::clone(&self.client),
                    retry: self.config.retry.clone(),
                    limiter: Arc::clone(&limiter),
                    abort: abort.clone(),
                    results_tx: results_tx.clone(),
                    errors_tx: errors_tx.clone(),
                })
                .instrument(span),
            );
        }

        tokio::spawn(supervise_workers(
            workers,
            results_tx,
            errors_tx,
            abort.clone(),
        ));

        let mut contacts = Vec::new();
        while let Some(address) = results_rx.recv().await {
            contacts.push(address);
        }
        if let Some(err) = errors_rx.recv().await {
            return Err(err);
        }

        sort_addresses(&mut contacts);
        Ok(contacts)
    }
}

/// Split member IDs into consecutive batches of `batch_size`.
///
/// Every ID lands in exactly one batch and all batches are full except possibly
/// the last. An empty input yields no batches.
pub fn partition_batches(ids: &[ContactId], batch_size: usize) -> Vec<Vec<ContactId>> {
    ids.chunks(batch_size.max(1))
        .map(|chunk| chunk.to_vec())
        .collect()
}

/// Wait for every worker, then close the result and error channels.
///
/// Dropping the last senders here is what ends the coordinator's drain loop. A
/// worker that panicked never reported anything itself, so its failure is
/// reported on its behalf.
async fn supervise_workers(
    mut workers: JoinSet<()>,
    results_tx: mpsc::UnboundedSender<String>,
    errors_tx: mpsc::Sender<Error>,
    abort: CancellationToken,
) {
    while let Some(joined) = workers.join_next().await {
        if let Err(e) = joined {
            tracing::error!(error = %e, "Contact batch worker panicked");
            errors_tx.send(Error::WorkerPanicked(e.to_string())).await.ok();
            abort.cancel();
        }
    }
    drop(results_tx);
    drop(errors_tx);
}
