//! Batch worker: one batch-get call per batch, retried while throttled.

use std::sync::Arc;

use tokio::sync::{Semaphore, mpsc};
use tokio_util::sync::CancellationToken;

use crate::address::format_address;
use crate::config::QuotaRetryConfig;
use crate::directory::{CONTACT_FIELDS, ContactId, DirectoryClient};
use crate::error::{Error, Result};
use crate::retry::{RetryError, with_retry};

/// Fetch one batch of people and send a formatted address for every email.
///
/// Nothing is sent unless the batch-get call succeeds, so a failed batch never
/// contributes partial output. Returns the number of addresses sent.
pub(super) async fn fetch_batch(
    client: &dyn DirectoryClient,
    index: usize,
    ids: &[ContactId],
    retry: &QuotaRetryConfig,
    cancel: &CancellationToken,
    results_tx: &mpsc::UnboundedSender<String>,
) -> Result<usize> {
    if ids.is_empty() {
        return Ok(0);
    }

    let people = with_retry(retry, cancel, || client.batch_get_people(ids, CONTACT_FIELDS))
        .await
        .map_err(|e| match e {
            RetryError::Permanent(source) => Error::Batch {
                batch: index,
                source,
            },
            RetryError::Exhausted { attempts, .. } => Error::QuotaExhausted {
                batch: index,
                attempts,
            },
            RetryError::Cancelled => Error::Cancelled,
        })?;

    let mut sent = 0;
    for person in &people {
        let name = person.primary_name();
        for email in &person.emails {
            // receiver only goes away when the fetch itself was dropped
            results_tx
                .send(format_address(name, email))
                .map_err(|_| Error::Cancelled)?;
            sent += 1;
        }
    }
    Ok(sent)
}

/// Everything a spawned worker task owns
pub(super) struct WorkerParams {
    /// Zero-based batch index, used in errors and logs
    pub(super) index: usize,
    /// Contact IDs in this batch
    pub(super) ids: Vec<ContactId>,
    /// Directory client shared by all workers
    pub(super) client: Arc<dyn DirectoryClient>,
    /// Quota retry policy
    pub(super) retry: QuotaRetryConfig,
    /// Limits how many batch-get calls are in flight
    pub(super) limiter: Arc<Semaphore>,
    /// Fires on caller cancellation or on the first failed batch
    pub(super) abort: CancellationToken,
    /// Formatted addresses
    pub(super) results_tx: mpsc::UnboundedSender<String>,
    /// Terminal errors, at most one per worker
    pub(super) errors_tx: mpsc::Sender<Error>,
}

/// Worker task body: wait for a slot, fetch, and report the outcome.
///
/// A terminal error is reported on the error channel and then cancels the
/// remaining workers; the report always happens before the cancel so it is the
/// first error the coordinator sees.
pub(super) async fn run_worker(params: WorkerParams) {
    let WorkerParams {
        index,
        ids,
        client,
        retry,
        limiter,
        abort,
        results_tx,
        errors_tx,
    } = params;

    let permit = tokio::select! {
        biased;
        _ = abort.cancelled() => None,
        permit = limiter.acquire_owned() => permit.ok(),
    };

    let outcome = match permit {
        Some(_permit) => {
            tracing::debug!(batch = index, size = ids.len(), "Fetching contact batch");
            fetch_batch(client.as_ref(), index, &ids, &retry, &abort, &results_tx).await
        }
        None => Err(Error::Cancelled),
    };

    match outcome {
        Ok(sent) => {
            tracing::debug!(batch = index, addresses = sent, "Contact batch complete");
        }
        Err(Error::Cancelled) => {
            tracing::debug!(batch = index, "Contact batch cancelled");
            errors_tx.send(Error::Cancelled).await.ok();
        }
        Err(e) => {
            tracing::error!(batch = index, error = %e, "Error loading contacts");
            errors_tx.send(e).await.ok();
            abort.cancel();
        }
    }
}
