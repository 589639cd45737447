//! Per-operation executor.
//!
//! One executor task runs exactly one [`StorageRequest`] to completion. It
//! owns the retry loop: every attempt is bounded by the configured request
//! timeout, transient failures are retried with a fixed delay up to
//! `max_retries`, and the final outcome is sent straight to the caller over
//! its reply channel. The dispatcher learns about termination separately,
//! through the monitor task it paired with this executor, so a panic in
//! here (e.g. inside a storage-client implementation) stays isolated to
//! this one operation.

use std::sync::Arc;

use storgate_model::error::{GateError, GateResult, StorageClientError};
use storgate_model::output::StorageOutput;
use storgate_model::request::StorageRequest;
use tokio::sync::oneshot;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use crate::client::StorageClient;
use crate::config::GateConfig;
use crate::dispatcher::WorkerId;

/// Execute one request and reply to the caller.
///
/// Runs as its own tokio task. The reply send may fail if the caller gave
/// up waiting; the result is dropped in that case.
pub(crate) async fn run(
    id: WorkerId,
    request: StorageRequest,
    config: Arc<GateConfig>,
    client: Arc<dyn StorageClient>,
    reply: oneshot::Sender<GateResult<StorageOutput>>,
) {
    let outcome = match execute(id, &request, &config, client.as_ref()).await {
        Ok(output) if config.return_headers => Ok(output),
        Ok(output) => Ok(output.without_headers()),
        Err(err) => Err(GateError::Storage(err)),
    };
    let _ = reply.send(outcome);
}

/// The retry loop: attempt, classify, back off, repeat.
///
/// Total attempts are bounded by `max_retries + 1`. The retry hook fires
/// once per retried attempt with the zero-based number of the attempt that
/// just failed.
async fn execute(
    id: WorkerId,
    request: &StorageRequest,
    config: &GateConfig,
    client: &dyn StorageClient,
) -> Result<StorageOutput, StorageClientError> {
    let mut attempt: u32 = 0;
    loop {
        let result = match timeout(config.request_timeout, invoke(client, request)).await {
            Ok(result) => result,
            Err(_) => Err(StorageClientError::RequestTimeout),
        };

        let err = match result {
            Ok(output) => return Ok(output),
            Err(err) => err,
        };

        match err.retryable_kind() {
            Some(kind) if attempt < config.max_retries => {
                debug!(
                    worker = %id,
                    kind = %kind,
                    attempt,
                    delay_ms = config.retry_delay.as_millis() as u64,
                    "transient failure, retrying"
                );
                (config.on_retry)(kind, attempt);
                sleep(config.retry_delay).await;
                attempt += 1;
            }
            Some(kind) => {
                warn!(
                    worker = %id,
                    kind = %kind,
                    attempts = attempt + 1,
                    "retries exhausted"
                );
                return Err(err);
            }
            None => return Err(err),
        }
    }
}

/// Dispatch the request to the matching storage-client operation.
async fn invoke(
    client: &dyn StorageClient,
    request: &StorageRequest,
) -> Result<StorageOutput, StorageClientError> {
    match request {
        StorageRequest::Fetch { bucket, key } => {
            client.fetch(bucket, key).await.map(StorageOutput::Fetched)
        }
        StorageRequest::Store {
            bucket,
            key,
            body,
            content_type,
            headers,
        } => client
            .store(bucket, key, body.clone(), content_type.as_deref(), headers)
            .await
            .map(StorageOutput::Stored),
        StorageRequest::Delete { bucket, key } => {
            client.delete(bucket, key).await.map(StorageOutput::Deleted)
        }
        StorageRequest::Enumerate {
            bucket,
            prefix,
            max_keys,
            marker,
        } => client
            .enumerate(bucket, prefix.as_deref(), *max_keys, marker.as_deref())
            .await
            .map(StorageOutput::Enumerated),
    }
}
