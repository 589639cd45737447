//! Integration tests for the StorGate gateway.
//!
//! These tests drive a full in-process gate (dispatcher, executors, and a
//! storage client) through the public [`StorGate`] handle. No external
//! backend is required: the clients here are either the in-memory client
//! from `storgate-core` or purpose-built test doubles that block, fail,
//! or panic on demand.

use std::collections::HashMap;
use std::sync::Once;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use storgate_core::{StorGate, StorageClient};
use storgate_model::StorageClientError;
use storgate_model::output::{DeleteOutput, EnumerateOutput, FetchOutput, StoreOutput};
use tokio::sync::watch;

static INIT: Once = Once::new();

/// Initialize tracing (once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Poll until the gate reports no in-flight workers.
///
/// Completion signals arrive at the dispatcher asynchronously, so stats
/// taken right after a submission resolves may still show the worker.
pub async fn wait_idle(gate: &StorGate) {
    while gate.num_workers().await.unwrap() > 0 {
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }
}

// ---------------------------------------------------------------------------
// Test doubles
// ---------------------------------------------------------------------------

/// Client whose fetches park until [`BlockingClient::release_all`] is
/// called. Used to hold workers in flight deterministically.
#[derive(Debug)]
pub struct BlockingClient {
    entered: AtomicUsize,
    release: watch::Sender<bool>,
}

impl Default for BlockingClient {
    fn default() -> Self {
        Self {
            entered: AtomicUsize::new(0),
            release: watch::Sender::new(false),
        }
    }
}

impl BlockingClient {
    /// Create a client with every fetch parked.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of fetches that have started (released or not).
    #[must_use]
    pub fn entered(&self) -> usize {
        self.entered.load(Ordering::SeqCst)
    }

    /// Unpark every waiting fetch, current and future.
    pub fn release_all(&self) {
        self.release.send_replace(true);
    }
}

#[async_trait]
impl StorageClient for BlockingClient {
    async fn fetch(&self, _bucket: &str, _key: &str) -> Result<FetchOutput, StorageClientError> {
        self.entered.fetch_add(1, Ordering::SeqCst);
        let mut release = self.release.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = release.wait_for(|released| *released).await;
        Ok(FetchOutput {
            body: Bytes::from_static(b"released"),
            content_type: None,
            headers: None,
        })
    }

    async fn store(
        &self,
        _bucket: &str,
        _key: &str,
        _body: Bytes,
        _content_type: Option<&str>,
        _headers: &HashMap<String, String>,
    ) -> Result<StoreOutput, StorageClientError> {
        Ok(StoreOutput::default())
    }

    async fn delete(&self, _bucket: &str, _key: &str) -> Result<DeleteOutput, StorageClientError> {
        Ok(DeleteOutput::default())
    }

    async fn enumerate(
        &self,
        _bucket: &str,
        _prefix: Option<&str>,
        _max_keys: Option<i32>,
        _marker: Option<&str>,
    ) -> Result<EnumerateOutput, StorageClientError> {
        Ok(EnumerateOutput::default())
    }
}

/// Client that fails the first `failures` fetches with a fixed error, then
/// serves a canned body. Tracks total fetch attempts.
#[derive(Debug)]
pub struct FlakyFetchClient {
    attempts: AtomicUsize,
    failures: usize,
    failure: fn() -> StorageClientError,
}

impl FlakyFetchClient {
    /// Create a client that fails the first `failures` fetches.
    #[must_use]
    pub fn new(failures: usize, failure: fn() -> StorageClientError) -> Self {
        Self {
            attempts: AtomicUsize::new(0),
            failures,
            failure,
        }
    }

    /// Total fetch attempts observed, retries included.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StorageClient for FlakyFetchClient {
    async fn fetch(&self, _bucket: &str, _key: &str) -> Result<FetchOutput, StorageClientError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if attempt < self.failures {
            return Err((self.failure)());
        }
        Ok(FetchOutput {
            body: Bytes::from_static(b"eventually"),
            content_type: None,
            headers: None,
        })
    }

    async fn store(
        &self,
        _bucket: &str,
        _key: &str,
        _body: Bytes,
        _content_type: Option<&str>,
        _headers: &HashMap<String, String>,
    ) -> Result<StoreOutput, StorageClientError> {
        Ok(StoreOutput::default())
    }

    async fn delete(&self, _bucket: &str, _key: &str) -> Result<DeleteOutput, StorageClientError> {
        Ok(DeleteOutput::default())
    }

    async fn enumerate(
        &self,
        _bucket: &str,
        _prefix: Option<&str>,
        _max_keys: Option<i32>,
        _marker: Option<&str>,
    ) -> Result<EnumerateOutput, StorageClientError> {
        Ok(EnumerateOutput::default())
    }
}

/// Delegates to an in-memory store but panics on any fetch of the key
/// `"boom"`. Used to verify crash isolation.
#[derive(Debug, Default)]
pub struct BoomClient {
    inner: storgate_core::MemoryClient,
}

impl BoomClient {
    /// Create an empty client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageClient for BoomClient {
    async fn fetch(&self, bucket: &str, key: &str) -> Result<FetchOutput, StorageClientError> {
        assert_ne!(key, "boom", "scripted worker crash");
        self.inner.fetch(bucket, key).await
    }

    async fn store(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: Option<&str>,
        headers: &HashMap<String, String>,
    ) -> Result<StoreOutput, StorageClientError> {
        self.inner.store(bucket, key, body, content_type, headers).await
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<DeleteOutput, StorageClientError> {
        self.inner.delete(bucket, key).await
    }

    async fn enumerate(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        max_keys: Option<i32>,
        marker: Option<&str>,
    ) -> Result<EnumerateOutput, StorageClientError> {
        self.inner.enumerate(bucket, prefix, max_keys, marker).await
    }
}

mod test_admission;
mod test_lifecycle;
mod test_retry;
