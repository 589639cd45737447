//! The outbound storage-client contract.
//!
//! The gate never talks to the backend directly; it drives an
//! implementation of [`StorageClient`]. Protocol concerns (signing,
//! transport, response parsing) live entirely behind this trait. Each
//! operation returns its output or a classified
//! [`StorageClientError`]; the classification decides whether the
//! executor retries.

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use storgate_model::error::StorageClientError;
use storgate_model::output::{DeleteOutput, EnumerateOutput, FetchOutput, StoreOutput};

/// A client for the remote object-storage backend.
///
/// Implementations must be cheap to share (`&self` methods) and safe to
/// call from many executor tasks concurrently.
#[async_trait]
pub trait StorageClient: Send + Sync + 'static {
    /// Retrieve the object at `bucket`/`key`.
    async fn fetch(&self, bucket: &str, key: &str) -> Result<FetchOutput, StorageClientError>;

    /// Write `body` to `bucket`/`key`.
    async fn store(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: Option<&str>,
        headers: &HashMap<String, String>,
    ) -> Result<StoreOutput, StorageClientError>;

    /// Remove the object at `bucket`/`key`. Idempotent.
    async fn delete(&self, bucket: &str, key: &str) -> Result<DeleteOutput, StorageClientError>;

    /// List keys in `bucket`, filtered by `prefix`, resuming strictly
    /// after `marker`, returning at most `max_keys` entries.
    async fn enumerate(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        max_keys: Option<i32>,
        marker: Option<&str>,
    ) -> Result<EnumerateOutput, StorageClientError>;
}
