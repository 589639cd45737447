//! In-memory storage client.
//!
//! [`MemoryClient`] is a complete, thread-safe [`StorageClient`]
//! implementation backed by a [`DashMap`]. It exists for tests, local
//! development, and as a reference for the contract a real protocol client
//! must satisfy. Buckets are implicit: storing a key creates its bucket.

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use md5::{Digest, Md5};
use storgate_model::error::StorageClientError;
use storgate_model::output::{
    DeleteOutput, EnumerateOutput, FetchOutput, ObjectSummary, StoreOutput,
};
use tracing::trace;

use crate::client::StorageClient;

/// Composite key identifying a stored object: `(bucket, key)`.
type ObjectKey = (String, String);

/// Default cap on enumerate results when the request does not set one.
const DEFAULT_MAX_KEYS: i32 = 1000;

/// A stored object and its metadata.
#[derive(Debug, Clone)]
struct StoredObject {
    body: Bytes,
    content_type: Option<String>,
    etag: String,
}

/// Compute the quoted hex-MD5 ETag for an object body.
fn compute_etag(data: &[u8]) -> String {
    let hash = Md5::digest(data);
    format!("\"{}\"", hex::encode(hash))
}

/// In-memory object store keyed by `(bucket, key)`.
///
/// # Examples
///
/// ```
/// use storgate_core::memory::MemoryClient;
/// use storgate_core::client::StorageClient;
/// use std::collections::HashMap;
///
/// # tokio_test::block_on(async {
/// let client = MemoryClient::new();
/// let written = client
///     .store("assets", "hello.txt", "hello".into(), None, &HashMap::new())
///     .await
///     .unwrap();
/// assert_eq!(written.size, 5);
///
/// let fetched = client.fetch("assets", "hello.txt").await.unwrap();
/// assert_eq!(fetched.body.as_ref(), b"hello");
/// # });
/// ```
#[derive(Default)]
pub struct MemoryClient {
    objects: DashMap<ObjectKey, StoredObject>,
}

impl std::fmt::Debug for MemoryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryClient")
            .field("objects_count", &self.objects.len())
            .finish()
    }
}

impl MemoryClient {
    /// Create an empty in-memory client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of objects currently stored across all buckets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[async_trait]
impl StorageClient for MemoryClient {
    async fn fetch(&self, bucket: &str, key: &str) -> Result<FetchOutput, StorageClientError> {
        let lookup = (bucket.to_owned(), key.to_owned());
        let Some(obj) = self.objects.get(&lookup) else {
            return Err(StorageClientError::NoSuchKey {
                key: key.to_owned(),
            });
        };
        trace!(bucket, key, size = obj.body.len(), "fetched object");
        Ok(FetchOutput {
            body: obj.body.clone(),
            content_type: obj.content_type.clone(),
            headers: Some(HashMap::from([("etag".to_owned(), obj.etag.clone())])),
        })
    }

    async fn store(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: Option<&str>,
        _headers: &HashMap<String, String>,
    ) -> Result<StoreOutput, StorageClientError> {
        let etag = compute_etag(&body);
        let size = body.len() as u64;
        self.objects.insert(
            (bucket.to_owned(), key.to_owned()),
            StoredObject {
                body,
                content_type: content_type.map(ToOwned::to_owned),
                etag: etag.clone(),
            },
        );
        trace!(bucket, key, size, "stored object");
        Ok(StoreOutput {
            etag: etag.clone(),
            size,
            headers: Some(HashMap::from([("etag".to_owned(), etag)])),
        })
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<DeleteOutput, StorageClientError> {
        // Idempotent: deleting a missing key still succeeds.
        self.objects.remove(&(bucket.to_owned(), key.to_owned()));
        trace!(bucket, key, "deleted object");
        Ok(DeleteOutput::default())
    }

    async fn enumerate(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        max_keys: Option<i32>,
        marker: Option<&str>,
    ) -> Result<EnumerateOutput, StorageClientError> {
        let limit = usize::try_from(max_keys.unwrap_or(DEFAULT_MAX_KEYS).max(0)).unwrap_or(0);

        let mut matched: Vec<ObjectSummary> = self
            .objects
            .iter()
            .filter(|entry| {
                let (obj_bucket, obj_key) = entry.key();
                obj_bucket == bucket
                    && prefix.is_none_or(|p| obj_key.starts_with(p))
                    && marker.is_none_or(|m| obj_key.as_str() > m)
            })
            .map(|entry| ObjectSummary {
                key: entry.key().1.clone(),
                size: entry.value().body.len() as u64,
                etag: Some(entry.value().etag.clone()),
            })
            .collect();
        matched.sort_by(|a, b| a.key.cmp(&b.key));

        let is_truncated = matched.len() > limit;
        matched.truncate(limit);
        let next_marker = if is_truncated {
            matched.last().map(|obj| obj.key.clone())
        } else {
            None
        };

        Ok(EnumerateOutput {
            objects: matched,
            is_truncated,
            next_marker,
            headers: None,
        })
    }
}
