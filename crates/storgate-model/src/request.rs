//! Storage operation requests submitted to the gate.
//!
//! A [`StorageRequest`] is immutable once submitted. The gate inspects only
//! its [`RequestKind`] (for counters) and hands the rest to the executor,
//! which forwards the fields to the storage client.

use std::collections::HashMap;
use std::fmt;

use bytes::Bytes;

use crate::error::GateError;

/// Discriminant of a [`StorageRequest`], used for usage counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// Retrieve an object.
    Fetch,
    /// Write an object.
    Store,
    /// Remove an object.
    Delete,
    /// List keys in a bucket.
    Enumerate,
}

impl RequestKind {
    /// Stable string form, used in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::Store => "store",
            Self::Delete => "delete",
            Self::Enumerate => "enumerate",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single storage operation to execute against the backend.
///
/// # Examples
///
/// ```
/// use storgate_model::request::{RequestKind, StorageRequest};
///
/// let req = StorageRequest::fetch("assets", "logo.png");
/// assert_eq!(req.kind(), RequestKind::Fetch);
/// assert!(req.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub enum StorageRequest {
    /// Retrieve the object at `bucket`/`key`.
    Fetch {
        /// Bucket holding the object.
        bucket: String,
        /// Object key.
        key: String,
    },
    /// Write `body` to `bucket`/`key`.
    Store {
        /// Bucket to write into.
        bucket: String,
        /// Object key.
        key: String,
        /// Object body.
        body: Bytes,
        /// MIME type recorded with the object.
        content_type: Option<String>,
        /// Additional headers forwarded to the backend.
        headers: HashMap<String, String>,
    },
    /// Remove the object at `bucket`/`key`.
    Delete {
        /// Bucket holding the object.
        bucket: String,
        /// Object key.
        key: String,
    },
    /// List keys in `bucket`, optionally filtered and paginated.
    Enumerate {
        /// Bucket to list.
        bucket: String,
        /// Only keys starting with this prefix are returned.
        prefix: Option<String>,
        /// Upper bound on the number of keys returned.
        max_keys: Option<i32>,
        /// Resume listing strictly after this key.
        marker: Option<String>,
    },
}

impl StorageRequest {
    /// Build a fetch request.
    #[must_use]
    pub fn fetch(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self::Fetch {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Build a store request.
    #[must_use]
    pub fn store(
        bucket: impl Into<String>,
        key: impl Into<String>,
        body: impl Into<Bytes>,
        content_type: Option<String>,
        headers: HashMap<String, String>,
    ) -> Self {
        Self::Store {
            bucket: bucket.into(),
            key: key.into(),
            body: body.into(),
            content_type,
            headers,
        }
    }

    /// Build a delete request.
    #[must_use]
    pub fn delete(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self::Delete {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Build an enumerate request.
    #[must_use]
    pub fn enumerate(
        bucket: impl Into<String>,
        prefix: Option<String>,
        max_keys: Option<i32>,
        marker: Option<String>,
    ) -> Self {
        Self::Enumerate {
            bucket: bucket.into(),
            prefix,
            max_keys,
            marker,
        }
    }

    /// The kind of this request.
    #[must_use]
    pub fn kind(&self) -> RequestKind {
        match self {
            Self::Fetch { .. } => RequestKind::Fetch,
            Self::Store { .. } => RequestKind::Store,
            Self::Delete { .. } => RequestKind::Delete,
            Self::Enumerate { .. } => RequestKind::Enumerate,
        }
    }

    /// The bucket this request targets.
    #[must_use]
    pub fn bucket(&self) -> &str {
        match self {
            Self::Fetch { bucket, .. }
            | Self::Store { bucket, .. }
            | Self::Delete { bucket, .. }
            | Self::Enumerate { bucket, .. } => bucket,
        }
    }

    /// The object key, if this request addresses a single object.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Fetch { key, .. } | Self::Store { key, .. } | Self::Delete { key, .. } => {
                Some(key)
            }
            Self::Enumerate { .. } => None,
        }
    }

    /// Validate the request before admission.
    ///
    /// # Errors
    /// Returns [`GateError::InvalidRequest`] for an empty bucket name, an
    /// empty object key, or a non-positive `max_keys`.
    pub fn validate(&self) -> Result<(), GateError> {
        if self.bucket().is_empty() {
            return Err(GateError::InvalidRequest {
                message: "bucket name must not be empty".to_owned(),
            });
        }
        if let Some(key) = self.key() {
            if key.is_empty() {
                return Err(GateError::InvalidRequest {
                    message: "object key must not be empty".to_owned(),
                });
            }
        }
        if let Self::Enumerate {
            max_keys: Some(n), ..
        } = self
        {
            if *n <= 0 {
                return Err(GateError::InvalidRequest {
                    message: format!("max-keys must be positive, got {n}"),
                });
            }
        }
        Ok(())
    }
}

/// Credentials for the storage backend.
#[derive(Clone, Default)]
pub struct Credentials {
    /// The access key ID.
    pub access_key_id: String,
    /// The secret access key.
    pub secret_access_key: String,
}

impl Credentials {
    /// Create a new credential pair.
    #[must_use]
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .finish()
    }
}
