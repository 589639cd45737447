//! Success outputs for the four storage operations.
//!
//! Each operation has its own output struct; [`StorageOutput`] is the
//! tagged union the gate returns to callers. Response headers are carried
//! only when the gate is configured to return them; see
//! [`StorageOutput::without_headers`].

use std::collections::HashMap;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Output of a fetch operation.
#[derive(Debug, Clone, Default)]
pub struct FetchOutput {
    /// The object body.
    pub body: Bytes,
    /// MIME type recorded with the object.
    pub content_type: Option<String>,
    /// Response headers, when the gate is configured to return them.
    pub headers: Option<HashMap<String, String>>,
}

/// Output of a store operation.
#[derive(Debug, Clone, Default)]
pub struct StoreOutput {
    /// The ETag (quoted hex MD5) of the written object.
    pub etag: String,
    /// The size of the written object in bytes.
    pub size: u64,
    /// Response headers, when the gate is configured to return them.
    pub headers: Option<HashMap<String, String>>,
}

/// Output of a delete operation.
///
/// Deletes are idempotent: removing a key that does not exist still
/// succeeds.
#[derive(Debug, Clone, Default)]
pub struct DeleteOutput {
    /// Response headers, when the gate is configured to return them.
    pub headers: Option<HashMap<String, String>>,
}

/// One key in an enumeration result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectSummary {
    /// The object key.
    pub key: String,
    /// The object size in bytes.
    pub size: u64,
    /// The object's ETag, if the backend reported one.
    pub etag: Option<String>,
}

/// Output of an enumerate operation.
#[derive(Debug, Clone, Default)]
pub struct EnumerateOutput {
    /// The matched keys, in lexicographic order.
    pub objects: Vec<ObjectSummary>,
    /// Whether the listing was cut off at `max_keys`.
    pub is_truncated: bool,
    /// Marker to pass to the next enumerate request when truncated.
    pub next_marker: Option<String>,
    /// Response headers, when the gate is configured to return them.
    pub headers: Option<HashMap<String, String>>,
}

/// The success value the gate returns for a submitted request.
#[derive(Debug, Clone)]
pub enum StorageOutput {
    /// Result of a fetch.
    Fetched(FetchOutput),
    /// Result of a store.
    Stored(StoreOutput),
    /// Result of a delete.
    Deleted(DeleteOutput),
    /// Result of an enumerate.
    Enumerated(EnumerateOutput),
}

impl StorageOutput {
    /// Drop any response headers from the output.
    ///
    /// Applied by the executor when the gate is configured not to return
    /// headers to callers.
    #[must_use]
    pub fn without_headers(self) -> Self {
        match self {
            Self::Fetched(out) => Self::Fetched(FetchOutput {
                headers: None,
                ..out
            }),
            Self::Stored(out) => Self::Stored(StoreOutput {
                headers: None,
                ..out
            }),
            Self::Deleted(_) => Self::Deleted(DeleteOutput { headers: None }),
            Self::Enumerated(out) => Self::Enumerated(EnumerateOutput {
                headers: None,
                ..out
            }),
        }
    }

    /// The response headers attached to this output, if any.
    #[must_use]
    pub fn headers(&self) -> Option<&HashMap<String, String>> {
        match self {
            Self::Fetched(out) => out.headers.as_ref(),
            Self::Stored(out) => out.headers.as_ref(),
            Self::Deleted(out) => out.headers.as_ref(),
            Self::Enumerated(out) => out.headers.as_ref(),
        }
    }

    /// Unwrap a fetch output.
    #[must_use]
    pub fn into_fetched(self) -> Option<FetchOutput> {
        match self {
            Self::Fetched(out) => Some(out),
            _ => None,
        }
    }

    /// Unwrap a store output.
    #[must_use]
    pub fn into_stored(self) -> Option<StoreOutput> {
        match self {
            Self::Stored(out) => Some(out),
            _ => None,
        }
    }

    /// Unwrap an enumerate output.
    #[must_use]
    pub fn into_enumerated(self) -> Option<EnumerateOutput> {
        match self {
            Self::Enumerated(out) => Some(out),
            _ => None,
        }
    }
}
