//! Classified error types for the gate and its storage collaborator.
//!
//! Defines [`StorageClientError`], the failure taxonomy the storage client
//! reports, and [`GateError`], the caller-facing error returned by the gate.
//! The retryable subset of client failures is exposed through
//! [`StorageClientError::retryable_kind`], which drives the executor's
//! retry loop.
//!
//! # Usage
//!
//! ```
//! use storgate_model::error::{RetryableKind, StorageClientError};
//!
//! let err = StorageClientError::ConnectionRefused;
//! assert_eq!(err.retryable_kind(), Some(RetryableKind::ConnectionRefused));
//!
//! let err = StorageClientError::AccessDenied;
//! assert!(err.retryable_kind().is_none());
//! ```

use std::fmt;

/// The retryable failure classes.
///
/// Only failures in this set are eligible for automatic retry; everything
/// else is surfaced to the caller on the first occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RetryableKind {
    /// Establishing a connection to the backend timed out.
    ConnectTimeout,
    /// The request itself timed out.
    RequestTimeout,
    /// The backend refused the connection.
    ConnectionRefused,
}

impl RetryableKind {
    /// Stable string form, used in logs and retry-hook callbacks.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ConnectTimeout => "connect-timeout",
            Self::RequestTimeout => "request-timeout",
            Self::ConnectionRefused => "connection-refused",
        }
    }
}

impl fmt::Display for RetryableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure reported by a storage client operation.
///
/// The first three variants form the retryable set; the rest are terminal
/// and surfaced to the caller without retry.
#[derive(Debug, thiserror::Error)]
pub enum StorageClientError {
    // -----------------------------------------------------------------------
    // Retryable transport failures
    // -----------------------------------------------------------------------
    /// Timed out while establishing a connection to the backend.
    #[error("timed out connecting to the storage backend")]
    ConnectTimeout,

    /// The request did not complete within the configured timeout.
    #[error("the storage request timed out")]
    RequestTimeout,

    /// The backend actively refused the connection.
    #[error("the storage backend refused the connection")]
    ConnectionRefused,

    // -----------------------------------------------------------------------
    // Terminal service failures
    // -----------------------------------------------------------------------
    /// The specified bucket does not exist.
    #[error("the specified bucket does not exist: {bucket}")]
    NoSuchBucket {
        /// The bucket name that was not found.
        bucket: String,
    },

    /// The specified key does not exist.
    #[error("the specified key does not exist: {key}")]
    NoSuchKey {
        /// The key that was not found.
        key: String,
    },

    /// The backend denied access to the resource.
    #[error("access denied")]
    AccessDenied,

    /// Any other error the backend reported with a code.
    #[error("storage service error {code}: {message}")]
    Service {
        /// The backend's error code.
        code: String,
        /// Human-readable message from the backend.
        message: String,
    },

    /// Internal error with context.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl StorageClientError {
    /// Classify this failure, returning its retryable kind if it is one of
    /// the transient transport failures.
    #[must_use]
    pub fn retryable_kind(&self) -> Option<RetryableKind> {
        match self {
            Self::ConnectTimeout => Some(RetryableKind::ConnectTimeout),
            Self::RequestTimeout => Some(RetryableKind::RequestTimeout),
            Self::ConnectionRefused => Some(RetryableKind::ConnectionRefused),
            _ => None,
        }
    }

    /// Whether this failure is eligible for automatic retry.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.retryable_kind().is_some()
    }
}

/// Caller-facing error returned by gate operations.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    /// The concurrency ceiling was reached; the operation was not admitted.
    ///
    /// This is a backpressure signal: the gate never retries it on the
    /// caller's behalf.
    #[error("concurrency ceiling reached: {max} operations already in flight")]
    ConcurrencyExceeded {
        /// The configured ceiling.
        max: usize,
    },

    /// The request failed validation before admission.
    #[error("invalid request: {message}")]
    InvalidRequest {
        /// Why the request was rejected.
        message: String,
    },

    /// The worker executing the operation terminated without replying.
    ///
    /// Produced when the executor task panics (or is aborted at shutdown);
    /// the failure is isolated to this one operation.
    #[error("the worker executing the operation terminated without replying")]
    WorkerCrashed,

    /// The gate is shut down and no longer accepts submissions.
    #[error("the gate is shut down")]
    ShuttingDown,

    /// The storage client reported a failure (after any retries).
    #[error(transparent)]
    Storage(#[from] StorageClientError),
}

/// Convenience result type for gate operations.
pub type GateResult<T> = Result<T, GateError>;
