//! Data types for StorGate, an admission-controlled object-storage gateway.
//!
//! This crate defines the vocabulary shared between the gate core and its
//! callers: storage operation requests, operation outputs, the classified
//! error taxonomy, and the usage-counter snapshot. It contains no I/O and
//! no policy; the admission, retry, and isolation machinery lives in
//! `storgate-core`.

pub mod error;
pub mod output;
pub mod request;
pub mod stats;

pub use error::{GateError, GateResult, RetryableKind, StorageClientError};
pub use output::{DeleteOutput, EnumerateOutput, FetchOutput, ObjectSummary, StorageOutput, StoreOutput};
pub use request::{Credentials, RequestKind, StorageRequest};
pub use stats::UsageStats;
