//! Admission control, retry, and fault isolation for object storage.
//!
//! StorGate sits between application code and a remote object-storage
//! backend. Callers submit fetch/store/delete/enumerate operations to a
//! [`StorGate`] handle; a single dispatcher actor decides admission
//! against a concurrency ceiling, keeps usage counters, and runs each
//! admitted operation in an isolated worker task with timeout and
//! fixed-delay retry.
//!
//! # Architecture
//!
//! ```text
//!  callers (clones of StorGate)
//!       │ submit / stats / shutdown
//!       ▼
//!  ┌─────────────────────────────┐
//!  │     dispatcher (actor)      │  admission ceiling, counters,
//!  │  worker table: id → handle  │  completion reconciliation
//!  └──────┬───────────────▲──────┘
//!         │ spawn         │ exit signals
//!         ▼               │
//!  ┌────────────┐   ┌───────────┐
//!  │  executor  │◄──│  monitor  │   one pair per operation
//!  │ retry loop │   │ (awaits)  │
//!  └──────┬─────┘   └───────────┘
//!         │ fetch/store/delete/enumerate
//!         ▼
//!  ┌─────────────────────────────┐
//!  │   StorageClient (trait)     │  MemoryClient, or a real backend
//!  └─────────────────────────────┘
//! ```
//!
//! A panic inside a storage client takes down only that operation's
//! worker; the caller receives [`GateError::WorkerCrashed`] and the gate
//! keeps serving.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use storgate_core::{GateConfig, MemoryClient, StorGate};
//! use storgate_model::StorageRequest;
//!
//! # tokio_test::block_on(async {
//! let config = GateConfig::builder().max_concurrency(8).build();
//! let gate = StorGate::start(config, Arc::new(MemoryClient::new()));
//!
//! gate.submit(StorageRequest::store("bucket", "key", "payload", None, Default::default()))
//!     .await
//!     .unwrap();
//! let output = gate.submit(StorageRequest::fetch("bucket", "key")).await.unwrap();
//! assert_eq!(output.into_fetched().unwrap().body.as_ref(), b"payload");
//!
//! gate.shutdown().await.unwrap();
//! # });
//! ```

pub mod client;
pub mod config;
pub mod dispatcher;
mod executor;
pub mod memory;

pub use client::StorageClient;
pub use config::{GateConfig, RejectionHook, RetryHook};
pub use dispatcher::StorGate;
pub use memory::MemoryClient;

// Re-exported so callers need only one crate in scope for common use.
pub use storgate_model::{
    GateError, GateResult, RequestKind, RetryableKind, StorageClientError, StorageOutput,
    StorageRequest, UsageStats,
};
