//! Retry behavior observed through the gate.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use storgate_core::{GateConfig, StorGate};
use storgate_model::{GateError, RetryableKind, StorageClientError, StorageRequest};

use crate::{FlakyFetchClient, init_tracing, wait_idle};

#[tokio::test]
async fn test_should_recover_after_transient_timeouts() {
    init_tracing();

    let client = Arc::new(FlakyFetchClient::new(3, || {
        StorageClientError::RequestTimeout
    }));
    let retries = Arc::new(Mutex::new(Vec::new()));
    let hook_retries = Arc::clone(&retries);
    let config = GateConfig::builder()
        .max_retries(3)
        .retry_delay(Duration::ZERO)
        .on_retry(Arc::new(move |kind, attempt| {
            hook_retries.lock().unwrap().push((kind, attempt));
        }))
        .build();
    let gate = StorGate::start(config, client.clone());

    let output = gate.submit(StorageRequest::fetch("b", "k")).await.unwrap();
    assert_eq!(
        output.into_fetched().unwrap().body.as_ref(),
        b"eventually"
    );

    // Three failed attempts, each announced before its retry.
    assert_eq!(client.attempts(), 4);
    assert_eq!(
        *retries.lock().unwrap(),
        vec![
            (RetryableKind::RequestTimeout, 0),
            (RetryableKind::RequestTimeout, 1),
            (RetryableKind::RequestTimeout, 2),
        ]
    );

    // Retries are invisible to the usage counters.
    wait_idle(&gate).await;
    let stats = gate.stats().await.unwrap();
    assert_eq!(stats.fetches, 1);

    gate.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_should_fail_once_retry_budget_is_spent() {
    init_tracing();

    let client = Arc::new(FlakyFetchClient::new(usize::MAX, || {
        StorageClientError::ConnectionRefused
    }));
    let retries = Arc::new(AtomicUsize::new(0));
    let hook_retries = Arc::clone(&retries);
    let config = GateConfig::builder()
        .max_retries(1)
        .retry_delay(Duration::ZERO)
        .on_retry(Arc::new(move |_, _| {
            hook_retries.fetch_add(1, Ordering::SeqCst);
        }))
        .build();
    let gate = StorGate::start(config, client.clone());

    let err = gate
        .submit(StorageRequest::fetch("b", "k"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        GateError::Storage(StorageClientError::ConnectionRefused)
    ));
    assert_eq!(client.attempts(), 2);
    assert_eq!(retries.load(Ordering::SeqCst), 1);

    gate.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_should_not_retry_terminal_failures() {
    init_tracing();

    let client = Arc::new(FlakyFetchClient::new(usize::MAX, || {
        StorageClientError::AccessDenied
    }));
    let config = GateConfig::builder()
        .max_retries(5)
        .retry_delay(Duration::ZERO)
        .build();
    let gate = StorGate::start(config, client.clone());

    let err = gate
        .submit(StorageRequest::fetch("b", "k"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        GateError::Storage(StorageClientError::AccessDenied)
    ));
    assert_eq!(client.attempts(), 1);

    gate.shutdown().await.unwrap();
}
