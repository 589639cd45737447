//! Gate lifecycle: shutdown and crash isolation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use storgate_core::{GateConfig, MemoryClient, StorGate};
use storgate_model::{GateError, StorageRequest};

use crate::{BlockingClient, BoomClient, init_tracing, wait_idle};

#[tokio::test]
async fn test_should_ack_shutdown_and_refuse_later_work() {
    init_tracing();

    let gate = StorGate::start(GateConfig::default(), Arc::new(MemoryClient::new()));
    let survivor = gate.clone();

    gate.submit(StorageRequest::store("b", "k", "v", None, HashMap::new()))
        .await
        .unwrap();
    gate.shutdown().await.unwrap();

    let err = survivor
        .submit(StorageRequest::fetch("b", "k"))
        .await
        .unwrap_err();
    assert!(matches!(err, GateError::ShuttingDown));

    // Shutting down again through a surviving clone is a no-op.
    survivor.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_should_abort_in_flight_work_after_grace() {
    init_tracing();

    let client = Arc::new(BlockingClient::new());
    let config = GateConfig::builder()
        .request_timeout(Duration::from_secs(3600))
        .shutdown_grace(Duration::from_millis(50))
        .build();
    let gate = StorGate::start(config, client.clone());

    let stuck = {
        let gate = gate.clone();
        tokio::spawn(async move { gate.submit(StorageRequest::fetch("b", "k")).await })
    };
    while client.entered() < 1 {
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    // The worker never finishes on its own; shutdown must reclaim it.
    gate.shutdown().await.unwrap();

    let outcome = stuck.await.unwrap();
    assert!(matches!(outcome, Err(GateError::WorkerCrashed)));
}

#[tokio::test]
async fn test_should_keep_serving_after_a_worker_crash() {
    init_tracing();

    let gate = StorGate::start(GateConfig::default(), Arc::new(BoomClient::new()));

    gate.submit(StorageRequest::store("b", "boom", "x", None, HashMap::new()))
        .await
        .unwrap();
    gate.submit(StorageRequest::store("b", "fine", "y", None, HashMap::new()))
        .await
        .unwrap();

    // The crashing fetch is isolated to its own worker.
    let err = gate
        .submit(StorageRequest::fetch("b", "boom"))
        .await
        .unwrap_err();
    assert!(matches!(err, GateError::WorkerCrashed));

    // The gate and the rest of the data are unaffected.
    let output = gate
        .submit(StorageRequest::fetch("b", "fine"))
        .await
        .unwrap();
    assert_eq!(output.into_fetched().unwrap().body.as_ref(), b"y");

    wait_idle(&gate).await;
    let stats = gate.stats().await.unwrap();
    assert_eq!(stats.fetches, 2);
    assert_eq!(stats.stores, 2);

    gate.shutdown().await.unwrap();
}
