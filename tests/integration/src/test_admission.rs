//! Concurrency-ceiling admission behavior.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use storgate_core::{GateConfig, StorGate};
use storgate_model::{GateError, StorageRequest};

use crate::{BlockingClient, init_tracing, wait_idle};

#[tokio::test]
async fn test_should_reject_submission_beyond_ceiling() {
    init_tracing();

    let client = Arc::new(BlockingClient::new());
    let rejections = Arc::new(Mutex::new(Vec::new()));
    let hook_rejections = Arc::clone(&rejections);
    let config = GateConfig::builder()
        .max_concurrency(2)
        .on_rejected(Arc::new(move |max| {
            hook_rejections.lock().unwrap().push(max);
        }))
        .build();
    let gate = StorGate::start(config, client.clone());

    // Occupy both slots with fetches that park inside the client.
    let first = {
        let gate = gate.clone();
        tokio::spawn(async move { gate.submit(StorageRequest::fetch("b", "k1")).await })
    };
    let second = {
        let gate = gate.clone();
        tokio::spawn(async move { gate.submit(StorageRequest::fetch("b", "k2")).await })
    };
    while client.entered() < 2 {
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    let err = gate
        .submit(StorageRequest::fetch("b", "k3"))
        .await
        .unwrap_err();
    assert!(matches!(err, GateError::ConcurrencyExceeded { max: 2 }));
    assert_eq!(*rejections.lock().unwrap(), vec![2]);
    assert_eq!(gate.num_workers().await.unwrap(), 2);

    client.release_all();
    first.await.unwrap().unwrap();
    second.await.unwrap().unwrap();
    wait_idle(&gate).await;

    // The rejected fetch was never counted; the admitted two were.
    let stats = gate.stats().await.unwrap();
    assert_eq!(stats.fetches, 2);

    gate.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_should_admit_again_once_a_slot_frees() {
    init_tracing();

    let client = Arc::new(BlockingClient::new());
    let config = GateConfig::builder().max_concurrency(1).build();
    let gate = StorGate::start(config, client.clone());

    let occupant = {
        let gate = gate.clone();
        tokio::spawn(async move { gate.submit(StorageRequest::fetch("b", "k")).await })
    };
    while client.entered() < 1 {
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    let err = gate
        .submit(StorageRequest::fetch("b", "k"))
        .await
        .unwrap_err();
    assert!(matches!(err, GateError::ConcurrencyExceeded { max: 1 }));

    client.release_all();
    occupant.await.unwrap().unwrap();
    wait_idle(&gate).await;

    // Slot is free again; the next submission goes straight through.
    let output = gate.submit(StorageRequest::fetch("b", "k")).await.unwrap();
    assert_eq!(
        output.into_fetched().unwrap().body.as_ref(),
        b"released"
    );

    gate.shutdown().await.unwrap();
}
