//! The gate dispatcher: admission control and worker bookkeeping.
//!
//! [`StorGate`] is a cheap, cloneable handle to a single dispatcher actor
//! task. The actor owns all mutable gate state — the in-flight worker
//! table and the usage counters — and processes submissions and worker
//! completions strictly one at a time off its command and exit channels.
//! Because no other task can touch that state, concurrency-ceiling
//! enforcement is exact without any locking.
//!
//! Every admitted operation runs in its own executor task paired with a
//! monitor task. The monitor awaits the executor's [`tokio::task::JoinHandle`]
//! and reports the exit (normal, panicked, or aborted) back to the actor,
//! which removes the worker's table entry. A completion signal for a
//! worker the actor does not know is logged and ignored; a late or
//! duplicate signal must never take the dispatcher down.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use storgate_model::error::{GateError, GateResult};
use storgate_model::output::StorageOutput;
use storgate_model::request::{RequestKind, StorageRequest};
use storgate_model::stats::UsageStats;
use tokio::sync::{mpsc, oneshot};
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, info, warn};

use crate::client::StorageClient;
use crate::config::GateConfig;
use crate::executor;

/// Capacity of the command channel between handles and the actor.
const COMMAND_BUFFER: usize = 64;

/// Capacity of the exit channel between monitors and the actor.
const EXIT_BUFFER: usize = 64;

// ---------------------------------------------------------------------------
// WorkerId
// ---------------------------------------------------------------------------

/// Identifier of one in-flight worker, assigned by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkerId(u64);

impl WorkerId {
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Actor messages
// ---------------------------------------------------------------------------

/// How a worker task terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExitStatus {
    /// The executor ran to completion and replied to its caller.
    Normal,
    /// The executor panicked; its caller sees a worker-crashed failure.
    Panicked,
    /// The executor was aborted (shutdown).
    Aborted,
}

/// Completion signal from a worker's monitor task.
#[derive(Debug)]
struct WorkerExit {
    id: WorkerId,
    status: ExitStatus,
}

/// Commands sent from [`StorGate`] handles to the actor.
enum Command {
    Submit {
        request: StorageRequest,
        reply: oneshot::Sender<GateResult<StorageOutput>>,
    },
    Stats {
        reply: oneshot::Sender<UsageStats>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

// ---------------------------------------------------------------------------
// StorGate handle
// ---------------------------------------------------------------------------

/// Handle to a running gate.
///
/// Created by [`StorGate::start`]; clones share the same dispatcher. The
/// gate stops when [`StorGate::shutdown`] is called (remaining clones then
/// receive [`GateError::ShuttingDown`]).
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use storgate_core::{GateConfig, MemoryClient, StorGate};
/// use storgate_model::StorageRequest;
///
/// # tokio_test::block_on(async {
/// let gate = StorGate::start(GateConfig::default(), Arc::new(MemoryClient::new()));
///
/// let stored = gate
///     .submit(StorageRequest::store("b", "k", "hi", None, Default::default()))
///     .await
///     .unwrap();
/// assert!(stored.into_stored().is_some());
///
/// let stats = gate.stats().await.unwrap();
/// assert_eq!(stats.stores, 1);
///
/// gate.shutdown().await.unwrap();
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct StorGate {
    commands: mpsc::Sender<Command>,
}

impl StorGate {
    /// Start a gate: spawns the dispatcher actor and returns a handle.
    #[must_use]
    pub fn start(config: GateConfig, client: Arc<dyn StorageClient>) -> Self {
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);
        let (exits_tx, exits_rx) = mpsc::channel(EXIT_BUFFER);

        let actor = Dispatcher {
            config: Arc::new(config),
            client,
            commands: commands_rx,
            exits_tx,
            exits_rx,
            workers: HashMap::new(),
            fetches: 0,
            stores: 0,
            deletes: 0,
            next_worker: 0,
        };
        info!(
            max_concurrency = actor.config.max_concurrency,
            endpoint = %actor.config.endpoint,
            "gate started"
        );
        tokio::spawn(actor.run());

        Self {
            commands: commands_tx,
        }
    }

    /// Submit a storage operation and wait for its outcome.
    ///
    /// Blocks only the calling task; the dispatcher stays responsive to
    /// other submissions and completions while this operation runs.
    ///
    /// # Errors
    /// - [`GateError::InvalidRequest`] if the request fails validation.
    /// - [`GateError::ConcurrencyExceeded`] if the ceiling is reached.
    /// - [`GateError::ShuttingDown`] if the gate is stopped.
    /// - [`GateError::WorkerCrashed`] if the executor died without replying.
    /// - [`GateError::Storage`] for a classified backend failure.
    pub async fn submit(&self, request: StorageRequest) -> GateResult<StorageOutput> {
        request.validate()?;

        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(Command::Submit {
                request,
                reply: reply_tx,
            })
            .await
            .map_err(|_| GateError::ShuttingDown)?;

        // A dropped reply sender means the worker terminated without
        // answering (panic, or abort during shutdown).
        reply_rx.await.map_err(|_| GateError::WorkerCrashed)?
    }

    /// Point-in-time snapshot of the usage counters.
    ///
    /// Never blocks on outstanding operations.
    pub async fn stats(&self) -> GateResult<UsageStats> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(Command::Stats { reply: reply_tx })
            .await
            .map_err(|_| GateError::ShuttingDown)?;
        reply_rx.await.map_err(|_| GateError::ShuttingDown)
    }

    /// Number of operations currently in flight.
    pub async fn num_workers(&self) -> GateResult<usize> {
        Ok(self.stats().await?.in_flight)
    }

    /// Stop the gate.
    ///
    /// New submissions are refused immediately; in-flight workers get
    /// `shutdown_grace` to finish and are aborted after it elapses.
    /// Idempotent: shutting down an already-stopped gate succeeds.
    pub async fn shutdown(self) -> GateResult<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self
            .commands
            .send(Command::Shutdown { reply: reply_tx })
            .await
            .is_err()
        {
            return Ok(());
        }
        let _ = reply_rx.await;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Dispatcher actor
// ---------------------------------------------------------------------------

/// One in-flight worker's bookkeeping entry.
struct Worker {
    kind: RequestKind,
    abort: AbortHandle,
}

/// The dispatcher actor. Owns all mutable gate state; runs as one task.
struct Dispatcher {
    config: Arc<GateConfig>,
    client: Arc<dyn StorageClient>,
    commands: mpsc::Receiver<Command>,
    exits_tx: mpsc::Sender<WorkerExit>,
    exits_rx: mpsc::Receiver<WorkerExit>,
    workers: HashMap<WorkerId, Worker>,
    fetches: u64,
    stores: u64,
    deletes: u64,
    next_worker: u64,
}

impl Dispatcher {
    /// The actor loop: process commands and exits one at a time.
    async fn run(mut self) {
        let shutdown_reply = loop {
            tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(Command::Submit { request, reply }) => self.admit(request, reply),
                    Some(Command::Stats { reply }) => {
                        let _ = reply.send(self.snapshot());
                    }
                    Some(Command::Shutdown { reply }) => break Some(reply),
                    // Every handle dropped: treat like a shutdown request.
                    None => break None,
                },
                Some(exit) = self.exits_rx.recv() => self.reconcile(exit),
            }
        };

        self.drain().await;
        if let Some(reply) = shutdown_reply {
            let _ = reply.send(());
        }
        info!("gate stopped");
    }

    /// Apply the admission rule to one submission.
    fn admit(
        &mut self,
        request: StorageRequest,
        reply: oneshot::Sender<GateResult<StorageOutput>>,
    ) {
        let max = self.config.max_concurrency;
        if self.workers.len() >= max {
            (self.config.on_rejected)(max);
            warn!(
                max_concurrency = max,
                kind = %request.kind(),
                bucket = request.bucket(),
                "submission rejected at concurrency ceiling"
            );
            let _ = reply.send(Err(GateError::ConcurrencyExceeded { max }));
            return;
        }

        let kind = request.kind();
        self.count(kind);

        self.next_worker += 1;
        let id = WorkerId(self.next_worker);

        let task = tokio::spawn(executor::run(
            id,
            request,
            Arc::clone(&self.config),
            Arc::clone(&self.client),
            reply,
        ));
        let abort = task.abort_handle();
        tokio::spawn(monitor(id, task, self.exits_tx.clone()));

        self.workers.insert(id, Worker { kind, abort });
        debug!(
            worker = %id,
            kind = %kind,
            in_flight = self.workers.len(),
            "operation admitted"
        );
    }

    /// Counters are bumped once, at admission; retries never count again.
    fn count(&mut self, kind: RequestKind) {
        match kind {
            RequestKind::Fetch => self.fetches += 1,
            RequestKind::Store => self.stores += 1,
            RequestKind::Delete => self.deletes += 1,
            // Enumerate carries no dedicated counter.
            RequestKind::Enumerate => {}
        }
    }

    /// Remove a finished worker from the table.
    fn reconcile(&mut self, exit: WorkerExit) {
        let Some(worker) = self.workers.remove(&exit.id) else {
            // Late or duplicate signal; may also be a worker already
            // reclaimed at shutdown. Never an error.
            warn!(worker = %exit.id, "completion signal for unknown worker, ignoring");
            return;
        };

        match exit.status {
            ExitStatus::Normal => debug!(
                worker = %exit.id,
                kind = %worker.kind,
                in_flight = self.workers.len(),
                "worker finished"
            ),
            ExitStatus::Panicked => warn!(
                worker = %exit.id,
                kind = %worker.kind,
                "worker panicked; failure isolated to its operation"
            ),
            ExitStatus::Aborted => debug!(worker = %exit.id, "worker aborted"),
        }
    }

    /// Shutdown path: refuse queued submissions, wait out the grace
    /// period, abort stragglers.
    async fn drain(&mut self) {
        self.commands.close();
        while let Ok(cmd) = self.commands.try_recv() {
            match cmd {
                Command::Submit { reply, .. } => {
                    let _ = reply.send(Err(GateError::ShuttingDown));
                }
                Command::Stats { reply } => {
                    let _ = reply.send(self.snapshot());
                }
                Command::Shutdown { reply } => {
                    let _ = reply.send(());
                }
            }
        }

        let deadline = tokio::time::Instant::now() + self.config.shutdown_grace;
        while !self.workers.is_empty() {
            match tokio::time::timeout_at(deadline, self.exits_rx.recv()).await {
                Ok(Some(exit)) => self.reconcile(exit),
                Ok(None) | Err(_) => break,
            }
        }

        if !self.workers.is_empty() {
            warn!(
                remaining = self.workers.len(),
                grace_ms = self.config.shutdown_grace.as_millis() as u64,
                "shutdown grace elapsed, aborting remaining workers"
            );
            for (id, worker) in self.workers.drain() {
                worker.abort.abort();
                debug!(worker = %id, kind = %worker.kind, "aborted worker");
            }
        }
    }

    fn snapshot(&self) -> UsageStats {
        UsageStats {
            fetches: self.fetches,
            stores: self.stores,
            deletes: self.deletes,
            in_flight: self.workers.len(),
        }
    }
}

/// Await one executor task and report its exit to the dispatcher.
///
/// This is the only place a worker's termination is observed, so the
/// dispatcher receives exactly one exit signal per admitted operation,
/// panics included.
async fn monitor(id: WorkerId, task: JoinHandle<()>, exits: mpsc::Sender<WorkerExit>) {
    let status = match task.await {
        Ok(()) => ExitStatus::Normal,
        Err(err) if err.is_panic() => ExitStatus::Panicked,
        Err(_) => ExitStatus::Aborted,
    };
    // The dispatcher may already be gone after shutdown.
    let _ = exits.send(WorkerExit { id, status }).await;
}
