// ── Request scheduler ──
//
// Serializes outgoing data requests into a strictly sequential queue:
// one batch in flight at a time, per-target fan-out concurrent within
// the batch. A single worker task draining an mpsc channel is the whole
// serialization mechanism — the next batch cannot start until the
// current one has fully settled and its reads are in the store, because
// the worker does not recv again until then.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::batch::{BatchRequest, BatchResults, BatchTicket, Operation};
use crate::error::CoreError;
use crate::routes;
use crate::store::Store;
use crate::transport::Transport;

/// Scheduler tuning knobs.
#[derive(Debug, Clone)]
pub struct SchedulerOptions {
    /// Upper bound on any single per-target request. On expiry that
    /// target's result is a timeout error and the queue advances — a
    /// hung request never stalls the queue indefinitely.
    pub request_timeout: Duration,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Handle for scheduling batches. Cheaply cloneable; all clones feed
/// the same FIFO queue and the same worker.
#[derive(Clone)]
pub struct Scheduler {
    tx: mpsc::UnboundedSender<QueuedBatch>,
}

struct QueuedBatch {
    request: BatchRequest,
    completion: oneshot::Sender<BatchResults>,
}

impl Scheduler {
    /// Spawn the worker task and return the scheduling handle.
    ///
    /// Must be called from within a Tokio runtime. Read results are
    /// ingested into `store` before the batch's ticket resolves.
    pub fn spawn<T>(
        transport: Arc<T>,
        store: Arc<Store>,
        options: SchedulerOptions,
        cancel: CancellationToken,
    ) -> (Self, JoinHandle<()>)
    where
        T: Transport + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(worker_task(rx, transport, store, options, cancel));
        (Self { tx }, handle)
    }

    /// Enqueue a batch. Non-blocking; returns before anything executes.
    ///
    /// Malformed batches fail here, synchronously, and are never
    /// queued. The returned ticket resolves once the whole batch has
    /// settled; dropping it is fire-and-forget.
    pub fn schedule(&self, request: BatchRequest) -> Result<BatchTicket, CoreError> {
        request.validate()?;

        let (done_tx, done_rx) = oneshot::channel();
        self.tx
            .send(QueuedBatch {
                request,
                completion: done_tx,
            })
            .map_err(|_| CoreError::SchedulerClosed)?;

        Ok(BatchTicket::new(done_rx))
    }
}

// ── Worker ───────────────────────────────────────────────────────────

/// Drain the queue one batch at a time. Batches still queued when the
/// token fires are dropped; their tickets resolve with
/// [`CoreError::SchedulerClosed`].
async fn worker_task<T: Transport>(
    mut rx: mpsc::UnboundedReceiver<QueuedBatch>,
    transport: Arc<T>,
    store: Arc<Store>,
    options: SchedulerOptions,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            batch = rx.recv() => {
                let Some(batch) = batch else { break };
                execute_batch(transport.as_ref(), &store, &options, batch).await;
            }
        }
    }
    debug!("scheduler worker stopped");
}

/// Execute one batch: concurrent per-target fan-out, wait for all to
/// settle, ingest read successes, then deliver the results. A failed
/// target never aborts its siblings and is never retried.
async fn execute_batch<T: Transport>(
    transport: &T,
    store: &Store,
    options: &SchedulerOptions,
    batch: QueuedBatch,
) {
    let QueuedBatch {
        request,
        completion,
    } = batch;

    debug!(
        operation = %request.operation,
        targets = request.targets.len(),
        "batch started"
    );

    let operation = request.operation;
    let scope = request.scope.as_deref();
    let entity_id = request.entity_id.as_deref();
    let payload = request.payload.as_ref();

    let fan_out = request.targets.iter().map(|&target| async move {
        let Some((method, path)) = routes::resolve(target, operation, scope, entity_id) else {
            // Unreachable past validation, but never worth a panic.
            return (target, Err(CoreError::NotFetchable(target)));
        };

        let outcome =
            match tokio::time::timeout(options.request_timeout, transport.perform(method, &path, payload))
                .await
            {
                Ok(Ok(body)) => Ok(body),
                Ok(Err(e)) => {
                    warn!(entity = %target, error = %e, "target request failed");
                    Err(CoreError::from(e))
                }
                Err(_) => {
                    warn!(entity = %target, "target request timed out");
                    Err(CoreError::RequestTimeout {
                        timeout_secs: options.request_timeout.as_secs(),
                    })
                }
            };

        (target, outcome)
    });

    let settled = join_all(fan_out).await;

    // Reads feed the store before the ticket resolves and before the
    // next batch starts, so later batches always observe these writes.
    if operation == Operation::Read {
        store.ingest(settled.iter().filter_map(|(target, outcome)| {
            outcome
                .as_ref()
                .ok()
                .map(|body| (*target, routes::records_from(body.clone())))
        }));
    }

    debug!(operation = %operation, "batch settled");
    let _ = completion.send(BatchResults::new(settled));
}
