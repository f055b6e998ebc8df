//! Bounded worker pool for provider solve calls.
//!
//! A fixed set of workers drains one bounded queue. Submission fails fast
//! when the queue is full ("pool saturated") instead of blocking the caller;
//! the orchestrator treats that as backpressure, never as a provider fault.
//!
//! Every outstanding task carries a cancellation handle. Cancelled tasks
//! resolve to [`SolveError::Cancelled`], and a result that arrives after its
//! receiver was dropped simply disappears, so discarded attempts can never
//! leak into statistics.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot, Notify};
use tracing::{debug, info};

use resolver_types::{SolveError, SolvedToken};

/// Outcome of one pooled solve attempt.
pub type SolveOutcome = Result<SolvedToken, SolveError>;

type SolveFuture = BoxFuture<'static, SolveOutcome>;

struct Job {
    id: u64,
    future: SolveFuture,
    result_tx: oneshot::Sender<SolveOutcome>,
}

#[derive(Clone)]
struct TaskControl {
    cancelled: Arc<AtomicBool>,
    cancel_notify: Arc<Notify>,
}

impl TaskControl {
    fn new() -> Self {
        Self { cancelled: Arc::new(AtomicBool::new(false)), cancel_notify: Arc::new(Notify::new()) }
    }
}

struct PoolShared {
    tasks: DashMap<u64, TaskControl>,
    active: AtomicUsize,
    queued: AtomicUsize,
    next_id: AtomicU64,
}

impl PoolShared {
    /// Flag a task cancelled; returns false if it was unknown or already
    /// cancelled.
    fn cancel_task(&self, id: u64) -> bool {
        let Some(control) = self.tasks.get(&id) else {
            return false;
        };
        if control.cancelled.swap(true, Ordering::AcqRel) {
            return false;
        }
        // notify_one stores a permit, so a worker that selects after this
        // still observes the cancellation.
        control.cancel_notify.notify_one();
        true
    }
}

/// Handle to one submitted solve attempt.
pub struct SolveHandle {
    id: u64,
    result_rx: oneshot::Receiver<SolveOutcome>,
    shared: Arc<PoolShared>,
}

impl SolveHandle {
    /// Await the outcome, bounded by `timeout`.
    ///
    /// Returns `None` when the attempt neither completed nor was cancelled
    /// in time; the task is cancelled on the way out so a late completion is
    /// discarded.
    pub async fn outcome_within(mut self, timeout: Duration) -> Option<SolveOutcome> {
        match tokio::time::timeout(timeout, &mut self.result_rx).await {
            Ok(Ok(outcome)) => Some(outcome),
            // Sender dropped: pool torn down underneath us.
            Ok(Err(_)) => Some(Err(SolveError::Cancelled)),
            Err(_) => {
                self.shared.cancel_task(self.id);
                None
            }
        }
    }

    /// Await the outcome with no bound (tests and fire-and-forget callers).
    pub async fn outcome(self) -> SolveOutcome {
        self.result_rx.await.unwrap_or(Err(SolveError::Cancelled))
    }

    /// Best-effort cancellation of this attempt.
    pub fn cancel(&self) -> bool {
        self.shared.cancel_task(self.id)
    }
}

/// Fixed-size worker pool over a bounded queue.
pub struct SolvePool {
    shared: Arc<PoolShared>,
    queue_tx: Mutex<Option<mpsc::Sender<Job>>>,
    workers: Mutex<Vec<tokio::task::JoinHandle<()>>>,
    shutdown: AtomicBool,
    pool_size: usize,
}

impl SolvePool {
    /// Spawn `pool_size` workers sharing a queue of `queue_size` slots.
    /// Must be called from within a tokio runtime.
    pub fn new(pool_size: usize, queue_size: usize) -> Self {
        let pool_size = pool_size.max(1);
        let (queue_tx, queue_rx) = mpsc::channel::<Job>(queue_size.max(1));
        let queue_rx = Arc::new(tokio::sync::Mutex::new(queue_rx));

        let shared = Arc::new(PoolShared {
            tasks: DashMap::new(),
            active: AtomicUsize::new(0),
            queued: AtomicUsize::new(0),
            next_id: AtomicU64::new(1),
        });

        let workers = (0..pool_size)
            .map(|worker| {
                let shared = Arc::clone(&shared);
                let queue_rx = Arc::clone(&queue_rx);
                tokio::spawn(async move {
                    Self::worker_loop(worker, shared, queue_rx).await;
                })
            })
            .collect();

        debug!(pool_size, queue_size, "Solve pool started");
        Self {
            shared,
            queue_tx: Mutex::new(Some(queue_tx)),
            workers: Mutex::new(workers),
            shutdown: AtomicBool::new(false),
            pool_size,
        }
    }

    async fn worker_loop(
        worker: usize,
        shared: Arc<PoolShared>,
        queue_rx: Arc<tokio::sync::Mutex<mpsc::Receiver<Job>>>,
    ) {
        loop {
            let job = {
                let mut rx = queue_rx.lock().await;
                rx.recv().await
            };
            let Some(job) = job else {
                // Queue closed and drained.
                break;
            };
            shared.queued.fetch_sub(1, Ordering::Relaxed);

            let Some(control) = shared.tasks.get(&job.id).map(|c| c.value().clone()) else {
                continue;
            };
            if control.cancelled.load(Ordering::Acquire) {
                shared.tasks.remove(&job.id);
                let _ = job.result_tx.send(Err(SolveError::Cancelled));
                continue;
            }

            shared.active.fetch_add(1, Ordering::Relaxed);
            let outcome = tokio::select! {
                outcome = job.future => outcome,
                _ = control.cancel_notify.notified() => Err(SolveError::Cancelled),
            };
            shared.active.fetch_sub(1, Ordering::Relaxed);
            shared.tasks.remove(&job.id);

            // Receiver may be gone (timed-out caller); the result is then
            // discarded, which is exactly what the caller wants.
            let _ = job.result_tx.send(outcome);
        }
        debug!(worker, "Solve pool worker exited");
    }

    /// Submit a solve attempt. Fails fast with `PoolSaturated` when the
    /// queue is full and `ShuttingDown` after shutdown began.
    pub fn submit(
        &self,
        future: impl std::future::Future<Output = SolveOutcome> + Send + 'static,
    ) -> Result<SolveHandle, SolveError> {
        if self.shutdown.load(Ordering::Acquire) {
            return Err(SolveError::ShuttingDown);
        }
        let queue_tx = {
            let guard = self.queue_tx.lock();
            guard.clone()
        };
        let Some(queue_tx) = queue_tx else {
            return Err(SolveError::ShuttingDown);
        };

        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        let (result_tx, result_rx) = oneshot::channel();
        // Registered before enqueueing so cancel_all sees queued tasks.
        self.shared.tasks.insert(id, TaskControl::new());

        let job = Job { id, future: Box::pin(future), result_tx };
        match queue_tx.try_send(job) {
            Ok(()) => {
                self.shared.queued.fetch_add(1, Ordering::Relaxed);
                Ok(SolveHandle { id, result_rx, shared: Arc::clone(&self.shared) })
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.shared.tasks.remove(&id);
                Err(SolveError::PoolSaturated)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.shared.tasks.remove(&id);
                Err(SolveError::ShuttingDown)
            }
        }
    }

    /// Configured worker count.
    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Workers currently executing a task (not merely queued).
    pub fn active_count(&self) -> usize {
        self.shared.active.load(Ordering::Relaxed)
    }

    /// Tasks accepted but not yet picked up by a worker.
    pub fn queued_count(&self) -> usize {
        self.shared.queued.load(Ordering::Relaxed)
    }

    /// Cancel every outstanding (queued or running) task. Returns the count
    /// actually cancelled. Tasks that do not cooperate may still finish, but
    /// their results land in dropped receivers.
    pub fn cancel_all(&self) -> usize {
        let ids: Vec<u64> = self.shared.tasks.iter().map(|entry| *entry.key()).collect();
        let cancelled = ids.into_iter().filter(|id| self.shared.cancel_task(*id)).count();
        if cancelled > 0 {
            info!(cancelled, "Cancelled outstanding solve tasks");
        }
        cancelled
    }

    /// Stop accepting work, cancel what remains, and join the workers.
    /// Idempotent: later calls return immediately.
    pub async fn shutdown(&self) {
        if self.shutdown.swap(true, Ordering::AcqRel) {
            return;
        }
        info!("Solve pool shutting down");
        self.cancel_all();
        // Dropping the sender lets workers drain and exit.
        self.queue_tx.lock().take();
        let workers: Vec<_> = self.workers.lock().drain(..).collect();
        for handle in workers {
            let _ = handle.await;
        }
        info!("Solve pool shutdown complete");
    }
}
