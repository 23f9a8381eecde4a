//! Fixed-size async worker pool with a bounded job queue.
//!
//! A [`WorkerPool`] runs a fixed number of worker tasks that drain a bounded
//! queue. [`WorkerPool::submit`] waits while the queue is full, so producers
//! are slowed down instead of jobs being dropped. [`WorkerPool::run`] submits
//! a job and waits for its single result.
//!
//! Jobs cannot be cancelled once started and have no timeout.
//!
//! # Example
//!
//! ```rust
//! use worker_pool::WorkerPool;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), worker_pool::PoolError> {
//!     let pool = WorkerPool::new(4, 32);
//!
//!     let answer = pool.run(async { 6 * 7 }).await?;
//!     assert_eq!(answer, 42);
//!
//!     pool.shutdown().await;
//!     Ok(())
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex as StdMutex};

use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// A unit of work executed by the pool.
pub type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Errors returned by the pool.
#[derive(Debug, Error)]
pub enum PoolError {
    /// The pool no longer accepts jobs.
    #[error("worker pool is closed")]
    Closed,

    /// The job was dropped before producing a result.
    #[error("job dropped before completion")]
    WorkerDropped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PoolState {
    Running,
    /// Queue closed to new jobs; workers finish what is queued, then exit.
    Draining,
    /// Workers exit after their current job; queued jobs are dropped.
    Stopped,
}

/// Fixed number of workers draining a bounded queue.
pub struct WorkerPool {
    sender: mpsc::Sender<Job>,
    receiver: Arc<Mutex<mpsc::Receiver<Job>>>,
    state: watch::Sender<PoolState>,
    workers: StdMutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Start `worker_count` workers behind a queue holding `queue_size` jobs.
    ///
    /// Must be called from within a Tokio runtime. Both sizes are raised to
    /// at least 1.
    pub fn new(worker_count: usize, queue_size: usize) -> Self {
        let worker_count = worker_count.max(1);
        let queue_size = queue_size.max(1);
        let (sender, receiver) = mpsc::channel(queue_size);
        let receiver = Arc::new(Mutex::new(receiver));
        let (state, _) = watch::channel(PoolState::Running);

        let workers = (0..worker_count)
            .map(|id| tokio::spawn(worker(id, receiver.clone(), state.subscribe())))
            .collect();

        info!(
            "Started worker pool ({} workers, queue size {})",
            worker_count, queue_size
        );

        Self {
            sender,
            receiver,
            state,
            workers: StdMutex::new(workers),
        }
    }

    /// Queue a job, waiting while the queue is full.
    pub async fn submit<F>(&self, job: F) -> Result<(), PoolError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.is_closed() {
            return Err(PoolError::Closed);
        }
        self.sender
            .send(Box::pin(job))
            .await
            .map_err(|_| PoolError::Closed)
    }

    /// Queue a job and wait for its result.
    pub async fn run<F, T>(&self, job: F) -> Result<T, PoolError>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.submit(async move {
            let _ = tx.send(job.await);
        })
        .await?;
        rx.await.map_err(|_| PoolError::WorkerDropped)
    }

    /// Stop accepting jobs, finish everything already queued, then stop.
    pub async fn drain(&self) {
        let changed = self.state.send_if_modified(|state| {
            if *state == PoolState::Running {
                *state = PoolState::Draining;
                true
            } else {
                false
            }
        });
        if changed {
            info!("Draining worker pool");
        }
        self.join_workers().await;
    }

    /// Stop all workers and close the queue.
    ///
    /// Jobs already running finish; queued jobs are dropped and their
    /// [`run`](Self::run) callers get [`PoolError::WorkerDropped`].
    pub async fn shutdown(&self) {
        let changed = self.state.send_if_modified(|state| {
            if *state == PoolState::Stopped {
                false
            } else {
                *state = PoolState::Stopped;
                true
            }
        });
        if !changed {
            return;
        }
        info!("Shutting down worker pool");

        {
            let mut queue = self.receiver.lock().await;
            queue.close();
            let mut dropped = 0usize;
            while queue.try_recv().is_ok() {
                dropped += 1;
            }
            if dropped > 0 {
                warn!("Dropped {} queued jobs on shutdown", dropped);
            }
        }

        self.join_workers().await;
    }

    /// Whether the pool has stopped accepting jobs.
    pub fn is_closed(&self) -> bool {
        *self.state.borrow() != PoolState::Running
    }

    async fn join_workers(&self) {
        let workers = match self.workers.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };
        for handle in workers {
            if let Err(e) = handle.await {
                warn!("Worker ended abnormally: {}", e);
            }
        }
    }
}

async fn worker(
    id: usize,
    receiver: Arc<Mutex<mpsc::Receiver<Job>>>,
    mut state: watch::Receiver<PoolState>,
) {
    debug!("Worker {} started", id);
    loop {
        let job = {
            let mut queue = receiver.lock().await;
            loop {
                let current = *state.borrow_and_update();
                match current {
                    PoolState::Stopped => break None,
                    PoolState::Draining => {
                        // Closed channels hand out what is buffered, then None.
                        queue.close();
                        break queue.recv().await;
                    }
                    PoolState::Running => {
                        tokio::select! {
                            biased;
                            changed = state.changed() => {
                                if changed.is_err() {
                                    break None;
                                }
                            }
                            job = queue.recv() => break job,
                        }
                    }
                }
            }
        };

        let Some(job) = job else {
            break;
        };

        // Run on its own task so a panicking job does not take the worker down.
        if let Err(e) = tokio::spawn(job).await {
            warn!("Worker {} job failed: {}", id, e);
        }
    }
    debug!("Worker {} stopped", id);
}
