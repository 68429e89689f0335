//! Fixed-size worker pool used to overlap chunk generation with the search.
//!
//! Jobs travel to the workers over a crossbeam channel and each job is
//! received by exactly one worker. Results of [`ParallelExecutor::submit`]
//! come back on a per-task channel, so no shared result state is needed.
//! Dropping the pool closes the queue, lets the workers drain what is
//! already queued, and joins them.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use tracing::{debug, warn};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Errors reported by the executor or by a task handle.
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    /// The pool has been shut down and accepts no more work.
    #[error("executor has been shut down")]
    ShutDown,

    /// The task panicked while running.
    #[error("task panicked")]
    TaskPanicked,

    /// A worker thread could not be spawned.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Handle to the eventual result of a submitted task.
pub struct TaskHandle<T> {
    receiver: Receiver<std::thread::Result<T>>,
}

impl<T> TaskHandle<T> {
    /// Blocks until the task has run and returns its result.
    pub fn wait(self) -> Result<T, ExecutorError> {
        match self.receiver.recv() {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(_)) => Err(ExecutorError::TaskPanicked),
            // The job was dropped without running, which only happens when
            // the pool was torn down underneath it.
            Err(_) => Err(ExecutorError::ShutDown),
        }
    }

    /// Returns the result if the task has finished, without blocking.
    pub fn try_take(&self) -> Option<Result<T, ExecutorError>> {
        match self.receiver.try_recv() {
            Ok(Ok(value)) => Some(Ok(value)),
            Ok(Err(_)) => Some(Err(ExecutorError::TaskPanicked)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(ExecutorError::ShutDown)),
        }
    }
}

/// A pool of `N` worker threads, `N` fixed at construction.
pub struct ParallelExecutor {
    /// Job queue. `None` once the pool has been shut down.
    sender: Option<Sender<Job>>,
    /// Worker handles, joined on shutdown.
    workers: Vec<JoinHandle<()>>,
    /// Jobs queued or running.
    in_flight: Arc<AtomicUsize>,
}

impl ParallelExecutor {
    /// Spawns `thread_count` workers (at least one).
    pub fn new(thread_count: usize) -> Result<Self, ExecutorError> {
        let thread_count = thread_count.max(1);
        let (sender, receiver) = crossbeam_channel::unbounded::<Job>();
        let in_flight = Arc::new(AtomicUsize::new(0));

        let mut executor = Self {
            sender: Some(sender),
            workers: Vec::with_capacity(thread_count),
            in_flight,
        };

        for index in 0..thread_count {
            let receiver = receiver.clone();
            let in_flight = Arc::clone(&executor.in_flight);
            let spawned = std::thread::Builder::new()
                .name(format!("delve-worker-{index}"))
                .spawn(move || {
                    while let Ok(job) = receiver.recv() {
                        job();
                        in_flight.fetch_sub(1, Ordering::AcqRel);
                    }
                });
            match spawned {
                Ok(handle) => executor.workers.push(handle),
                Err(e) => {
                    // Joins the workers spawned so far.
                    executor.shutdown();
                    return Err(ExecutorError::Spawn(e));
                }
            }
        }

        debug!(threads = thread_count, "started parallel executor");
        Ok(executor)
    }

    /// Creates a pool sized to leave one core for the searching thread.
    pub fn with_defaults() -> Result<Self, ExecutorError> {
        let cpus = num_cpus::get().max(2);
        Self::new(cpus - 1)
    }

    /// Queues a job whose result nobody waits for.
    ///
    /// A panic inside the job is caught and logged so the worker survives.
    pub fn execute<F>(&self, job: F) -> Result<(), ExecutorError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.enqueue(Box::new(move || {
            if catch_unwind(AssertUnwindSafe(job)).is_err() {
                warn!("background task panicked");
            }
        }))
    }

    /// Queues a job and returns a handle to its result.
    pub fn submit<F, T>(&self, job: F) -> Result<TaskHandle<T>, ExecutorError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = crossbeam_channel::bounded(1);
        self.enqueue(Box::new(move || {
            let result = catch_unwind(AssertUnwindSafe(job));
            // The submitter may have dropped its handle.
            let _ = tx.send(result);
        }))?;
        Ok(TaskHandle { receiver: rx })
    }

    /// Number of worker threads.
    pub fn thread_count(&self) -> usize {
        self.workers.len()
    }

    /// Number of jobs queued or currently running.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Closes the queue and waits for every worker to finish its remaining
    /// jobs. Idempotent.
    pub fn shutdown(&mut self) {
        // Dropping the sender makes `recv` fail once the queue is drained.
        if self.sender.take().is_none() && self.workers.is_empty() {
            return;
        }
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                warn!("worker thread exited abnormally");
            }
        }
        debug!("parallel executor shut down");
    }

    fn enqueue(&self, job: Job) -> Result<(), ExecutorError> {
        let sender = self.sender.as_ref().ok_or(ExecutorError::ShutDown)?;
        self.in_flight.fetch_add(1, Ordering::AcqRel);
        if sender.send(job).is_err() {
            self.in_flight.fetch_sub(1, Ordering::AcqRel);
            return Err(ExecutorError::ShutDown);
        }
        Ok(())
    }
}

impl Drop for ParallelExecutor {
    fn drop(&mut self) {
        self.shutdown();
    }
}
