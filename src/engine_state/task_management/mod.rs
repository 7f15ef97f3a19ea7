//! # Task Management System
//!
//! This module provides `ThreadPool`, a fixed-size pool of worker threads that
//! drain a single shared FIFO job queue.
//!
//! ## Architecture Overview
//!
//! - `ThreadPool`: Owns the workers and the queue
//! - `Task`: A unit of work that can be executed on a worker
//! - `Job`: A queue entry, either a task or the terminate request
//!
//! ## Task Lifecycle
//! 1. Tasks are queued with `ThreadPool::enqueue()` or, for a whole batch at once,
//!    `ThreadPool::enqueue_batch()`
//! 2. An idle worker wakes, dequeues the oldest job under the queue lock, releases
//!    the lock and runs it
//! 3. A panicking task is caught and reported through `drain_failures()`
//! 4. `ThreadPool::stop()` (or dropping the pool) discards every job that hasn't
//!    started, lets in-flight jobs finish, and joins every worker
//!
//! ## Ordering
//! Jobs are dequeued in FIFO order. Nothing is guaranteed about completion order,
//! or about which worker runs which job.
//!
//! ## Example Usage
//! ```rust
//! use std::sync::{atomic::{AtomicUsize, Ordering}, Arc};
//! use voxel_streamer::engine_state::task_management::{task, ThreadPool};
//!
//! let pool = ThreadPool::new(2).unwrap();
//! let counter = Arc::new(AtomicUsize::new(0));
//!
//! let job_counter = counter.clone();
//! pool.enqueue(task::from_fn(move || {
//!     job_counter.fetch_add(1, Ordering::SeqCst);
//! }))
//! .unwrap();
//!
//! pool.wait_idle();
//! pool.stop();
//! assert_eq!(counter.load(Ordering::SeqCst), 1);
//! ```

pub mod task;

use std::{
    collections::VecDeque,
    fmt, io,
    panic::{self, AssertUnwindSafe},
    sync::{
        mpsc::{channel, Receiver, Sender},
        Arc, Condvar, Mutex, MutexGuard, PoisonError,
    },
    thread::{self, JoinHandle},
};

use log::{error, info};
use task::{Job, JobFailure, Task};

/// Errors raised by `ThreadPool` when it is used against its contract.
#[derive(Debug)]
pub enum PoolError {
    /// The pool was asked to start with zero workers.
    NoWorkers,
    /// A job was queued after the pool was stopped.
    Stopped,
    /// The operating system refused to spawn a worker thread.
    Spawn(io::Error),
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoWorkers => write!(f, "thread pool must have at least one thread"),
            Self::Stopped => write!(f, "attempt to enqueue job on stopped thread pool"),
            Self::Spawn(error) => write!(f, "failed to spawn worker thread: {error}"),
        }
    }
}

impl std::error::Error for PoolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Spawn(error) => Some(error),
            _ => None,
        }
    }
}

/// Queue state guarded by the pool's queue lock.
struct JobQueue {
    jobs: VecDeque<Job>,
    /// Jobs dequeued but not yet finished.
    in_flight: usize,
    /// Cleared by `stop()`; enqueueing is refused once it is false.
    accepting: bool,
}

/// State shared between the pool handle and its workers.
struct PoolShared {
    queue: Mutex<JobQueue>,
    /// Signalled when a job (or the terminate request) is queued.
    job_available: Condvar,
    /// Signalled when the queue drains and nothing is in flight.
    idle: Condvar,
}

impl PoolShared {
    fn lock_queue(&self) -> MutexGuard<'_, JobQueue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A fixed-size pool of worker threads consuming a shared job queue.
///
/// The pool has a fixed number of workers from construction until `stop()`.
/// Dropping the pool calls `stop()`, so the drop blocks until every worker has
/// exited. Anything a queued task references must therefore be owned by the task
/// (for example through an `Arc`); the pool never outlives its workers.
///
/// # Implementation Notes
/// - One mutex guards the queue; workers never hold it while running a task
/// - Stopping is idempotent, and concurrent `stop()` calls all block until the
///   workers are joined
/// - Panic-safe: a panicking task is reported, and its worker keeps running
pub struct ThreadPool {
    shared: Arc<PoolShared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    failure_sender: Sender<JobFailure>,
    failure_receiver: Mutex<Receiver<JobFailure>>,
}

impl ThreadPool {
    /// Creates a new `ThreadPool` with the specified number of worker threads.
    ///
    /// # Arguments
    /// * `num_workers` - Number of worker threads to spawn
    ///
    /// # Returns
    /// The running pool, `PoolError::NoWorkers` when `num_workers` is zero, or
    /// `PoolError::Spawn` if a thread couldn't be created (any workers already
    /// spawned are stopped and joined first)
    pub fn new(num_workers: usize) -> Result<Self, PoolError> {
        if num_workers == 0 {
            return Err(PoolError::NoWorkers);
        }

        let (failure_sender, failure_receiver) = channel();
        let pool = ThreadPool {
            shared: Arc::new(PoolShared {
                queue: Mutex::new(JobQueue {
                    jobs: VecDeque::new(),
                    in_flight: 0,
                    accepting: true,
                }),
                job_available: Condvar::new(),
                idle: Condvar::new(),
            }),
            workers: Mutex::new(Vec::with_capacity(num_workers)),
            failure_sender,
            failure_receiver: Mutex::new(failure_receiver),
        };

        for index in 0..num_workers {
            let shared = pool.shared.clone();
            let failures = pool.failure_sender.clone();
            let name = format!("chunk-worker-{index}");

            let worker = thread::Builder::new()
                .name(name.clone())
                .spawn(move || worker_main(&name, &shared, &failures))
                .map_err(PoolError::Spawn)?;

            pool.lock_workers().push(worker);
        }

        info!("Thread pool started with {num_workers} workers");

        Ok(pool)
    }

    /// Queues a single task and wakes one idle worker.
    ///
    /// # Returns
    /// `PoolError::Stopped` if the pool has been stopped; the task is dropped
    pub fn enqueue(&self, task: Box<dyn Task>) -> Result<(), PoolError> {
        {
            let mut queue = self.shared.lock_queue();
            if !queue.accepting {
                return Err(PoolError::Stopped);
            }
            queue.jobs.push_back(Job::Work(task));
        }

        self.shared.job_available.notify_one();
        Ok(())
    }

    /// Queues a batch of tasks under a single lock acquisition and wakes every
    /// idle worker.
    ///
    /// # Returns
    /// `PoolError::Stopped` if the pool has been stopped; the tasks are dropped
    pub fn enqueue_batch(
        &self,
        tasks: impl IntoIterator<Item = Box<dyn Task>>,
    ) -> Result<(), PoolError> {
        {
            let mut queue = self.shared.lock_queue();
            if !queue.accepting {
                return Err(PoolError::Stopped);
            }
            queue.jobs.extend(tasks.into_iter().map(Job::Work));
        }

        self.shared.job_available.notify_all();
        Ok(())
    }

    /// Stops and joins every worker, discarding any jobs that haven't started.
    ///
    /// Jobs already running finish first. Calling `stop()` again (or dropping the
    /// pool afterwards) is a no-op.
    pub fn stop(&self) {
        // Held across the joins so a concurrent `stop()` waits for them too.
        let mut workers = self.lock_workers();

        let discarded = {
            let mut queue = self.shared.lock_queue();
            if !queue.accepting {
                return;
            }
            queue.accepting = false;
            let discarded = std::mem::take(&mut queue.jobs);
            queue.jobs.push_back(Job::Terminate);
            discarded
        };

        // Dropped outside the lock: tasks may run cleanup in their destructors.
        let discarded_count = discarded.len();
        drop(discarded);

        self.shared.job_available.notify_all();

        for worker in workers.drain(..) {
            if worker.join().is_err() {
                error!("Worker thread exited abnormally");
            }
        }

        self.shared.lock_queue().jobs.clear();
        self.shared.idle.notify_all();

        info!("Thread pool stopped, {discarded_count} queued jobs discarded");
    }

    /// Blocks until the queue is empty and no job is running, or the pool is
    /// stopped.
    pub fn wait_idle(&self) {
        let queue = self.shared.lock_queue();
        let _queue = self
            .shared
            .idle
            .wait_while(queue, |queue| {
                queue.accepting && (!queue.jobs.is_empty() || queue.in_flight > 0)
            })
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// Whether the pool still accepts jobs.
    pub fn is_running(&self) -> bool {
        self.shared.lock_queue().accepting
    }

    /// Number of live worker threads (zero once stopped).
    pub fn worker_count(&self) -> usize {
        self.lock_workers().len()
    }

    /// Number of jobs waiting for a worker.
    pub fn queued_len(&self) -> usize {
        let queue = self.shared.lock_queue();
        if queue.accepting {
            queue.jobs.len()
        } else {
            0
        }
    }

    /// Takes every failure report produced since the last call.
    pub fn drain_failures(&self) -> Vec<JobFailure> {
        self.failure_receiver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .try_iter()
            .collect()
    }

    fn lock_workers(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.workers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Main loop of each worker thread.
fn worker_main(name: &str, shared: &PoolShared, failures: &Sender<JobFailure>) {
    loop {
        let task = {
            let queue = shared.lock_queue();
            let mut queue = shared
                .job_available
                .wait_while(queue, |queue| queue.jobs.is_empty())
                .unwrap_or_else(PoisonError::into_inner);

            match queue.jobs.pop_front() {
                Some(Job::Work(task)) => {
                    queue.in_flight += 1;
                    task
                }
                Some(Job::Terminate) => {
                    queue.jobs.push_front(Job::Terminate);
                    return;
                }
                None => continue,
            }
        };

        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| task.process())) {
            let failure = JobFailure::from_panic(name, payload);
            error!("{failure}");
            let _ = failures.send(failure);
        }

        let mut queue = shared.lock_queue();
        queue.in_flight -= 1;
        if queue.jobs.is_empty() && queue.in_flight == 0 {
            shared.idle.notify_all();
        }
    }
}
