//! # Task System Core Types
//!
//! This module defines the building blocks of the worker pool's queue.
//!
//! ## Core Components
//! - `Task`: A unit of work that runs to completion on a worker thread
//! - `Job`: What actually sits in the queue: either a task, or the request for a
//!   worker to terminate
//! - `JobFailure`: The report produced when a task panics
//!
//! ## Thread Safety
//! - `Task` must be `Send` to be transferred to a worker thread
//! - Tasks own everything they touch (typically through an `Arc`), so they can
//!   outlive the code that queued them

use std::{any::Any, fmt};

/// A trait representing a unit of work that can be executed on a worker thread.
///
/// Tasks are the mechanism for moving expensive work (world generation, meshing)
/// off the threads that need to stay responsive. They should own all the data
/// they need to perform their work.
///
/// # Implementation Guidelines
/// - Must be `Send` to be transferred between threads
/// - Should be relatively coarse-grained to amortize queueing overhead
/// - Should not block on other tasks: the pool has a fixed number of workers
pub trait Task: Send {
    /// Runs the task, consuming it.
    ///
    /// A panic inside `process` is caught by the worker and reported as a
    /// `JobFailure`; it does not take the worker down.
    fn process(self: Box<Self>);
}

/// A `Task` made from a closure.
pub struct FnTask<F>(F);

/// Boxes a closure as a task ready to be queued.
pub fn from_fn(f: impl FnOnce() + Send + 'static) -> Box<dyn Task> {
    Box::new(FnTask(f))
}

impl<F: FnOnce() + Send> Task for FnTask<F> {
    fn process(self: Box<Self>) {
        (self.0)()
    }
}

/// An entry in the worker pool's queue.
///
/// Only the pool itself queues `Terminate`.
pub enum Job {
    /// Run this task.
    Work(Box<dyn Task>),
    /// The worker that dequeues this should exit. It is left in the queue so
    /// that every worker sees it.
    Terminate,
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Job::Work(_) => write!(f, "Job::Work(..)"),
            Job::Terminate => write!(f, "Job::Terminate"),
        }
    }
}

/// Report of a task that panicked on a worker thread.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JobFailure {
    /// Name of the worker thread that ran the task.
    pub worker: String,
    /// The panic message, when it was a string.
    pub message: String,
}

impl JobFailure {
    pub(super) fn from_panic(worker: &str, payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(message) = payload.downcast_ref::<&str>() {
            (*message).to_string()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            "non-string panic payload".to_string()
        };

        JobFailure {
            worker: worker.to_string(),
            message,
        }
    }
}

impl fmt::Display for JobFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job on {} panicked: {}", self.worker, self.message)
    }
}
