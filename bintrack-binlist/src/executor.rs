//! Bounded, shared execution of per-chromosome task batches.
//!
//! One [`ExecutionCoordinator`] owns a rayon pool with a fixed worker count.
//! Clones share that pool, so every component that holds a coordinator draws
//! from the same bounded set of threads. Work is submitted as a [`TaskBatch`]:
//! the caller pushes independent tasks, then [`TaskBatch::join`] blocks until
//! all of them have run and returns their results in submission order.

use std::any::Any;
use std::fmt::{self, Display};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use indicatif::ProgressBar;
use log::{debug, warn};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use thiserror::Error;

use crate::consts::WORKER_THREAD_PREFIX;

#[derive(Error, Debug)]
pub enum BatchError<E>
where
    E: std::error::Error + 'static,
{
    #[error("task {index} failed: {source}")]
    TaskFailed {
        index: usize,
        #[source]
        source: E,
    },

    #[error("task {index} panicked: {message}")]
    TaskPanicked { index: usize, message: String },
}

/// Receives one notification per completed task.
pub trait ProgressListener: Send + Sync {
    fn task_completed(&self);
}

impl ProgressListener for ProgressBar {
    fn task_completed(&self) {
        self.inc(1);
    }
}

///
/// Best-effort cancellation flag shared by every clone of a coordinator.
///
/// Batches never consult it. Long-running callers poll it between batches.
///
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Lifecycle of one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Idle,
    Dispatching,
    Awaiting,
    Completed,
    Failed,
}

impl Display for BatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BatchState::Idle => "idle",
            BatchState::Dispatching => "dispatching",
            BatchState::Awaiting => "awaiting",
            BatchState::Completed => "completed",
            BatchState::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

///
/// Handle to the shared bounded worker pool.
///
#[derive(Clone)]
pub struct ExecutionCoordinator {
    pool: Arc<ThreadPool>,
    stop: StopSignal,
    progress: Option<Arc<dyn ProgressListener>>,
}

impl ExecutionCoordinator {
    ///
    /// Build a pool with `num_threads` workers. Zero means one worker per
    /// available hardware thread.
    ///
    pub fn new(num_threads: usize) -> Result<Self, ThreadPoolBuildError> {
        let num_threads = match num_threads {
            0 => default_worker_count(),
            n => n,
        };

        let pool = ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(|i| format!("{}-{}", WORKER_THREAD_PREFIX, i))
            .build()?;

        debug!("Started worker pool with {} threads", num_threads);

        Ok(ExecutionCoordinator {
            pool: Arc::new(pool),
            stop: StopSignal::default(),
            progress: None,
        })
    }

    /// A handle on the same pool that reports completed tasks to `listener`.
    pub fn with_progress(&self, listener: Arc<dyn ProgressListener>) -> Self {
        ExecutionCoordinator {
            pool: Arc::clone(&self.pool),
            stop: self.stop.clone(),
            progress: Some(listener),
        }
    }

    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    /// Start an empty batch on this pool.
    pub fn batch<'a, T, E>(&self) -> TaskBatch<'_, 'a, T, E>
    where
        T: Send,
        E: std::error::Error + Send + 'static,
    {
        TaskBatch {
            coordinator: self,
            tasks: Vec::new(),
            state: BatchState::Idle,
        }
    }

    ///
    /// Run `tasks` on the pool and wait for all of them.
    ///
    /// Results come back in the order of `tasks`. When several tasks fail, the
    /// error of the earliest one in submission order is returned.
    ///
    pub fn run_all<'a, T, E, F>(&self, tasks: Vec<F>) -> Result<Vec<T>, BatchError<E>>
    where
        T: Send,
        E: std::error::Error + Send + 'static,
        F: FnOnce() -> Result<T, E> + Send + 'a,
    {
        let mut batch = self.batch();
        for task in tasks {
            batch.push(task);
        }
        batch.join()
    }
}

impl fmt::Debug for ExecutionCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionCoordinator")
            .field("num_threads", &self.num_threads())
            .field("stop_requested", &self.stop.is_stop_requested())
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

pub fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

type Task<'a, T, E> = Box<dyn FnOnce() -> Result<T, E> + Send + 'a>;

enum TaskOutcome<T, E> {
    Done(T),
    Failed(E),
    Panicked(String),
}

///
/// A set of independent tasks that run together and are joined together.
///
/// Tasks may borrow from the caller's stack for `'a`; `join` does not return
/// before every task has finished, and consumes the batch so nothing can be
/// added once it is awaiting.
///
pub struct TaskBatch<'c, 'a, T, E> {
    coordinator: &'c ExecutionCoordinator,
    tasks: Vec<Task<'a, T, E>>,
    state: BatchState,
}

impl<'a, T, E> TaskBatch<'_, 'a, T, E>
where
    T: Send,
    E: std::error::Error + Send + 'static,
{
    pub fn push<F>(&mut self, task: F)
    where
        F: FnOnce() -> Result<T, E> + Send + 'a,
    {
        self.tasks.push(Box::new(task));
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn state(&self) -> BatchState {
        self.state
    }

    fn transition(&mut self, next: BatchState, tasks: usize) {
        log_transition(tasks, self.state, next);
        self.state = next;
    }

    /// Run every task and block until all have finished.
    pub fn join(mut self) -> Result<Vec<T>, BatchError<E>> {
        let count = self.tasks.len();
        let idle = self.state;
        let tasks = std::mem::take(&mut self.tasks);
        let coordinator = self.coordinator;
        let progress = coordinator.progress.as_deref();

        // Dispatch happens on a pool thread; the caller blocks in `collect`
        // until every task has reported.
        let outcomes: Vec<TaskOutcome<T, E>> = coordinator.pool.install(|| {
            log_transition(count, idle, BatchState::Dispatching);
            let pending = tasks.into_par_iter().map(|task| {
                let outcome = match panic::catch_unwind(AssertUnwindSafe(task)) {
                    Ok(Ok(value)) => TaskOutcome::Done(value),
                    Ok(Err(e)) => TaskOutcome::Failed(e),
                    Err(payload) => TaskOutcome::Panicked(panic_message(payload)),
                };
                notify(progress);
                outcome
            });
            log_transition(count, BatchState::Dispatching, BatchState::Awaiting);
            pending.collect()
        });
        self.state = BatchState::Awaiting;

        let mut results = Vec::with_capacity(outcomes.len());
        for (index, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                TaskOutcome::Done(value) => results.push(value),
                TaskOutcome::Failed(source) => {
                    self.transition(BatchState::Failed, count);
                    return Err(BatchError::TaskFailed { index, source });
                }
                TaskOutcome::Panicked(message) => {
                    self.transition(BatchState::Failed, count);
                    return Err(BatchError::TaskPanicked { index, message });
                }
            }
        }

        self.transition(BatchState::Completed, count);
        Ok(results)
    }
}

fn log_transition(tasks: usize, from: BatchState, next: BatchState) {
    debug!("batch of {} tasks: {} -> {}", tasks, from, next);
}

fn notify(progress: Option<&dyn ProgressListener>) {
    if let Some(listener) = progress {
        if panic::catch_unwind(AssertUnwindSafe(|| listener.task_completed())).is_err() {
            warn!("Progress listener panicked; ignoring");
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
