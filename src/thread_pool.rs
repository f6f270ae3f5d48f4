use crate::{
    handle::ResultHandle,
    queue::ConcurrentQueue,
    task::{Task, TaskListeners},
    worker::Worker,
    IdleStrategy, ThreadPoolBuilder,
};

use log::{debug, info, trace};

use std::{
    fmt, io, mem,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
    thread,
};

/// A function that used to create a custom thread.
pub type ThreadFactory = dyn Fn() -> thread::Builder + Send + Sync + 'static;

/// An error returned when a [`ThreadPool`] can not be built.
#[derive(Debug)]
pub enum PoolError {
    /// The worker thread with the given index failed to start.
    Spawn { index: usize, source: io::Error },
}

impl std::error::Error for PoolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PoolError::Spawn { source, .. } => Some(source),
        }
    }
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolError::Spawn { index, source } => {
                write!(f, "failed to spawn worker thread {index}: {source}")
            }
        }
    }
}

/// What happens to queued tasks when the pool shuts down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShutdownPolicy {
    /// Workers keep running queued tasks until the queue is empty.
    #[default]
    Drain,

    /// Workers exit as soon as they see the shutdown flag. Tasks still
    /// queued are dropped and their handles report
    /// [`TaskError::Abandoned`].
    ///
    /// [`TaskError::Abandoned`]: crate::TaskError::Abandoned
    Abandon,
}

/// The lifecycle stage of a [`ThreadPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    /// All workers are started and accepting tasks.
    Running,
    /// The shutdown flag is set; workers are finishing up.
    ShuttingDown,
    /// Every worker has exited and been joined.
    Terminated,
}

pub(crate) struct ThreadPoolSharedData {
    pub(crate) queue: ConcurrentQueue<Task>,
    pub(crate) shutdown: AtomicBool,
    pub(crate) next_task_id: AtomicUsize,
    pub(crate) idle_strategy: IdleStrategy,
    pub(crate) shutdown_policy: ShutdownPolicy,
    pub(crate) task_listeners: TaskListeners,
}

impl ThreadPoolSharedData {
    pub(crate) fn new(
        idle_strategy: IdleStrategy,
        shutdown_policy: ShutdownPolicy,
        task_listeners: TaskListeners,
    ) -> Self {
        Self {
            queue: ConcurrentQueue::new(),
            shutdown: AtomicBool::new(false),
            next_task_id: AtomicUsize::new(0),
            idle_strategy,
            shutdown_policy,
            task_listeners,
        }
    }

    #[inline]
    pub(crate) fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    #[inline]
    pub(crate) fn should_abandon(&self) -> bool {
        self.shutdown_policy == ShutdownPolicy::Abandon && self.is_shutdown()
    }

    /// Sets the shutdown flag and pushes one stop marker per worker.
    /// Returns `false` if the flag was already set.
    pub(crate) fn begin_shutdown(&self, workers: usize) -> bool {
        if self.shutdown.swap(true, Ordering::AcqRel) {
            return false;
        }
        for _ in 0..workers {
            self.queue.push(Task::default());
        }
        true
    }
}

/// A `ThreadPool` runs submitted closures on a fixed set of worker
/// threads that all draw from one shared FIFO queue.
///
/// # Submitting
///
/// [`ThreadPool::submit`] boxes a closure into a [`Task`], pushes it
/// onto the queue and immediately returns a [`ResultHandle`] that will
/// hold the closure's return value, or the message of its panic. A
/// panicking task never takes its worker down.
///
/// # Worker Threads
///
/// Each worker repeatedly takes the head of the queue and runs it.
/// While the queue is empty it either yields the processor and polls
/// again, or sleeps until a task arrives (see [`IdleStrategy`]). Tasks
/// become eligible in submission order, but with several workers no
/// order of completion is implied.
///
/// # Shutdown
///
/// [`ThreadPool::shutdown`] sets a flag that every worker checks. What
/// happens to the tasks still in the queue depends on the
/// [`ShutdownPolicy`]. [`ThreadPool::join`], called implicitly on drop,
/// waits for every worker to exit. Tasks submitted after shutdown are
/// never run.
///
/// # Examples
///
/// ```
/// use sqpool::ThreadPool;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// let mut thread_pool = ThreadPool::with_workers(4).unwrap();
///
/// let sum = Arc::new(AtomicUsize::new(0));
/// for _ in 0..10 {
///     let sum = sum.clone();
///     thread_pool.execute(move || {
///         sum.fetch_add(1, Ordering::SeqCst);
///     });
/// }
///
/// // Block current thread until all queued tasks are done.
/// thread_pool.join().unwrap();
/// assert_eq!(10, sum.load(Ordering::Relaxed));
/// ```
pub struct ThreadPool {
    share: Arc<ThreadPoolSharedData>,
    workers: Vec<Worker>,
    worker_count: usize,
}

impl ThreadPool {
    /// Creates a thread pool with the default configuration.
    ///
    /// # Errors
    ///
    /// See [`ThreadPoolBuilder::build`].
    pub fn new() -> Result<Self, PoolError> {
        ThreadPoolBuilder::default().build()
    }

    /// Creates a thread pool with `count` workers and otherwise default
    /// configuration.
    ///
    /// # Errors
    ///
    /// See [`ThreadPoolBuilder::build`].
    pub fn with_workers(count: usize) -> Result<Self, PoolError> {
        ThreadPoolBuilder::default().worker_count(count).build()
    }

    /// Returns a builder for a customized thread pool.
    #[must_use]
    pub fn builder() -> ThreadPoolBuilder {
        ThreadPoolBuilder::default()
    }

    /// Builds a thread pool from a configuration(builder).
    ///
    /// This assumes arguments of the builder are valid.
    pub(crate) fn from_builder(builder: ThreadPoolBuilder) -> Result<Self, PoolError> {
        let ThreadPoolBuilder {
            worker_count,
            idle_strategy,
            shutdown_policy,
            thread_name,
            task_listeners,
            thread_factory,
        } = builder;

        info!("creating {worker_count} worker threads");
        let share = Arc::new(ThreadPoolSharedData::new(
            idle_strategy,
            shutdown_policy,
            task_listeners,
        ));
        let workers = start_workers(worker_count, &share, |id, share| {
            Worker::spawn(id, &*thread_factory, thread_name.as_deref(), share)
        })?;

        Ok(Self {
            share,
            workers,
            worker_count,
        })
    }

    /// Submits `f` to be run by a worker and returns a handle to its
    /// outcome without waiting for it.
    ///
    /// If the pool is already shutting down, the task is dropped and
    /// the handle reports [`TaskError::Abandoned`].
    ///
    /// [`TaskError::Abandoned`]: crate::TaskError::Abandoned
    pub fn submit<F, T>(&self, f: F) -> ResultHandle<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (completer, handle) = ResultHandle::channel();
        let id = self.share.next_task_id.fetch_add(1, Ordering::Relaxed);
        let task = Task::new(id, move || completer.run(f));
        if !self.share.is_shutdown() {
            self.share.queue.push(task);
        }
        handle
    }

    /// Submits `f` without keeping a handle to its outcome.
    pub fn execute<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.submit(f);
    }

    /// Returns the number of worker threads the pool was built with.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Returns the number of tasks waiting in the queue. The value may
    /// be stale as soon as it is returned.
    #[must_use]
    pub fn queued_count(&self) -> usize {
        self.share.queue.len()
    }

    #[must_use]
    pub fn state(&self) -> PoolState {
        if !self.share.is_shutdown() {
            PoolState::Running
        } else if self.workers.is_empty() {
            PoolState::Terminated
        } else {
            PoolState::ShuttingDown
        }
    }

    /// Signals every worker to stop. Does not wait for them; see
    /// [`ThreadPool::join`].
    pub fn shutdown(&self) {
        if self.share.begin_shutdown(self.worker_count) {
            debug!("shutting down thread pool ({:?})", self.share.shutdown_policy);
        }
    }

    /// Shuts the pool down and waits for all worker threads to exit.
    /// Tasks left in the queue afterwards are dropped.
    ///
    /// If this is called in a worker thread, that worker thread will
    /// not be joined.
    ///
    /// # Errors
    /// An error is returned if a worker thread panicked.
    pub fn join(&mut self) -> thread::Result<()> {
        self.shutdown();
        let workers = mem::take(&mut self.workers);
        if workers.is_empty() {
            return Ok(());
        }

        let mut result = Ok(());
        for worker in workers {
            trace!("joining worker {}", worker.id);
            if let Err(err) = worker.join() {
                result = result.and(Err(err));
            }
        }
        // Anything still queued will never run; resolve its handles.
        while self.share.queue.try_pop().is_some() {}
        debug!("thread pool terminated");
        result
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        let _ = self.join();
    }
}

impl fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadPool")
            .field("worker_count", &self.worker_count)
            .field("state", &self.state())
            .field("queued", &self.queued_count())
            .finish()
    }
}

/// Starts `count` workers with `spawn`. If one fails to start, the
/// ones already running are shut down and joined before the error is
/// returned.
fn start_workers<S>(
    count: usize,
    share: &Arc<ThreadPoolSharedData>,
    mut spawn: S,
) -> Result<Vec<Worker>, PoolError>
where
    S: FnMut(usize, Arc<ThreadPoolSharedData>) -> io::Result<Worker>,
{
    let mut workers = Vec::with_capacity(count);
    for index in 0..count {
        match spawn(index, share.clone()) {
            Ok(worker) => workers.push(worker),
            Err(source) => {
                share.begin_shutdown(workers.len());
                for worker in workers {
                    let _ = worker.join();
                }
                return Err(PoolError::Spawn { index, source });
            }
        }
    }
    Ok(workers)
}
