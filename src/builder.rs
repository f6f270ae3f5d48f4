use std::thread;

use crate::{
    task::TaskListeners, IdleStrategy, PoolError, ShutdownPolicy, ThreadFactory, ThreadPool,
};

/// Returns the default number of worker threads: the number of logical
/// CPUs available to this process, at least 1.
#[must_use]
pub fn default_worker_count() -> usize {
    usize::max(1, num_cpus::get())
}

/// A builder of the [`ThreadPool`], which can be used to configure
/// the properties of a new thread pool.
///
/// # Examples
///
/// ```
/// use sqpool::{IdleStrategy, ShutdownPolicy, ThreadPoolBuilder};
///
/// let thread_pool = ThreadPoolBuilder::default()
///     .worker_count(4)
///     .idle_strategy(IdleStrategy::Block)
///     .shutdown_policy(ShutdownPolicy::Drain)
///     .thread_name("sq")
///     .listener_before_execute(|id| println!("the task {} will be executed.", id))
///     .listener_after_execute(|id| println!("the task {} has been executed.", id))
///     .thread_factory_fn(|| std::thread::Builder::new().stack_size(64 * 1024))
///     .build()
///     .unwrap();
///
/// assert_eq!(4, thread_pool.worker_count());
/// ```
pub struct ThreadPoolBuilder {
    pub(crate) worker_count: usize,
    pub(crate) idle_strategy: IdleStrategy,
    pub(crate) shutdown_policy: ShutdownPolicy,
    pub(crate) thread_name: Option<String>,
    pub(crate) task_listeners: TaskListeners,
    pub(crate) thread_factory: Box<ThreadFactory>,
}

impl Default for ThreadPoolBuilder {
    /// Creates a new builder with the default configuration.
    ///
    /// # Default Configuration
    /// - `worker_count`: [`default_worker_count`]
    /// - `idle_strategy`: [`IdleStrategy::Yield`]
    /// - `shutdown_policy`: [`ShutdownPolicy::Drain`]
    /// - `thread_name`: unnamed threads
    /// - `before_execute`: an empty closure `|_| ()`
    /// - `after_execute`: an empty closure `|_| ()`
    /// - `thread_factory`: `|| thread::Builder::new()`
    fn default() -> Self {
        Self {
            worker_count: default_worker_count(),
            idle_strategy: IdleStrategy::default(),
            shutdown_policy: ShutdownPolicy::default(),
            thread_name: None,
            task_listeners: TaskListeners::default(),
            thread_factory: Box::new(thread::Builder::new),
        }
    }
}

impl ThreadPoolBuilder {
    /// Creates the base configuration for the new thread pool.
    ///
    /// See: [`ThreadPoolBuilder::default`]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of worker threads. It never changes after the
    /// pool is built.
    #[must_use]
    pub fn worker_count(mut self, count: usize) -> Self {
        self.worker_count = count;
        self
    }

    /// Sets how idle workers wait for new tasks.
    #[must_use]
    pub fn idle_strategy(mut self, strategy: IdleStrategy) -> Self {
        self.idle_strategy = strategy;
        self
    }

    /// Sets what happens to queued tasks when the pool shuts down.
    #[must_use]
    pub fn shutdown_policy(mut self, policy: ShutdownPolicy) -> Self {
        self.shutdown_policy = policy;
        self
    }

    /// Names worker threads `"{prefix}-{index}"`.
    #[must_use]
    pub fn thread_name<S: Into<String>>(mut self, prefix: S) -> Self {
        self.thread_name = Some(prefix.into());
        self
    }

    /// Sets the listener function that will be invoked before a task
    /// is executed.
    #[must_use]
    pub fn listener_before_execute<F>(mut self, listener: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.task_listeners.before_execute = Box::new(listener);
        self
    }

    /// Sets the listener function that will be invoked after a task
    /// is executed.
    #[must_use]
    pub fn listener_after_execute<F>(mut self, listener: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.task_listeners.after_execute = Box::new(listener);
        self
    }

    /// Sets the factory function that is used to create each worker
    /// thread.
    #[must_use]
    pub fn thread_factory_fn<F>(mut self, f: F) -> Self
    where
        F: Fn() -> thread::Builder + Send + Sync + 'static,
    {
        self.thread_factory = Box::new(f);
        self
    }

    /// Creates a thread pool with the arguments and starts its workers.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Spawn`] if a worker thread fails to start.
    /// Workers started before the failure are shut down and joined
    /// first.
    ///
    /// # Panics
    ///
    /// Panics if the worker count is 0.
    pub fn build(self) -> Result<ThreadPool, PoolError> {
        self.check_arguments();
        ThreadPool::from_builder(self)
    }

    fn check_arguments(&self) {
        if self.worker_count == 0 {
            panic!("worker_count can not be 0.");
        }
    }
}
