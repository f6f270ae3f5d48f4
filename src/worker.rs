use std::{
    io,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
    thread::{self, JoinHandle},
};

use log::trace;

use crate::{task::Task, thread_pool::ThreadPoolSharedData, ThreadFactory};

/// How a worker waits while the queue is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdleStrategy {
    /// Poll the queue without blocking and yield the processor between
    /// attempts. Lowest latency, but idle workers keep a core busy.
    #[default]
    Yield,

    /// Sleep until a task is pushed. Shutdown wakes sleeping workers
    /// with one empty stop-marker task per worker.
    Block,
}

/// A worker holds the handle of one pool thread.
pub(crate) struct Worker {
    pub(crate) id: usize,
    pub(crate) handle: JoinHandle<()>,
}

impl Worker {
    pub(crate) fn spawn(
        id: usize,
        thread_factory: &ThreadFactory,
        thread_name: Option<&str>,
        share: Arc<ThreadPoolSharedData>,
    ) -> io::Result<Self> {
        let mut builder = thread_factory();
        if let Some(prefix) = thread_name {
            builder = builder.name(format!("{prefix}-{id}"));
        }
        let handle = builder.spawn(move || run(id, &share))?;
        Ok(Worker { id, handle })
    }

    /// Waits for the worker thread to exit. A worker never joins
    /// itself.
    pub(crate) fn join(self) -> thread::Result<()> {
        if self.handle.thread().id() != thread::current().id() {
            self.handle.join()?;
        }
        Ok(())
    }
}

fn run(id: usize, share: &ThreadPoolSharedData) {
    trace!("worker {id} started");
    while let Some(task) = next_task(share) {
        // A task body never unwinds past its completer, but a listener
        // may. Either way the worker keeps going.
        let _ = panic::catch_unwind(AssertUnwindSafe(|| task.run(&share.task_listeners)));
    }
    trace!("worker {id} exiting");
}

/// Returns the next task to run, or `None` once the worker should exit.
fn next_task(share: &ThreadPoolSharedData) -> Option<Task> {
    loop {
        if share.should_abandon() {
            return None;
        }
        let task = match share.idle_strategy {
            IdleStrategy::Yield => match share.queue.try_pop() {
                Some(task) => task,
                // A task pushed just before the flag was set is visible
                // to a second pop once the flag has been observed.
                None if share.is_shutdown() => share.queue.try_pop()?,
                None => {
                    thread::yield_now();
                    continue;
                }
            },
            IdleStrategy::Block => share.queue.wait_and_pop(),
        };
        // Empty tasks are stop markers; a task popped after an abandoning
        // shutdown is dropped here.
        if task.is_empty() || share.should_abandon() {
            return None;
        }
        return Some(task);
    }
}
