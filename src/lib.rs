//! # Thread Pool
//!
//! A fixed number of worker threads that run closures submitted from
//! any thread. Closures of any captured state and return type share a
//! single FIFO queue; each submission returns a [`ResultHandle`] that
//! later yields the closure's return value, or the message of its
//! panic.
//!
//! # Build a thread pool
//!
//! [`ThreadPool::new`] starts one worker per logical CPU. Use the
//! [`ThreadPoolBuilder`] to pick the worker count, how idle workers
//! wait and what happens to queued tasks on shutdown.
//!
//! # Examples
//!
//! ```
//! use sqpool::ThreadPoolBuilder;
//! let mut thread_pool = ThreadPoolBuilder::default()
//!     .worker_count(4)
//!     .build()
//!     .unwrap();
//!
//! let greeting = thread_pool.submit(|| format!("Hello {}", "World"));
//! assert_eq!(Ok("Hello World".to_string()), greeting.join());
//!
//! // Close the thread pool and wait for all worker threads to end.
//! thread_pool.join().unwrap();
//! ```

mod builder;
mod handle;
mod queue;
mod thread_pool;

pub(crate) mod task;
pub(crate) mod worker;

pub use builder::*;
pub use handle::{ResultHandle, TaskError, TaskResult};
pub use queue::ConcurrentQueue;
pub use task::{Task, TaskFn};
pub use thread_pool::*;
pub use worker::IdleStrategy;
