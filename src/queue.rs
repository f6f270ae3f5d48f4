use std::{
    collections::VecDeque,
    sync::{Condvar, Mutex, MutexGuard, PoisonError},
};

/// A FIFO queue that can be shared by many producer and consumer
/// threads.
///
/// Every operation takes the same internal lock for its whole
/// duration, so an element observed by a pop is removed in the same
/// step and can never be handed to two consumers.
///
/// # Examples
///
/// ```
/// use sqpool::ConcurrentQueue;
///
/// let queue = ConcurrentQueue::new();
/// queue.push("a");
/// queue.push("b");
///
/// assert_eq!(2, queue.len());
/// assert_eq!(Some("a"), queue.try_pop());
/// assert_eq!("b", queue.wait_and_pop());
/// assert!(queue.try_pop().is_none());
/// ```
#[derive(Debug)]
pub struct ConcurrentQueue<T> {
    items: Mutex<VecDeque<T>>,
    available: Condvar,
}

impl<T> Default for ConcurrentQueue<T> {
    fn default() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
        }
    }
}

impl<T> ConcurrentQueue<T> {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `item` to the tail of the queue and wakes one thread
    /// blocked in [`ConcurrentQueue::wait_and_pop`], if any.
    pub fn push(&self, item: T) {
        let mut items = self.lock();
        items.push_back(item);
        self.available.notify_one();
    }

    /// Blocks until the queue is non-empty, then removes and returns
    /// the head element.
    pub fn wait_and_pop(&self) -> T {
        let mut items = self.lock();
        loop {
            if let Some(item) = items.pop_front() {
                return item;
            }
            // Spurious wakeups land back here and re-check.
            items = self
                .available
                .wait(items)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Removes and returns the head element, or returns `None` at once
    /// if the queue is empty.
    pub fn try_pop(&self) -> Option<T> {
        self.lock().pop_front()
    }

    /// Returns the number of queued elements at the moment the lock
    /// was taken.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if the queue held no elements at the moment the
    /// lock was taken.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // The lock is never held across user code, so a poisoned lock
    // still guards a consistent `VecDeque`.
    fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
