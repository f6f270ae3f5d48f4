use std::{
    any::Any,
    fmt,
    panic::{self, AssertUnwindSafe},
    time::Duration,
};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError};

/// The outcome of a submitted task.
pub type TaskResult<T> = Result<T, TaskError>;

/// The reason a task produced no value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// The task panicked. Holds the panic message.
    Panicked(String),

    /// The task was dropped without being run, because the pool shut
    /// down before a worker picked it up.
    Abandoned,
}

impl TaskError {
    fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = match payload.downcast::<&'static str>() {
            Ok(message) => (*message).to_owned(),
            Err(payload) => match payload.downcast::<String>() {
                Ok(message) => *message,
                Err(_) => "task panicked with a non-string payload".to_owned(),
            },
        };
        TaskError::Panicked(message)
    }
}

impl std::error::Error for TaskError {}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskError::Panicked(message) => write!(f, "task panicked: {message}"),
            TaskError::Abandoned => write!(f, "task was dropped before it ran"),
        }
    }
}

/// The writing side of a [`ResultHandle`], moved into the task.
pub(crate) struct Completer<T> {
    sender: Sender<TaskResult<T>>,
}

impl<T> Completer<T> {
    /// Runs `f`, catching a panic, and records the outcome.
    pub(crate) fn run<F>(self, f: F)
    where
        F: FnOnce() -> T,
    {
        let outcome = panic::catch_unwind(AssertUnwindSafe(f)).map_err(TaskError::from_panic);
        self.complete(outcome);
    }

    fn complete(self, outcome: TaskResult<T>) {
        // The receiver may be gone already; nobody is waiting then.
        let _ = self.sender.send(outcome);
    }
}

/// A handle to the eventual outcome of a task submitted with
/// [`ThreadPool::submit`].
///
/// The outcome is written once by the worker that ran the task and
/// cached by the handle on first retrieval, so later retrievals return
/// the same outcome. Dropping the handle does not stop the task.
///
/// # Examples
///
/// ```
/// use sqpool::{TaskError, ThreadPool};
///
/// let pool = ThreadPool::with_workers(2).unwrap();
///
/// let mut answer = pool.submit(|| 6 * 7);
/// assert_eq!(Ok(42), answer.get());
/// assert_eq!(Ok(42), answer.get());
///
/// let failed = pool.submit(|| -> u32 { panic!("boom") });
/// assert_eq!(Err(TaskError::Panicked("boom".into())), failed.join());
/// ```
///
/// [`ThreadPool::submit`]: crate::ThreadPool::submit
pub struct ResultHandle<T> {
    receiver: Receiver<TaskResult<T>>,
    outcome: Option<TaskResult<T>>,
}

impl<T> ResultHandle<T> {
    pub(crate) fn channel() -> (Completer<T>, Self) {
        let (sender, receiver) = bounded(1);
        (
            Completer { sender },
            Self {
                receiver,
                outcome: None,
            },
        )
    }

    /// Returns `true` if the outcome is available. Never blocks.
    pub fn is_finished(&mut self) -> bool {
        self.try_get().is_some()
    }

    /// Returns the outcome if it is available, `None` otherwise. Never
    /// blocks.
    pub fn try_get(&mut self) -> Option<&TaskResult<T>> {
        if self.outcome.is_none() {
            self.outcome = match self.receiver.try_recv() {
                Ok(outcome) => Some(outcome),
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Disconnected) => Some(Err(TaskError::Abandoned)),
            };
        }
        self.outcome.as_ref()
    }

    /// Blocks until the outcome is available and returns it.
    pub fn wait(&mut self) -> &TaskResult<T> {
        let receiver = &self.receiver;
        self.outcome.get_or_insert_with(|| {
            receiver.recv().unwrap_or(Err(TaskError::Abandoned))
        })
    }

    /// Blocks for at most `timeout` waiting for the outcome. Returns
    /// `None` if it is still pending.
    pub fn wait_timeout(&mut self, timeout: Duration) -> Option<&TaskResult<T>> {
        if self.outcome.is_none() {
            self.outcome = match self.receiver.recv_timeout(timeout) {
                Ok(outcome) => Some(outcome),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => Some(Err(TaskError::Abandoned)),
            };
        }
        self.outcome.as_ref()
    }

    /// Blocks until the outcome is available and returns a copy of it.
    pub fn get(&mut self) -> TaskResult<T>
    where
        T: Clone,
    {
        self.wait().clone()
    }

    /// Blocks until the outcome is available and takes it.
    pub fn join(self) -> TaskResult<T> {
        match self.outcome {
            Some(outcome) => outcome,
            None => self.receiver.recv().unwrap_or(Err(TaskError::Abandoned)),
        }
    }
}

impl<T> fmt::Debug for ResultHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultHandle")
            .field("finished", &self.outcome.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{ResultHandle, TaskError};
    use std::{panic, thread, time::Duration};

    #[test]
    fn test_value_is_cached() {
        let (completer, mut handle) = ResultHandle::channel();
        assert!(!handle.is_finished());
        completer.run(|| String::from("done"));

        assert!(handle.is_finished());
        assert_eq!(Some(&Ok("done".to_string())), handle.try_get());
        assert_eq!(&Ok("done".to_string()), handle.wait());
        assert_eq!(Ok("done".to_string()), handle.get());
        assert_eq!(Ok("done".to_string()), handle.join());
    }

    #[test]
    fn test_panic_is_captured() {
        let (completer, handle) = ResultHandle::<u32>::channel();
        completer.run(|| panic!("boom"));
        assert_eq!(Err(TaskError::Panicked("boom".into())), handle.join());

        let (completer, handle) = ResultHandle::<u32>::channel();
        completer.run(|| panic!("code {}", 7));
        assert_eq!(Err(TaskError::Panicked("code 7".into())), handle.join());

        let (completer, handle) = ResultHandle::<u32>::channel();
        completer.run(|| panic::panic_any(5_u8));
        assert!(matches!(handle.join(), Err(TaskError::Panicked(_))));
    }

    #[test]
    fn test_dropped_completer_reports_abandoned() {
        let (completer, mut handle) = ResultHandle::<u32>::channel();
        drop(completer);
        assert_eq!(Some(&Err(TaskError::Abandoned)), handle.try_get());
        assert_eq!(Err(TaskError::Abandoned), handle.join());
    }

    #[test]
    fn test_wait_timeout() {
        let (completer, mut handle) = ResultHandle::channel();
        assert!(handle.wait_timeout(Duration::from_millis(10)).is_none());

        let writer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            completer.run(|| 1);
        });
        assert_eq!(Some(&Ok(1)), handle.wait_timeout(Duration::from_secs(5)));
        writer.join().unwrap();
    }

    #[test]
    fn test_dropped_handle_does_not_disturb_writer() {
        let (completer, handle) = ResultHandle::channel();
        drop(handle);
        completer.run(|| 1);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            "task panicked: boom",
            TaskError::Panicked("boom".into()).to_string()
        );
        assert_eq!(
            "task was dropped before it ran",
            TaskError::Abandoned.to_string()
        );
    }
}
