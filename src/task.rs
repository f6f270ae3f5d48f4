use std::fmt;

/// The boxed body of a [`Task`].
pub type TaskFn = Box<dyn FnOnce() + Send + 'static>;

/// A hook that receives the id of the task it is called for.
pub(crate) type Listener = Box<dyn Fn(usize) + Send + Sync>;

pub(crate) struct TaskListeners {
    pub(crate) before_execute: Listener,
    pub(crate) after_execute: Listener,
}

impl Default for TaskListeners {
    fn default() -> Self {
        Self {
            before_execute: Box::new(|_| {}),
            after_execute: Box::new(|_| {}),
        }
    }
}

/// A type-erased unit of work.
///
/// Closures with different captured state and return types are all
/// boxed behind the same `FnOnce()` so they can share one queue. A
/// task owns its closure and can only be moved, never copied.
///
/// A task created with [`Task::default`] has no body. The pool uses
/// empty tasks as stop markers for blocked workers; they are never
/// invoked.
#[derive(Default)]
pub struct Task {
    id: usize,
    body: Option<TaskFn>,
}

impl Task {
    /// Wraps `body` into a task with the given id.
    pub fn new<F>(id: usize, body: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            id,
            body: Some(Box::new(body)),
        }
    }

    /// Returns the id the task was created with.
    #[inline]
    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }

    /// Returns `true` if this task has no body.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.body.is_none()
    }

    /// Calls the wrapped closure. A task is consumed by its only
    /// invocation.
    ///
    /// # Panics
    ///
    /// Panics if the task is empty, or if the closure itself panics.
    pub fn invoke(self) {
        match self.body {
            Some(body) => body(),
            None => panic!("invoked an empty task (id {})", self.id),
        }
    }

    pub(crate) fn run(self, listeners: &TaskListeners) {
        let id = self.id;
        (listeners.before_execute)(id);
        self.invoke();
        (listeners.after_execute)(id);
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("empty", &self.is_empty())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{Task, TaskListeners};
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_invoke_moves_captured_state() {
        let out = Arc::new(Mutex::new(Vec::new()));
        let owned = String::from("owned");
        let task = {
            let out = out.clone();
            Task::new(3, move || out.lock().unwrap().push(owned))
        };

        assert_eq!(3, task.id());
        assert!(!task.is_empty());
        task.invoke();
        assert_eq!(vec!["owned".to_string()], *out.lock().unwrap());
    }

    #[test]
    fn test_default_task_is_empty() {
        let task = Task::default();
        assert!(task.is_empty());
        assert_eq!(0, task.id());
    }

    #[test]
    #[should_panic(expected = "empty task")]
    fn test_invoke_empty_task() {
        Task::default().invoke();
    }

    #[test]
    fn test_run_calls_listeners_in_order() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let listeners = {
            let before = events.clone();
            let after = events.clone();
            TaskListeners {
                before_execute: Box::new(move |id| before.lock().unwrap().push(("before", id))),
                after_execute: Box::new(move |id| after.lock().unwrap().push(("after", id))),
            }
        };

        let body_events = events.clone();
        Task::new(9, move || body_events.lock().unwrap().push(("body", 9))).run(&listeners);

        assert_eq!(
            vec![("before", 9), ("body", 9), ("after", 9)],
            *events.lock().unwrap()
        );
    }
}
