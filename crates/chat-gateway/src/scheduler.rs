//! Cancellable scheduled tasks
//!
//! Every timer the session manager runs (heartbeat, backoff, quota retry,
//! rate-limit drain, socket pumps) goes through one [`Scheduler`] so a
//! single `cancel_all` sweeps them on shutdown.

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::AbortHandle;

#[derive(Default)]
struct Inner {
    tasks: Mutex<Tasks>,
    next_id: AtomicU64,
}

#[derive(Default)]
struct Tasks {
    running: HashMap<u64, AbortHandle>,
    /// Spawned but not yet in `running`
    registering: HashSet<u64>,
    closed: bool,
}

/// Tracks spawned tasks so they can be cancelled individually or all at once
#[derive(Clone, Default)]
pub struct Scheduler {
    inner: Arc<Inner>,
}

/// Handle to one scheduled task
#[derive(Debug, Clone)]
pub struct TaskHandle {
    id: u64,
    abort: Option<AbortHandle>,
}

impl TaskHandle {
    /// Cancel the task; a no-op if it already ran or was cancelled
    pub fn cancel(&self) {
        if let Some(abort) = &self.abort {
            abort.abort();
        }
    }

    pub fn is_finished(&self) -> bool {
        self.abort.as_ref().map_or(true, AbortHandle::is_finished)
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

// Removes the registry entry whether the task completes or is aborted.
struct Deregister {
    id: u64,
    inner: Weak<Inner>,
}

impl Drop for Deregister {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            let mut tasks = inner.tasks.lock();
            if tasks.running.remove(&self.id).is_none() {
                tasks.registering.remove(&self.id);
            }
        }
    }
}

impl Scheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task` after `delay`
    ///
    /// After [`cancel_all`](Self::cancel_all) nothing new is spawned and the
    /// returned handle is inert.
    pub fn schedule<F>(&self, delay: Duration, task: F) -> TaskHandle
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.track(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            task.await;
        })
    }

    /// Run `task` now, tracked like a scheduled one
    pub fn spawn<F>(&self, task: F) -> TaskHandle
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.track(task)
    }

    fn track<F>(&self, task: F) -> TaskHandle
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);

        {
            let mut tasks = self.inner.tasks.lock();
            if tasks.closed {
                tracing::trace!(task_id = id, "Scheduler closed, task dropped");
                return TaskHandle { id, abort: None };
            }
            tasks.registering.insert(id);
        }

        // Not under the lock: a shutting-down runtime drops the future inside
        // `spawn`, and its guard takes the lock.
        let guard = Deregister {
            id,
            inner: Arc::downgrade(&self.inner),
        };
        let join = tokio::spawn(async move {
            let _guard = guard;
            task.await;
        });
        let abort = join.abort_handle();

        let mut tasks = self.inner.tasks.lock();
        if !tasks.registering.remove(&id) {
            // Already finished and deregistered.
            return TaskHandle {
                id,
                abort: Some(abort),
            };
        }
        if tasks.closed {
            abort.abort();
            return TaskHandle { id, abort: None };
        }
        tasks.running.insert(id, abort.clone());

        TaskHandle {
            id,
            abort: Some(abort),
        }
    }

    /// Cancel one task; idempotent
    pub fn cancel(&self, handle: &TaskHandle) {
        handle.cancel();
        self.inner.tasks.lock().running.remove(&handle.id);
    }

    /// Cancel every pending task and refuse new ones
    pub fn cancel_all(&self) {
        let running: Vec<AbortHandle> = {
            let mut tasks = self.inner.tasks.lock();
            tasks.closed = true;
            tasks.running.drain().map(|(_, abort)| abort).collect()
        };
        tracing::debug!(cancelled = running.len(), "Cancelled all scheduled tasks");
        for abort in running {
            abort.abort();
        }
    }

    /// Number of tasks spawned and not yet finished
    pub fn pending(&self) -> usize {
        self.inner.tasks.lock().running.len()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.tasks.lock().closed
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tasks = self.inner.tasks.lock();
        f.debug_struct("Scheduler")
            .field("pending", &tasks.running.len())
            .field("closed", &tasks.closed)
            .finish()
    }
}
