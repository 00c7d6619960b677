//! Queued dispatch: a sorted dedup buffer drained on a pool thread.

use super::WorkerPool;
use crate::action::{ActionRegistry, AddEventAction, AddEventTrigger};
use crate::event::Event;
use std::collections::BTreeSet;
use std::sync::{Arc, Condvar, Mutex};

const DEFAULT_CAPACITY: usize = 1024;

struct Buffer {
    events: BTreeSet<Arc<Event>>,
    draining: bool,
    stopped: bool,
}

struct QueuedInner {
    name: String,
    pool: Arc<WorkerPool>,
    owns_pool: bool,
    capacity: usize,
    buffer: Mutex<Buffer>,
    room: Condvar,
    add_actions: ActionRegistry<dyn AddEventAction>,
}

impl QueuedInner {
    /// Drains the buffer one event per lock acquisition, so producers are
    /// never starved; returns with the buffer empty.
    fn drain(self: &Arc<Self>) {
        loop {
            let event = {
                let mut buffer = self.buffer.lock().expect("dispatch buffer lock poisoned");
                match buffer.events.pop_first() {
                    Some(event) => {
                        self.room.notify_one();
                        event
                    }
                    None => {
                        buffer.draining = false;
                        return;
                    }
                }
            };
            for action in self.add_actions.snapshot() {
                action.event_added(&**self, &event);
            }
        }
    }
}

impl AddEventTrigger for QueuedInner {
    fn name(&self) -> &str {
        &self.name
    }

    fn register_add_action(&self, action: Arc<dyn AddEventAction>) {
        self.add_actions.register(action);
    }

    fn unregister_add_action(&self, action: &Arc<dyn AddEventAction>) {
        self.add_actions.unregister(action);
    }
}

/// Dispatch wrapper that buffers incoming events in a sorted, deduplicating
/// queue and fans them out to registered add-actions on a pool thread.
///
/// The first insertion into an empty, idle buffer schedules exactly one
/// drain task; the task runs until the buffer is empty. Delivery follows the
/// buffer's natural (total) order, nothing more. A full buffer blocks the
/// producer until space frees up or the wrapper stops.
pub struct QueuedDispatch {
    inner: Arc<QueuedInner>,
}

impl QueuedDispatch {
    /// Wraps an injected pool; `stop` will not shut the pool down.
    pub fn new(name: impl Into<String>, pool: Arc<WorkerPool>) -> Self {
        Self::with_capacity(name, pool, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(
        name: impl Into<String>,
        pool: Arc<WorkerPool>,
        capacity: usize,
    ) -> Self {
        Self {
            inner: Arc::new(QueuedInner {
                name: name.into(),
                pool,
                owns_pool: false,
                capacity: capacity.max(1),
                buffer: Mutex::new(Buffer {
                    events: BTreeSet::new(),
                    draining: false,
                    stopped: false,
                }),
                room: Condvar::new(),
                add_actions: ActionRegistry::new(),
            }),
        }
    }

    /// Creates a wrapper owning a private pool, shut down on `stop`.
    pub fn with_own_pool(name: impl Into<String>, threads: usize) -> Self {
        let name = name.into();
        let pool = WorkerPool::new(format!("{name}-pool"), threads);
        let mut wrapper = Self::new(name, pool);
        // Only an owned pool is ours to stop.
        Arc::get_mut(&mut wrapper.inner)
            .expect("inner is unshared at construction")
            .owns_pool = true;
        wrapper
    }

    /// Enqueues an event, waiting (interruptibly) while the buffer is full.
    /// Returns whether the event was newly enqueued; duplicates and post-stop
    /// submissions report false.
    pub fn execute(&self, event: Arc<Event>) -> bool {
        let schedule = {
            let mut buffer = self
                .inner
                .buffer
                .lock()
                .expect("dispatch buffer lock poisoned");
            if buffer.stopped {
                return false;
            }
            while buffer.events.len() >= self.inner.capacity && !buffer.stopped {
                buffer = self
                    .inner
                    .room
                    .wait(buffer)
                    .expect("dispatch buffer lock poisoned");
            }
            if buffer.stopped {
                return false;
            }
            if !buffer.events.insert(event) {
                return false;
            }
            if buffer.draining {
                false
            } else {
                buffer.draining = true;
                true
            }
        };
        if schedule {
            let drainer = Arc::clone(&self.inner);
            if !self.inner.pool.execute(move || drainer.drain()) {
                // Pool already stopped underneath us; leave the buffer
                // quiescent instead of marking a drain that never runs.
                self.inner
                    .buffer
                    .lock()
                    .expect("dispatch buffer lock poisoned")
                    .draining = false;
            }
        }
        true
    }

    /// One-shot stop: later `execute` calls no-op, blocked producers wake,
    /// the owned pool (if any) is shut down.
    pub fn stop(&self) {
        {
            let mut buffer = self
                .inner
                .buffer
                .lock()
                .expect("dispatch buffer lock poisoned");
            if buffer.stopped {
                return;
            }
            buffer.stopped = true;
        }
        self.inner.room.notify_all();
        if self.inner.owns_pool {
            self.inner.pool.stop();
        }
    }
}

impl AddEventTrigger for QueuedDispatch {
    fn name(&self) -> &str {
        &self.inner.name
    }

    fn register_add_action(&self, action: Arc<dyn AddEventAction>) {
        self.inner.register_add_action(action);
    }

    fn unregister_add_action(&self, action: &Arc<dyn AddEventAction>) {
        self.inner.unregister_add_action(action);
    }
}

impl AddEventAction for QueuedDispatch {
    /// Lets the wrapper sit directly behind a set or window as a listener.
    fn event_added(&self, _trigger: &dyn AddEventTrigger, event: &Arc<Event>) {
        self.execute(Arc::clone(event));
    }
}
