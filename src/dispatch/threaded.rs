//! Locking threaded pass-through: per-action serialized delivery.

use super::WorkerPool;
use crate::action::{AddEventAction, AddEventTrigger};
use crate::event::Event;
use std::sync::{Arc, Mutex};
use tracing::debug;

struct Lane {
    action: Arc<dyn AddEventAction>,
    gate: Arc<Mutex<()>>,
}

struct SerializedInner {
    name: String,
    pool: Arc<WorkerPool>,
    owns_pool: bool,
    stopped: Mutex<bool>,
    lanes: Mutex<Vec<Lane>>,
}

impl AddEventTrigger for SerializedInner {
    fn name(&self) -> &str {
        &self.name
    }

    fn register_add_action(&self, action: Arc<dyn AddEventAction>) {
        let mut lanes = self.lanes.lock().expect("dispatch lane lock poisoned");
        if lanes.iter().any(|lane| Arc::ptr_eq(&lane.action, &action)) {
            debug!(dispatch = %self.name, "action already registered");
            return;
        }
        lanes.push(Lane {
            action,
            gate: Arc::new(Mutex::new(())),
        });
    }

    fn unregister_add_action(&self, action: &Arc<dyn AddEventAction>) {
        self.lanes
            .lock()
            .expect("dispatch lane lock poisoned")
            .retain(|lane| !Arc::ptr_eq(&lane.action, action));
    }
}

/// Pass-through wrapper that gives every registered action its own
/// serialization lock and submits one pool task per (action, event).
///
/// Delivery to a single action is serial; different actions run
/// concurrently. A slow or blocked action holds a pool thread for the
/// duration and can starve others sharing the pool — a resource-contention
/// risk, not a correctness bug.
pub struct SerializedDispatch {
    inner: Arc<SerializedInner>,
}

impl SerializedDispatch {
    /// Wraps an injected pool; `stop` will not shut the pool down.
    pub fn new(name: impl Into<String>, pool: Arc<WorkerPool>) -> Self {
        Self {
            inner: Arc::new(SerializedInner {
                name: name.into(),
                pool,
                owns_pool: false,
                stopped: Mutex::new(false),
                lanes: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Creates a wrapper owning a private pool, shut down on `stop`.
    pub fn with_own_pool(name: impl Into<String>, threads: usize) -> Self {
        let name = name.into();
        let pool = WorkerPool::new(format!("{name}-pool"), threads);
        let mut wrapper = Self::new(name, pool);
        Arc::get_mut(&mut wrapper.inner)
            .expect("inner is unshared at construction")
            .owns_pool = true;
        wrapper
    }

    /// Submits the event to every registered action on the pool.
    pub fn execute(&self, event: Arc<Event>) {
        if *self.inner.stopped.lock().expect("dispatch stop lock poisoned") {
            return;
        }
        let lanes: Vec<(Arc<dyn AddEventAction>, Arc<Mutex<()>>)> = self
            .inner
            .lanes
            .lock()
            .expect("dispatch lane lock poisoned")
            .iter()
            .map(|lane| (Arc::clone(&lane.action), Arc::clone(&lane.gate)))
            .collect();
        for (action, gate) in lanes {
            let trigger = Arc::clone(&self.inner);
            let event = Arc::clone(&event);
            self.inner.pool.execute(move || {
                let _serial = gate.lock().expect("dispatch gate lock poisoned");
                action.event_added(&*trigger, &event);
            });
        }
    }

    /// One-shot stop; the owned pool (if any) is shut down.
    pub fn stop(&self) {
        {
            let mut stopped = self.inner.stopped.lock().expect("dispatch stop lock poisoned");
            if *stopped {
                return;
            }
            *stopped = true;
        }
        if self.inner.owns_pool {
            self.inner.pool.stop();
        }
    }
}

impl AddEventTrigger for SerializedDispatch {
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

impl AddEventAction for SerializedDispatch {
    fn event_added(&self, _trigger: &dyn AddEventTrigger, event: &Arc<Event>) {
        self.execute(Arc::clone(event));
    }
}
