//! Targeted queued dispatch: parallelism keyed by a work target.

use super::WorkerPool;
use crate::action::{ActionRegistry, AddEventAction, AddEventTrigger};
use crate::event::Event;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

struct TargetQueue {
    pending: VecDeque<Arc<Event>>,
    active: bool,
}

struct TargetedState {
    queues: HashMap<String, TargetQueue>,
    stopped: bool,
}

struct TargetedInner {
    name: String,
    pool: Arc<WorkerPool>,
    owns_pool: bool,
    state: Mutex<TargetedState>,
    add_actions: ActionRegistry<dyn AddEventAction>,
}

impl TargetedInner {
    /// Drains one target's queue in FIFO order; at most one drain task per
    /// target is in flight at a time.
    fn drain(self: &Arc<Self>, target: &str) {
        loop {
            let event = {
                let mut state = self.state.lock().expect("dispatch state lock poisoned");
                let Some(queue) = state.queues.get_mut(target) else {
                    return;
                };
                match queue.pending.pop_front() {
                    Some(event) => event,
                    None => {
                        state.queues.remove(target);
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

impl AddEventTrigger for TargetedInner {
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

/// Queued dispatch generalized by a per-work "target" key (a sub-collection,
/// a partition, a session). Work for distinct targets runs in parallel on
/// the pool; work for one target is delivered in arrival order by a single
/// in-flight drain task.
pub struct TargetedDispatch {
    inner: Arc<TargetedInner>,
}

impl TargetedDispatch {
    /// Wraps an injected pool; `stop` will not shut the pool down.
    pub fn new(name: impl Into<String>, pool: Arc<WorkerPool>) -> Self {
        Self {
            inner: Arc::new(TargetedInner {
                name: name.into(),
                pool,
                owns_pool: false,
                state: Mutex::new(TargetedState {
                    queues: HashMap::new(),
                    stopped: false,
                }),
                add_actions: ActionRegistry::new(),
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

    /// Enqueues an event under a target key; returns false after `stop`.
    pub fn execute(&self, target: impl Into<String>, event: Arc<Event>) -> bool {
        let target = target.into();
        let schedule = {
            let mut state = self.inner.state.lock().expect("dispatch state lock poisoned");
            if state.stopped {
                return false;
            }
            let queue = state.queues.entry(target.clone()).or_insert(TargetQueue {
                pending: VecDeque::new(),
                active: false,
            });
            queue.pending.push_back(event);
            if queue.active {
                false
            } else {
                queue.active = true;
                true
            }
        };
        if schedule {
            let drainer = Arc::clone(&self.inner);
            let key = target.clone();
            if !self.inner.pool.execute(move || drainer.drain(&key)) {
                let mut state = self.inner.state.lock().expect("dispatch state lock poisoned");
                if let Some(queue) = state.queues.get_mut(&target) {
                    queue.active = false;
                }
            }
        }
        true
    }

    /// One-shot stop; the owned pool (if any) is shut down.
    pub fn stop(&self) {
        {
            let mut state = self.inner.state.lock().expect("dispatch state lock poisoned");
            if state.stopped {
                return;
            }
            state.stopped = true;
        }
        if self.inner.owns_pool {
            self.inner.pool.stop();
        }
    }
}

impl AddEventTrigger for TargetedDispatch {
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
