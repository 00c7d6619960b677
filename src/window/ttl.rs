//! Processing-time (TTL) window keyed to local receipt time.

use super::{Window, WindowChangeAction, WindowChangeTrigger, WindowCore};
use crate::event::Event;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

struct DelayEntry {
    deadline: Instant,
    event: Arc<Event>,
}

impl PartialEq for DelayEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for DelayEntry {}

impl PartialOrd for DelayEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DelayEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.deadline
            .cmp(&other.deadline)
            .then_with(|| self.event.total_cmp(&other.event))
    }
}

struct TtlShared {
    core: WindowCore,
    queue: Mutex<DelayQueue>,
    signal: Condvar,
}

struct DelayQueue {
    entries: BinaryHeap<Reverse<DelayEntry>>,
    stopped: bool,
}

impl TtlShared {
    fn run(self: &Arc<Self>) {
        let mut queue = self.queue.lock().expect("delay queue lock poisoned");
        loop {
            if queue.stopped {
                return;
            }
            let now = Instant::now();
            match queue.entries.peek() {
                None => {
                    queue = self
                        .signal
                        .wait(queue)
                        .expect("delay queue lock poisoned");
                }
                Some(Reverse(next)) if next.deadline <= now => {
                    let Reverse(expired) = queue
                        .entries
                        .pop()
                        .expect("peeked entry vanished from delay queue");
                    drop(queue);
                    if self.core.evict(&expired.event) {
                        self.core.fire_change(&**self);
                    }
                    queue = self.queue.lock().expect("delay queue lock poisoned");
                }
                Some(Reverse(next)) => {
                    let wait = next.deadline.duration_since(now);
                    let (guard, _timeout) = self
                        .signal
                        .wait_timeout(queue, wait)
                        .expect("delay queue lock poisoned");
                    queue = guard;
                }
            }
        }
    }
}

impl WindowChangeTrigger for TtlShared {
    fn name(&self) -> &str {
        self.core.name()
    }

    fn register_change_action(&self, action: Arc<dyn WindowChangeAction>) {
        self.core.register_change_action(action);
    }

    fn unregister_change_action(&self, action: &Arc<dyn WindowChangeAction>) {
        self.core.unregister_change_action(action);
    }
}

/// Window that evicts each event a fixed duration after local receipt,
/// regardless of the event's own timestamp.
///
/// Admitted events enter a delay queue drained by a background waiter
/// thread; expiry fires remove and window-change notifications. `stop` is
/// idempotent, joins the waiter, and is also invoked on drop, so the thread
/// cannot leak past the window's scope.
pub struct ProcessingTimeWindow {
    shared: Arc<TtlShared>,
    ttl: Duration,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl ProcessingTimeWindow {
    pub fn new(name: impl Into<String>, ttl: Duration) -> Self {
        let shared = Arc::new(TtlShared {
            core: WindowCore::new(name),
            queue: Mutex::new(DelayQueue {
                entries: BinaryHeap::new(),
                stopped: false,
            }),
            signal: Condvar::new(),
        });
        let runner = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name(format!("ttl-window-{}", shared.core.name()))
            .spawn(move || runner.run())
            .expect("failed to spawn ttl waiter thread");
        Self {
            shared,
            ttl,
            handle: Mutex::new(Some(handle)),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Stops the waiter thread and joins it. Idempotent; admitted events
    /// already in the delay queue are abandoned without notifications.
    pub fn stop(&self) {
        {
            let mut queue = self
                .shared
                .queue
                .lock()
                .expect("delay queue lock poisoned");
            if queue.stopped {
                return;
            }
            queue.stopped = true;
        }
        self.shared.signal.notify_all();
        let handle = self
            .handle
            .lock()
            .expect("ttl handle lock poisoned")
            .take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }
    }
}

impl Window for ProcessingTimeWindow {
    fn core(&self) -> &WindowCore {
        &self.shared.core
    }

    fn add(&self, event: Arc<Event>) -> bool {
        let admitted = self.shared.core.set().add(Arc::clone(&event));
        if admitted {
            let mut queue = self
                .shared
                .queue
                .lock()
                .expect("delay queue lock poisoned");
            if queue.stopped {
                // Late arrival after shutdown stays in the set; nothing will
                // expire it.
                drop(queue);
            } else {
                queue.entries.push(Reverse(DelayEntry {
                    deadline: Instant::now() + self.ttl,
                    event,
                }));
                drop(queue);
                self.shared.signal.notify_one();
            }
            self.shared.core.fire_change(self);
        }
        admitted
    }

    fn as_change_trigger(&self) -> &dyn WindowChangeTrigger {
        self
    }
}

impl WindowChangeTrigger for ProcessingTimeWindow {
    fn name(&self) -> &str {
        self.shared.core.name()
    }

    fn register_change_action(&self, action: Arc<dyn WindowChangeAction>) {
        self.shared.core.register_change_action(action);
    }

    fn unregister_change_action(&self, action: &Arc<dyn WindowChangeAction>) {
        self.shared.core.unregister_change_action(action);
    }
}

impl Drop for ProcessingTimeWindow {
    fn drop(&mut self) {
        self.stop();
    }
}
