//! Time window with a hard count ceiling.

use super::{Window, WindowChangeAction, WindowChangeTrigger, WindowCore};
use crate::event::{Event, Timestamp};
use std::cmp::Ordering;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Arrival-driven time window that additionally never exceeds `capacity`.
///
/// Admission applies the time adjustment first; if the window is still at or
/// above the count limit it evicts oldest-first down to the limit. An arrival
/// older than the current earliest event is refused when the window is at
/// the limit.
pub struct BoundedDiscreteWindow {
    core: WindowCore,
    window_ms: i64,
    capacity: usize,
    latest: Mutex<Option<Timestamp>>,
}

impl BoundedDiscreteWindow {
    pub fn new(name: impl Into<String>, window_ms: i64, capacity: usize) -> Self {
        Self {
            core: WindowCore::new(name),
            window_ms,
            capacity,
            latest: Mutex::new(None),
        }
    }

    pub fn window_ms(&self) -> i64 {
        self.window_ms
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn admit(&self, event: &Arc<Event>) -> bool {
        let timestamp = event.start();
        let mut latest = self.latest.lock().expect("window latest lock poisoned");
        // A resubmission of a held event must not trigger evictions.
        if self.core.set().contains(event) {
            debug!(window = %self.core.name(), "duplicate event absorbed");
            return false;
        }
        match *latest {
            Some(max_seen) if timestamp < max_seen => {
                self.core.fire_out_of_order(self, event);
                if timestamp + self.window_ms < max_seen {
                    warn!(
                        window = %self.core.name(),
                        timestamp,
                        latest = max_seen,
                        "arrival predates the current window; dropped"
                    );
                    return false;
                }
            }
            _ => {
                *latest = Some(timestamp);
                while let Some(oldest) = self.core.set().first() {
                    if oldest.start() + self.window_ms < timestamp {
                        self.core.evict(&oldest);
                    } else {
                        break;
                    }
                }
            }
        }
        if self.core.set().len() >= self.capacity {
            if let Some(earliest) = self.core.set().first() {
                if event.total_cmp(&earliest) == Ordering::Less {
                    warn!(
                        window = %self.core.name(),
                        timestamp,
                        "arrival older than the window minimum at capacity; dropped"
                    );
                    return false;
                }
            }
            while self.core.set().len() >= self.capacity {
                match self.core.set().first() {
                    Some(oldest) => {
                        self.core.evict(&oldest);
                    }
                    None => break,
                }
            }
        }
        self.core.set().add(Arc::clone(event))
    }
}

impl Window for BoundedDiscreteWindow {
    fn core(&self) -> &WindowCore {
        &self.core
    }

    fn add(&self, event: Arc<Event>) -> bool {
        let admitted = self.admit(&event);
        self.core.fire_change(self);
        admitted
    }

    fn as_change_trigger(&self) -> &dyn WindowChangeTrigger {
        self
    }
}

impl WindowChangeTrigger for BoundedDiscreteWindow {
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
