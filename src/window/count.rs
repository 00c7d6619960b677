//! Count-bounded windows.

use super::{Window, WindowChangeAction, WindowChangeTrigger, WindowCore};
use crate::event::Event;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Window holding at most `capacity` events; admission evicts oldest-first.
///
/// The `last_n` variant additionally ignores explicit removal requests, so
/// membership changes only through the count policy.
pub struct AtMostNWindow {
    core: WindowCore,
    capacity: usize,
    pin_membership: bool,
    admit: Mutex<()>,
}

impl AtMostNWindow {
    pub fn new(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            core: WindowCore::new(name),
            capacity,
            pin_membership: false,
            admit: Mutex::new(()),
        }
    }

    /// "Last N" variant: upstream removals are ignored.
    pub fn last_n(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            pin_membership: true,
            ..Self::new(name, capacity)
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Window for AtMostNWindow {
    fn core(&self) -> &WindowCore {
        &self.core
    }

    fn add(&self, event: Arc<Event>) -> bool {
        let (admitted, evicted) = {
            let _admit = self.admit.lock().expect("window admit lock poisoned");
            // A resubmission must not trip the count policy: evicting to make
            // room for an event the window already holds would drop a live
            // member.
            if self.core.set().contains(&event) {
                debug!(window = %self.core.name(), "duplicate event absorbed");
                (false, false)
            } else {
                let mut evicted = false;
                // More than one eviction only happens if the set was already
                // over capacity.
                while self.core.set().len() >= self.capacity {
                    match self.core.set().first() {
                        Some(oldest) => {
                            self.core.evict(&oldest);
                            evicted = true;
                        }
                        None => break,
                    }
                }
                (self.core.set().add(event), evicted)
            }
        };
        if admitted || evicted {
            self.core.fire_change(self);
        }
        admitted
    }

    fn remove(&self, event: &Event) -> bool {
        if self.pin_membership {
            debug!(window = %self.core.name(), "removal request ignored by last-n window");
            return false;
        }
        let removed = self.core.set().remove(event);
        if removed {
            self.core.fire_change(self);
        }
        removed
    }

    fn as_change_trigger(&self) -> &dyn WindowChangeTrigger {
        self
    }
}

impl WindowChangeTrigger for AtMostNWindow {
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
