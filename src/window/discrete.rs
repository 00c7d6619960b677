//! Arrival-driven sliding time window.

use super::{Window, WindowChangeAction, WindowChangeTrigger, WindowCore};
use crate::event::{Event, Timestamp};
use std::sync::{Arc, Mutex};
use tracing::warn;

/// Window bounded by event time and adjusted on every arrival.
///
/// An arrival with timestamp `T` evicts every earliest-held event whose
/// `timestamp + window < T`. Out-of-order arrivals are surfaced on the
/// out-of-order channel and still admitted unless they fall outside the
/// current window, in which case they are dropped with a warning. The
/// window-change notification fires once per `add` call.
pub struct DiscreteTimeWindow {
    core: WindowCore,
    window_ms: i64,
    latest: Mutex<Option<Timestamp>>,
}

impl DiscreteTimeWindow {
    pub fn new(name: impl Into<String>, window_ms: i64) -> Self {
        Self {
            core: WindowCore::new(name),
            window_ms,
            latest: Mutex::new(None),
        }
    }

    pub fn window_ms(&self) -> i64 {
        self.window_ms
    }
}

impl Window for DiscreteTimeWindow {
    fn core(&self) -> &WindowCore {
        &self.core
    }

    fn add(&self, event: Arc<Event>) -> bool {
        let timestamp = event.start();
        let admitted = {
            // The latest-timestamp mutex doubles as the add-serialization
            // lock: concurrent adds adjust the window one at a time.
            let mut latest = self.latest.lock().expect("window latest lock poisoned");
            match *latest {
                Some(max_seen) if timestamp < max_seen => {
                    self.core.fire_out_of_order(self, &event);
                    if timestamp + self.window_ms < max_seen {
                        warn!(
                            window = %self.core.name(),
                            timestamp,
                            latest = max_seen,
                            "arrival predates the current window; dropped"
                        );
                        false
                    } else {
                        self.core.set().add(event)
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
                    self.core.set().add(event)
                }
            }
        };
        self.core.fire_change(self);
        admitted
    }

    fn as_change_trigger(&self) -> &dyn WindowChangeTrigger {
        self
    }
}

impl WindowChangeTrigger for DiscreteTimeWindow {
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
