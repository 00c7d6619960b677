//! Clock-driven windows: eviction on tick, not on arrival.

use super::{Window, WindowChangeAction, WindowChangeTrigger, WindowCore};
use crate::action::{TickAction, TickTrigger};
use crate::clock::{Clock, Metronome};
use crate::event::{Event, Timestamp};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

/// Window whose membership is adjusted by periodic tick notifications.
///
/// A tick carrying `now` evicts every event whose
/// `timestamp + window < now - latency`. The latency allowance keeps
/// in-flight events from being evicted before they arrive. The
/// `with_filling_grace` variant arms a deadline at first use
/// (`now + window`) and performs no eviction until it passes, so a window
/// still warming up is not drained prematurely.
///
/// Ticks come from any [`TickTrigger`]; `attach_metronome` wires an owned
/// internal timer. `stop` releases the internal timer and is idempotent.
pub struct ClockTimeWindow {
    core: WindowCore,
    window_ms: i64,
    latency_ms: i64,
    track_filling: bool,
    filling_deadline: Mutex<Option<Timestamp>>,
    metronome: Mutex<Option<Metronome>>,
}

impl ClockTimeWindow {
    pub fn new(name: impl Into<String>, window_ms: i64, latency_ms: i64) -> Self {
        Self {
            core: WindowCore::new(name),
            window_ms,
            latency_ms,
            track_filling: false,
            filling_deadline: Mutex::new(None),
            metronome: Mutex::new(None),
        }
    }

    /// Variant that defers eviction until `first use + window` has passed.
    pub fn with_filling_grace(name: impl Into<String>, window_ms: i64, latency_ms: i64) -> Self {
        let mut window = Self::new(name, window_ms, latency_ms);
        window.track_filling = true;
        window
    }

    pub fn window_ms(&self) -> i64 {
        self.window_ms
    }

    pub fn latency_ms(&self) -> i64 {
        self.latency_ms
    }

    /// Starts an owned tick thread driving this window.
    ///
    /// The metronome holds only a weak reference back to the window, so an
    /// attached window still drops (and stops its tick thread) when the last
    /// external handle goes away.
    pub fn attach_metronome(self: &Arc<Self>, interval: Duration, clock: Arc<dyn Clock>) {
        let metronome = Metronome::start(self.core.name().to_string(), interval, clock);
        metronome.register_tick_action(Arc::new(MetronomeLink {
            window: Arc::downgrade(self),
        }));
        *self
            .metronome
            .lock()
            .expect("window metronome lock poisoned") = Some(metronome);
    }

    /// Stops and releases the owned tick thread, if any. External tick
    /// sources are the caller's to unregister.
    pub fn stop(&self) {
        let metronome = self
            .metronome
            .lock()
            .expect("window metronome lock poisoned")
            .take();
        if let Some(metronome) = metronome {
            metronome.stop();
        }
    }
}

/// Tick forwarder between an owned metronome and its window; weak so the
/// metronome never keeps the window alive.
struct MetronomeLink {
    window: Weak<ClockTimeWindow>,
}

impl TickAction for MetronomeLink {
    fn tick(&self, trigger: &dyn TickTrigger, now: Timestamp) {
        if let Some(window) = self.window.upgrade() {
            window.tick(trigger, now);
        }
    }
}

impl Window for ClockTimeWindow {
    fn core(&self) -> &WindowCore {
        &self.core
    }

    /// Arrival never evicts; membership is adjusted on ticks only.
    fn add(&self, event: Arc<Event>) -> bool {
        let admitted = self.core.set().add(event);
        if admitted {
            self.core.fire_change(self);
        }
        admitted
    }

    fn as_change_trigger(&self) -> &dyn WindowChangeTrigger {
        self
    }
}

impl TickAction for ClockTimeWindow {
    fn tick(&self, _trigger: &dyn TickTrigger, now: Timestamp) {
        if self.track_filling {
            let mut deadline = self
                .filling_deadline
                .lock()
                .expect("window deadline lock poisoned");
            match *deadline {
                None => {
                    *deadline = Some(now + self.window_ms);
                    return;
                }
                Some(armed) if now <= armed => return,
                Some(_) => {}
            }
        }
        let mut changed = false;
        while let Some(oldest) = self.core.set().first() {
            if oldest.start() + self.window_ms < now - self.latency_ms {
                self.core.evict(&oldest);
                changed = true;
            } else {
                break;
            }
        }
        if changed {
            self.core.fire_change(self);
        }
    }
}

impl WindowChangeTrigger for ClockTimeWindow {
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

impl Drop for ClockTimeWindow {
    fn drop(&mut self) {
        self.stop();
    }
}
