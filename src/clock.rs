//! Time sources and the internal tick thread.

use crate::action::{ActionRegistry, TickAction, TickTrigger};
use crate::event::Timestamp;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Wall-clock source consulted by clock-driven windows.
pub trait Clock: Send + Sync {
    /// Current time in milliseconds since the Unix epoch.
    fn now_ms(&self) -> Timestamp;
}

/// System clock backed by `SystemTime`.
#[derive(Debug, Default, Clone)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> Timestamp {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as Timestamp)
            .unwrap_or(0)
    }
}

/// Hand-advanced clock for deterministic tests and replay.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: AtomicI64,
}

impl ManualClock {
    pub fn new(start_ms: Timestamp) -> Self {
        Self {
            now_ms: AtomicI64::new(start_ms),
        }
    }

    pub fn advance(&self, delta_ms: i64) {
        self.now_ms.fetch_add(delta_ms, Ordering::SeqCst);
    }

    pub fn set(&self, now_ms: Timestamp) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> Timestamp {
        self.now_ms.load(Ordering::SeqCst)
    }
}

struct MetronomeShared {
    name: String,
    clock: Arc<dyn Clock>,
    interval: Duration,
    actions: ActionRegistry<dyn TickAction>,
    stopped: Mutex<bool>,
    signal: Condvar,
}

impl MetronomeShared {
    fn run(self: &Arc<Self>) {
        let mut stopped = self.stopped.lock().expect("metronome gate lock poisoned");
        loop {
            let (guard, timeout) = self
                .signal
                .wait_timeout(stopped, self.interval)
                .expect("metronome gate lock poisoned");
            stopped = guard;
            if *stopped {
                return;
            }
            if timeout.timed_out() {
                drop(stopped);
                let now = self.clock.now_ms();
                for action in self.actions.snapshot() {
                    action.tick(&**self as &dyn TickTrigger, now);
                }
                stopped = self.stopped.lock().expect("metronome gate lock poisoned");
                if *stopped {
                    return;
                }
            }
        }
    }
}

impl TickTrigger for MetronomeShared {
    fn name(&self) -> &str {
        &self.name
    }

    fn register_tick_action(&self, action: Arc<dyn TickAction>) {
        self.actions.register(action);
    }

    fn unregister_tick_action(&self, action: &Arc<dyn TickAction>) {
        self.actions.unregister(action);
    }
}

/// Internal tick source: a background thread firing registered tick actions
/// at a fixed interval. Requires explicit `stop`; dropping the metronome also
/// stops and joins the thread.
pub struct Metronome {
    shared: Arc<MetronomeShared>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Metronome {
    pub fn start(name: impl Into<String>, interval: Duration, clock: Arc<dyn Clock>) -> Self {
        let shared = Arc::new(MetronomeShared {
            name: name.into(),
            clock,
            interval,
            actions: ActionRegistry::new(),
            stopped: Mutex::new(false),
            signal: Condvar::new(),
        });
        let runner = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name(format!("metronome-{}", shared.name))
            .spawn(move || runner.run())
            .expect("failed to spawn metronome thread");
        Self {
            shared,
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Stops the tick thread and joins it. Idempotent.
    pub fn stop(&self) {
        {
            let mut stopped = self
                .shared
                .stopped
                .lock()
                .expect("metronome gate lock poisoned");
            if *stopped {
                return;
            }
            *stopped = true;
        }
        self.shared.signal.notify_all();
        let handle = self
            .handle
            .lock()
            .expect("metronome handle lock poisoned")
            .take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }
    }
}

impl TickTrigger for Metronome {
    fn name(&self) -> &str {
        self.shared.name()
    }

    fn register_tick_action(&self, action: Arc<dyn TickAction>) {
        self.shared.register_tick_action(action);
    }

    fn unregister_tick_action(&self, action: &Arc<dyn TickAction>) {
        self.shared.unregister_tick_action(action);
    }
}

impl Drop for Metronome {
    fn drop(&mut self) {
        self.stop();
    }
}
