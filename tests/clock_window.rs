use cepflow::{
    AtomicEvent, ClockTimeWindow, Event, EventId, Header, ManualClock, SourceId, TickAction,
    TickTrigger, Window, WindowChangeAction, WindowChangeTrigger, WindowPhase,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn event(id: &str, ts: i64, seq: u64) -> Arc<Event> {
    Event::atomic(AtomicEvent::new(Header::new(
        EventId::new(id).expect("valid id"),
        ts,
        seq,
        SourceId::new("s1").expect("valid source"),
    )))
}

/// Stand-in tick source for driving the window by hand.
struct TestTicker;

impl TickTrigger for TestTicker {
    fn name(&self) -> &str {
        "test-ticker"
    }

    fn register_tick_action(&self, _action: Arc<dyn TickAction>) {}

    fn unregister_tick_action(&self, _action: &Arc<dyn TickAction>) {}
}

#[derive(Default)]
struct CountingChange {
    calls: AtomicUsize,
}

impl WindowChangeAction for CountingChange {
    fn window_changed(&self, _trigger: &dyn WindowChangeTrigger, _window: &[Arc<Event>]) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn arrival_never_evicts() {
    let window = ClockTimeWindow::new("w", 2_000, 0);
    window.add(event("e1", 0, 1));
    // Far beyond the window, but membership only moves on ticks.
    window.add(event("e2", 100_000, 2));
    assert_eq!(window.len(), 2);
    assert_eq!(window.phase(), WindowPhase::Filling);
}

#[test]
fn latency_allowance_delays_eviction() {
    let window = ClockTimeWindow::new("w", 2_000, 100);
    window.add(event("e1", 0, 1));

    // 0 + 2000 is not < 2001 - 100: the latency allowance keeps it.
    window.tick(&TestTicker, 2_001);
    assert_eq!(window.len(), 1);

    window.tick(&TestTicker, 2_101);
    assert!(window.is_empty());
    assert_eq!(window.phase(), WindowPhase::Sliding);
}

#[test]
fn tick_fires_one_change_for_a_batch_of_evictions() {
    let window = ClockTimeWindow::new("w", 1_000, 0);
    let changes = Arc::new(CountingChange::default());
    window.add(event("e1", 0, 1));
    window.add(event("e2", 100, 2));
    window.add(event("e3", 50_000, 3));
    window.register_change_action(changes.clone());

    window.tick(&TestTicker, 10_000);
    assert_eq!(window.len(), 1);
    assert_eq!(changes.calls.load(Ordering::SeqCst), 1);

    // Nothing left to evict: no change notification.
    window.tick(&TestTicker, 10_001);
    assert_eq!(changes.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn filling_grace_defers_eviction_until_the_deadline_passes() {
    let window = ClockTimeWindow::with_filling_grace("w", 2_000, 0);
    window.add(event("e1", 0, 1));

    // First tick arms the deadline at 10_000 + 2_000 and evicts nothing.
    window.tick(&TestTicker, 10_000);
    assert_eq!(window.len(), 1);

    // Still inside the grace period.
    window.tick(&TestTicker, 12_000);
    assert_eq!(window.len(), 1);

    window.tick(&TestTicker, 12_001);
    assert!(window.is_empty());
}

#[test]
fn dropping_an_attached_window_releases_it() {
    let clock = Arc::new(ManualClock::new(0));
    let window = Arc::new(ClockTimeWindow::new("w", 2_000, 0));
    window.attach_metronome(Duration::from_millis(5), clock);

    // The metronome must not keep the window alive: the last external
    // handle going away tears down the window and its tick thread.
    let weak = Arc::downgrade(&window);
    drop(window);
    assert!(weak.upgrade().is_none());
}

#[test]
fn metronome_drives_eviction_until_stopped() {
    let clock = Arc::new(ManualClock::new(100_000));
    let window = Arc::new(ClockTimeWindow::new("w", 2_000, 0));
    window.add(event("e1", 0, 1));

    window.attach_metronome(Duration::from_millis(5), clock);
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while !window.is_empty() {
        assert!(
            std::time::Instant::now() < deadline,
            "metronome never evicted the stale event"
        );
        std::thread::sleep(Duration::from_millis(5));
    }

    window.stop();
    // Idempotent.
    window.stop();
}
