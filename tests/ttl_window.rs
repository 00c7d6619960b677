use cepflow::{
    AtomicEvent, Event, EventId, Header, ProcessingTimeWindow, RemoveEventAction,
    RemoveEventTrigger, SourceId, Window, WindowChangeAction, WindowChangeTrigger,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

fn event(id: &str, ts: i64, seq: u64) -> Arc<Event> {
    Event::atomic(AtomicEvent::new(Header::new(
        EventId::new(id).expect("valid id"),
        ts,
        seq,
        SourceId::new("s1").expect("valid source"),
    )))
}

#[derive(Default)]
struct RecordingRemove {
    removed: Mutex<Vec<Arc<Event>>>,
}

impl RemoveEventAction for RecordingRemove {
    fn event_removed(&self, _trigger: &dyn RemoveEventTrigger, event: &Arc<Event>) {
        self.removed
            .lock()
            .expect("recorder lock")
            .push(Arc::clone(event));
    }
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

fn wait_until(deadline: Duration, mut done: impl FnMut() -> bool) -> bool {
    let limit = Instant::now() + deadline;
    while Instant::now() < limit {
        if done() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    done()
}

#[test]
fn events_expire_after_their_ttl() {
    let window = ProcessingTimeWindow::new("w", Duration::from_millis(50));
    let removes = Arc::new(RecordingRemove::default());
    let changes = Arc::new(CountingChange::default());
    window.register_remove_action(removes.clone());
    window.register_change_action(changes.clone());

    let admitted = event("e1", 1_000, 1);
    assert!(window.add(Arc::clone(&admitted)));
    assert_eq!(window.len(), 1);

    assert!(
        wait_until(Duration::from_secs(5), || window.is_empty()),
        "event never expired"
    );
    let removed = removes.removed.lock().expect("recorder lock");
    assert_eq!(removed.len(), 1);
    assert_eq!(removed[0], admitted);
    drop(removed);
    // One change for the admission, one for the expiry.
    assert_eq!(changes.calls.load(Ordering::SeqCst), 2);
}

#[test]
fn expiry_is_independent_of_the_event_timestamp() {
    let window = ProcessingTimeWindow::new("w", Duration::from_millis(50));
    // An ancient event timestamp does not expire any sooner.
    window.add(event("old", 0, 1));
    window.add(event("new", i64::MAX - 1, 2));
    assert!(
        wait_until(Duration::from_secs(5), || window.is_empty()),
        "ttl expiry stalled"
    );
}

#[test]
fn stop_is_idempotent_and_freezes_membership() {
    let window = ProcessingTimeWindow::new("w", Duration::from_millis(20));
    window.stop();
    window.stop();

    // Admissions after shutdown are retained but never expire.
    assert!(window.add(event("e1", 1_000, 1)));
    std::thread::sleep(Duration::from_millis(100));
    assert_eq!(window.len(), 1);
}

#[test]
fn dropping_the_window_joins_the_waiter() {
    let window = ProcessingTimeWindow::new("w", Duration::from_secs(3_600));
    window.add(event("e1", 1_000, 1));
    // Drop must not block on the hour-long deadline.
    let started = Instant::now();
    drop(window);
    assert!(started.elapsed() < Duration::from_secs(5));
}
