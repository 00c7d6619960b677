use cepflow::{
    AddEventAction, AddEventTrigger, AtomicEvent, Event, EventId, EventSet, Header,
    RemoveEventAction, RemoveEventTrigger, SourceId,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn event(id: &str, ts: i64, seq: u64) -> Arc<Event> {
    Event::atomic(AtomicEvent::new(Header::new(
        EventId::new(id).expect("valid id"),
        ts,
        seq,
        SourceId::new("s1").expect("valid source"),
    )))
}

#[derive(Default)]
struct CountingAdd {
    calls: AtomicUsize,
}

impl AddEventAction for CountingAdd {
    fn event_added(&self, _trigger: &dyn AddEventTrigger, _event: &Arc<Event>) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
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

#[test]
fn duplicate_insertion_is_idempotent_and_notifies_once() {
    let set = EventSet::new("dedup");
    let counter = Arc::new(CountingAdd::default());
    set.register_add_action(counter.clone());

    assert!(set.add(event("e1", 1_000, 1)));
    assert!(!set.add(event("e1", 1_000, 1)));
    assert_eq!(set.len(), 1);
    assert_eq!(counter.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn iteration_yields_total_order() {
    let set = EventSet::new("ordered");
    set.add(event("e3", 3_000, 3));
    set.add(event("e1", 1_000, 1));
    set.add(event("e2", 2_000, 2));

    let ids: Vec<i64> = set.iter().map(|e| e.start()).collect();
    assert_eq!(ids, vec![1_000, 2_000, 3_000]);
    assert_eq!(set.first().expect("first").start(), 1_000);
    assert_eq!(set.last().expect("last").start(), 3_000);
}

#[test]
fn remove_notifies_after_releasing_the_write_lock() {
    // A remove-listener may re-enter the set; deadlock here would hang the
    // test.
    struct Reentrant {
        set: Arc<EventSet>,
        observed_len: AtomicUsize,
    }
    impl RemoveEventAction for Reentrant {
        fn event_removed(&self, _trigger: &dyn RemoveEventTrigger, _event: &Arc<Event>) {
            self.observed_len.store(self.set.len(), Ordering::SeqCst);
        }
    }

    let set = Arc::new(EventSet::new("reentrant"));
    let action = Arc::new(Reentrant {
        set: Arc::clone(&set),
        observed_len: AtomicUsize::new(usize::MAX),
    });
    set.register_remove_action(action.clone());

    let target = event("e1", 1_000, 1);
    set.add(Arc::clone(&target));
    assert!(set.remove(&target));
    assert_eq!(action.observed_len.load(Ordering::SeqCst), 0);
    assert!(!set.remove(&target));
}

#[test]
fn add_listeners_can_register_and_unregister_mid_fanout() {
    struct SelfUnregister {
        handle: Mutex<Option<Arc<dyn AddEventAction>>>,
        calls: AtomicUsize,
    }
    impl AddEventAction for SelfUnregister {
        fn event_added(&self, trigger: &dyn AddEventTrigger, _event: &Arc<Event>) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(handle) = self.handle.lock().expect("handle lock").take() {
                trigger.unregister_add_action(&handle);
            }
        }
    }

    let set = EventSet::new("mid-fanout");
    let action = Arc::new(SelfUnregister {
        handle: Mutex::new(None),
        calls: AtomicUsize::new(0),
    });
    let as_action: Arc<dyn AddEventAction> = action.clone();
    *action.handle.lock().expect("handle lock") = Some(as_action.clone());
    set.register_add_action(as_action);

    set.add(event("e1", 1_000, 1));
    set.add(event("e2", 2_000, 2));
    assert_eq!(action.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn registering_the_same_listener_twice_is_a_noop() {
    let set = EventSet::new("idempotent");
    let counter = Arc::new(CountingAdd::default());
    set.register_add_action(counter.clone());
    set.register_add_action(counter.clone());

    set.add(event("e1", 1_000, 1));
    assert_eq!(counter.calls.load(Ordering::SeqCst), 1);

    let as_action: Arc<dyn AddEventAction> = counter.clone();
    set.unregister_add_action(&as_action);
    set.unregister_add_action(&as_action);
    set.add(event("e2", 2_000, 2));
    assert_eq!(counter.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn clear_fires_one_remove_notification_per_event() {
    let set = EventSet::new("clear");
    let recorder = Arc::new(RecordingRemove::default());
    set.register_remove_action(recorder.clone());

    set.add(event("e1", 1_000, 1));
    set.add(event("e2", 2_000, 2));
    set.add(event("e3", 3_000, 3));
    set.clear();

    assert!(set.is_empty());
    assert_eq!(recorder.removed.lock().expect("recorder lock").len(), 3);
}

#[test]
fn reset_discards_everything_without_notifications() {
    let mut set = EventSet::new("reset");
    let recorder = Arc::new(RecordingRemove::default());
    set.register_remove_action(recorder.clone());
    set.add(event("e1", 1_000, 1));

    set.reset();
    assert!(set.is_empty());
    assert!(recorder.removed.lock().expect("recorder lock").is_empty());

    // Reset releases listeners too; this add fires nothing.
    set.add(event("e2", 2_000, 2));
    assert!(recorder.removed.lock().expect("recorder lock").is_empty());
    assert_eq!(set.len(), 1);
}

#[test]
fn concurrent_adds_are_serialized() {
    let set = Arc::new(EventSet::new("concurrent"));
    let mut handles = Vec::new();
    for worker in 0..4u64 {
        let set = Arc::clone(&set);
        handles.push(std::thread::spawn(move || {
            for index in 0..50u64 {
                let id = format!("w{worker}-e{index}");
                set.add(event(&id, (worker * 1_000 + index) as i64, index));
            }
        }));
    }
    for handle in handles {
        handle.join().expect("worker panicked");
    }
    assert_eq!(set.len(), 200);
}
