use cepflow::{Activity, AtomicEvent, Event, EventError, EventId, Header, SourceId};
use std::cmp::Ordering;
use std::sync::Arc;

fn event(source: &str, id: &str, ts: i64, seq: u64) -> Arc<Event> {
    Event::atomic(AtomicEvent::new(Header::new(
        EventId::new(id).expect("valid id"),
        ts,
        seq,
        SourceId::new(source).expect("valid source"),
    )))
}

fn activity(components: Vec<Arc<Event>>) -> Arc<Event> {
    Event::activity(Activity::new(components).expect("non-empty components"))
}

#[test]
fn rejects_empty_component_sets() {
    assert_eq!(Activity::new(Vec::new()).unwrap_err(), EventError::EmptyActivity);
}

#[test]
fn sorts_and_dedupes_components() {
    let late = event("s1", "e2", 2_000, 2);
    let early = event("s1", "e1", 1_000, 1);
    let duplicate = event("s1", "e1", 1_000, 1);
    let built = Activity::new(vec![late.clone(), early.clone(), duplicate]).expect("components");
    assert_eq!(built.len(), 2);
    assert_eq!(built.components()[0].as_ref(), early.as_ref());
    assert_eq!(built.components()[1].as_ref(), late.as_ref());
}

#[test]
fn start_and_end_span_the_components() {
    let composite = activity(vec![
        event("s1", "e1", 1_000, 1),
        event("s1", "e2", 3_000, 2),
    ]);
    assert_eq!(composite.start(), 1_000);
    assert_eq!(composite.end(), 3_000);
}

#[test]
fn nested_activities_resolve_end_recursively() {
    let inner = activity(vec![
        event("s1", "e1", 2_000, 1),
        event("s1", "e2", 5_000, 2),
    ]);
    let outer = Activity::new(vec![event("s2", "e3", 1_000, 1), inner]).expect("components");
    assert_eq!(outer.start(), 1_000);
    assert_eq!(outer.end(), 5_000);
}

#[test]
fn disjoint_intervals_order_strictly() {
    let early = activity(vec![
        event("s1", "e1", 1_000, 1),
        event("s1", "e2", 2_000, 2),
    ]);
    let late = activity(vec![
        event("s1", "e3", 3_000, 3),
        event("s1", "e4", 4_000, 4),
    ]);
    assert_eq!(early.order(&late), Ordering::Less);
    assert!(early.is_before(&late));
    assert!(late.is_after(&early));
}

#[test]
fn overlapping_intervals_are_concurrent_but_totally_ordered() {
    let a = activity(vec![
        event("s1", "e1", 1_000, 1),
        event("s1", "e2", 3_000, 2),
    ]);
    let b = activity(vec![
        event("s2", "e3", 2_000, 1),
        event("s2", "e4", 4_000, 2),
    ]);
    assert_eq!(a.order(&b), Ordering::Equal);
    assert!(a.is_concurrent(&b));
    // End times break the tie in the strict order.
    assert_eq!(a.total_cmp(&b), Ordering::Less);
    assert_eq!(b.total_cmp(&a), Ordering::Greater);
}

#[test]
fn atomic_and_activity_intervals_compare() {
    let composite = activity(vec![
        event("s1", "e1", 2_000, 1),
        event("s1", "e2", 4_000, 2),
    ]);
    let before = event("s2", "e3", 1_000, 1);
    let inside = event("s2", "e4", 3_000, 2);
    assert!(before.is_before(&composite));
    assert!(composite.is_after(&before));
    assert!(inside.is_concurrent(&composite));
    assert_ne!(inside.total_cmp(&composite), Ordering::Equal);
}

#[test]
fn activities_with_equal_components_are_equal() {
    let a = activity(vec![
        event("s1", "e1", 1_000, 1),
        event("s1", "e2", 2_000, 2),
    ]);
    let b = activity(vec![
        event("s1", "e2", 2_000, 2),
        event("s1", "e1", 1_000, 1),
    ]);
    assert_eq!(a.as_ref(), b.as_ref());
    assert_eq!(a.total_cmp(&b), Ordering::Equal);
}
