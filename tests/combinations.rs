use cepflow::{
    AtomicEvent, Combination, CombinationRow, CombinationsPart, Event, EventId, Header, SourceId,
};
use std::collections::HashSet;
use std::sync::Arc;

fn event(id: &str, ts: i64, seq: u64) -> Arc<Event> {
    Event::atomic(AtomicEvent::new(Header::new(
        EventId::new(id).expect("valid id"),
        ts,
        seq,
        SourceId::new("s1").expect("valid source"),
    )))
}

#[test]
fn single_slot_row_expands_to_one_combination_per_candidate() {
    let e1 = event("e1", 1_000, 1);
    let e2 = event("e2", 2_000, 2);
    let row: CombinationRow = vec![vec![Arc::clone(&e1), Arc::clone(&e2)]];
    let part = CombinationsPart::condensed(vec![row]);

    let expected: HashSet<Combination> = [
        Combination::new(vec![Some(Arc::clone(&e1))]),
        Combination::new(vec![Some(Arc::clone(&e2))]),
    ]
    .into_iter()
    .collect();
    assert_eq!(part.combinations(), &expected);
    assert_eq!(part.count(), 2);
}

#[test]
fn empty_slot_set_contributes_a_hole_not_nothing() {
    let e1 = event("e1", 1_000, 1);
    let row: CombinationRow = vec![vec![Arc::clone(&e1)], vec![]];
    let part = CombinationsPart::condensed(vec![row]);

    let expected: HashSet<Combination> =
        [Combination::new(vec![Some(Arc::clone(&e1)), None])]
            .into_iter()
            .collect();
    assert_eq!(part.combinations(), &expected);
}

#[test]
fn multi_slot_row_is_a_cartesian_product() {
    let e1 = event("e1", 1_000, 1);
    let e2 = event("e2", 2_000, 2);
    let e3 = event("e3", 3_000, 3);
    let row: CombinationRow = vec![
        vec![Arc::clone(&e1), Arc::clone(&e2)],
        vec![Arc::clone(&e3)],
    ];
    let part = CombinationsPart::condensed(vec![row]);

    assert_eq!(part.count(), 2);
    for combination in part.combinations() {
        assert_eq!(combination.len(), 2);
        assert_eq!(combination.slots()[1], Some(Arc::clone(&e3)));
    }
}

#[test]
fn overlapping_rows_union_with_set_semantics() {
    let e1 = event("e1", 1_000, 1);
    let e2 = event("e2", 2_000, 2);
    // Both rows produce [e1]; one also produces [e2].
    let first: CombinationRow = vec![vec![Arc::clone(&e1)]];
    let second: CombinationRow = vec![vec![Arc::clone(&e1), Arc::clone(&e2)]];
    let part = CombinationsPart::condensed(vec![first, second]);

    assert_eq!(part.count(), 2);
}

#[test]
fn expansion_is_cached_across_accesses() {
    let e1 = event("e1", 1_000, 1);
    let part = CombinationsPart::condensed(vec![vec![vec![Arc::clone(&e1)]]]);
    let first = part.combinations() as *const _;
    let second = part.combinations() as *const _;
    assert_eq!(first, second);
}

#[test]
fn events_union_is_in_total_order_with_holes_skipped() {
    let e1 = event("e1", 1_000, 1);
    let e2 = event("e2", 2_000, 2);
    let e3 = event("e3", 3_000, 3);
    let rows = vec![
        vec![vec![Arc::clone(&e3)], vec![]],
        vec![vec![Arc::clone(&e1), Arc::clone(&e2)], vec![Arc::clone(&e3)]],
    ];
    let part = CombinationsPart::condensed(rows);

    let ordered: Vec<i64> = part.events().iter().map(|e| e.start()).collect();
    assert_eq!(ordered, vec![1_000, 2_000, 3_000]);
}

#[test]
fn explicit_parts_report_their_combinations_verbatim() {
    let e1 = event("e1", 1_000, 1);
    let combinations: HashSet<Combination> =
        [Combination::new(vec![Some(Arc::clone(&e1)), None])]
            .into_iter()
            .collect();
    let part = CombinationsPart::explicit(combinations.clone());
    assert_eq!(part.combinations(), &combinations);
    assert_eq!(part.count(), 1);
}
