//! Total-order comparison for events and activities.
//!
//! `order` signals strict precedence or concurrency: same-source events
//! compare by timestamp then sequence number, cross-source events by
//! timestamp only (equal timestamps are concurrent). Activities compare by
//! interval: strictly before/after when the intervals do not overlap.
//!
//! `total_cmp` is the strict total order collections sort by. It agrees with
//! `order` whenever `order` is non-equal and breaks concurrency
//! deterministically: timestamp, then sequence number, then id for atomic
//! events; end times, paired component timestamps, and component order for
//! activities.

use super::{Activity, AtomicEvent, Event};
use std::cmp::Ordering;
use tracing::warn;

impl Event {
    /// Strict-or-concurrent comparison: `Equal` means equal or concurrent.
    pub fn order(&self, other: &Event) -> Ordering {
        match (self, other) {
            (Event::Atomic(a), Event::Atomic(b)) => atomic_order(a, b),
            _ => interval_order(self, other),
        }
    }

    /// Strict total order; ties in `order` are broken deterministically.
    pub fn total_cmp(&self, other: &Event) -> Ordering {
        let ordered = self.order(other);
        if ordered != Ordering::Equal {
            return ordered;
        }
        match (self, other) {
            (Event::Atomic(a), Event::Atomic(b)) => atomic_tie_break(a, b),
            (Event::Activity(a), Event::Activity(b)) => activity_tie_break(a, b),
            // Concurrent atomic/activity pairs: end, start, then the atomic
            // side sorts first so the order stays total.
            (a, b) => a
                .end()
                .cmp(&b.end())
                .then_with(|| a.start().cmp(&b.start()))
                .then_with(|| variant_rank(a).cmp(&variant_rank(b))),
        }
    }

    pub fn is_before(&self, other: &Event) -> bool {
        self.order(other) == Ordering::Less
    }

    pub fn is_after(&self, other: &Event) -> bool {
        self.order(other) == Ordering::Greater
    }

    /// True when neither event strictly precedes the other and they are not
    /// equal.
    pub fn is_concurrent(&self, other: &Event) -> bool {
        self.order(other) == Ordering::Equal && self != other
    }
}

fn atomic_order(a: &AtomicEvent, b: &AtomicEvent) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }
    let (ha, hb) = (a.header(), b.header());
    if ha.source() == hb.source() {
        ha.timestamp()
            .cmp(&hb.timestamp())
            .then_with(|| ha.sequence().cmp(&hb.sequence()))
    } else {
        // Cross-source: equal timestamps stay concurrent even when sequence
        // numbers happen to be set.
        ha.timestamp().cmp(&hb.timestamp())
    }
}

fn atomic_tie_break(a: &AtomicEvent, b: &AtomicEvent) -> Ordering {
    let (ha, hb) = (a.header(), b.header());
    let broken = ha
        .timestamp()
        .cmp(&hb.timestamp())
        .then_with(|| ha.sequence().cmp(&hb.sequence()))
        .then_with(|| ha.id().cmp(hb.id()));
    if broken != Ordering::Equal && ha.id() == hb.id() {
        // Producers own id uniqueness; keep both events rather than lose one.
        warn!(
            id = %ha.id(),
            "events share an id but diverge in timestamp or sequence; retaining both"
        );
    }
    broken
}

fn interval_order(a: &Event, b: &Event) -> Ordering {
    if a.end() < b.start() {
        Ordering::Less
    } else if a.start() > b.end() {
        Ordering::Greater
    } else {
        Ordering::Equal
    }
}

fn activity_tie_break(a: &Activity, b: &Activity) -> Ordering {
    a.end()
        .cmp(&b.end())
        .then_with(|| paired_component_timestamps(a, b))
        .then_with(|| a.last().total_cmp(b.last()))
        .then_with(|| component_lists(a, b))
}

fn paired_component_timestamps(a: &Activity, b: &Activity) -> Ordering {
    for (ca, cb) in a.components().iter().zip(b.components().iter()) {
        let cmp = ca.start().cmp(&cb.start());
        if cmp != Ordering::Equal {
            return cmp;
        }
    }
    Ordering::Equal
}

fn component_lists(a: &Activity, b: &Activity) -> Ordering {
    for (ca, cb) in a.components().iter().zip(b.components().iter()) {
        let cmp = ca.total_cmp(cb);
        if cmp != Ordering::Equal {
            return cmp;
        }
    }
    a.len().cmp(&b.len())
}

fn variant_rank(event: &Event) -> u8 {
    match event {
        Event::Atomic(_) => 0,
        Event::Activity(_) => 1,
    }
}
