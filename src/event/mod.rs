//! Event model: atomic events, composite activities, and the total order
//! the rest of the engine sorts by.

pub mod activity;
pub mod header;
pub mod ordering;

pub use activity::Activity;
pub use header::{EventId, Header, SourceId, Timestamp};

use std::collections::BTreeMap;
use std::sync::Arc;

/// Opaque payload value for a named part.
pub type PartValue = serde_json::Value;

/// Atomic event: a header plus an ordered map of named payload parts.
#[derive(Debug, Clone)]
pub struct AtomicEvent {
    header: Header,
    parts: BTreeMap<String, PartValue>,
}

impl AtomicEvent {
    pub fn new(header: Header) -> Self {
        Self {
            header,
            parts: BTreeMap::new(),
        }
    }

    /// Adds or replaces a named part (builder style, pre-publication only).
    pub fn with_part(mut self, name: impl Into<String>, value: PartValue) -> Self {
        self.parts.insert(name.into(), value);
        self
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn part(&self, name: &str) -> Option<&PartValue> {
        self.parts.get(name)
    }

    pub fn parts(&self) -> &BTreeMap<String, PartValue> {
        &self.parts
    }
}

impl PartialEq for AtomicEvent {
    /// Identity-based: the payload does not participate in equality.
    fn eq(&self, other: &Self) -> bool {
        self.header == other.header
    }
}

impl Eq for AtomicEvent {}

/// An event is either atomic or a composite activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Atomic(AtomicEvent),
    Activity(Activity),
}

impl Event {
    /// Wraps an atomic event for sharing across sets and windows.
    pub fn atomic(event: AtomicEvent) -> Arc<Self> {
        Arc::new(Self::Atomic(event))
    }

    /// Wraps an activity for sharing across sets and windows.
    pub fn activity(activity: Activity) -> Arc<Self> {
        Arc::new(Self::Activity(activity))
    }

    /// Start of the event's time interval; for atomic events, the timestamp.
    pub fn start(&self) -> Timestamp {
        match self {
            Event::Atomic(event) => event.header().timestamp(),
            Event::Activity(activity) => activity.start(),
        }
    }

    /// End of the event's time interval; for atomic events, the timestamp.
    pub fn end(&self) -> Timestamp {
        match self {
            Event::Atomic(event) => event.header().timestamp(),
            Event::Activity(activity) => activity.end(),
        }
    }

    /// The header, for atomic events.
    pub fn header(&self) -> Option<&Header> {
        match self {
            Event::Atomic(event) => Some(event.header()),
            Event::Activity(_) => None,
        }
    }

    /// Named payload part, for atomic events.
    pub fn part(&self, name: &str) -> Option<&PartValue> {
        match self {
            Event::Atomic(event) => event.part(name),
            Event::Activity(_) => None,
        }
    }

    pub fn as_activity(&self) -> Option<&Activity> {
        match self {
            Event::Activity(activity) => Some(activity),
            Event::Atomic(_) => None,
        }
    }
}

impl std::hash::Hash for Event {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        core::mem::discriminant(self).hash(state);
        match self {
            Event::Atomic(event) => event.header().hash(state),
            Event::Activity(activity) => activity.hash(state),
        }
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.total_cmp(other)
    }
}
