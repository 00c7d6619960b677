use crate::error::EventError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Milliseconds since the Unix epoch.
pub type Timestamp = i64;

/// Stable, producer-assigned event identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventId(String);

impl EventId {
    /// Creates an id; producers are responsible for uniqueness.
    pub fn new(id: impl Into<String>) -> Result<Self, EventError> {
        let id = id.into();
        if id.is_empty() {
            return Err(EventError::EmptyId);
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifies the producer that assigned the event's sequence numbers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourceId(String);

impl SourceId {
    pub fn new(source: impl Into<String>) -> Result<Self, EventError> {
        let source = source.into();
        if source.is_empty() {
            return Err(EventError::EmptySource);
        }
        Ok(Self(source))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Immutable event header: identity, time, and provenance.
///
/// The reply-to back-reference is the single post-construction mutation the
/// model allows; it is assignable exactly once.
#[derive(Debug)]
pub struct Header {
    id: EventId,
    timestamp: Timestamp,
    sequence: u64,
    source: SourceId,
    reply_to: OnceLock<EventId>,
}

impl Header {
    pub fn new(id: EventId, timestamp: Timestamp, sequence: u64, source: SourceId) -> Self {
        Self {
            id,
            timestamp,
            sequence,
            source,
            reply_to: OnceLock::new(),
        }
    }

    pub fn id(&self) -> &EventId {
        &self.id
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn source(&self) -> &SourceId {
        &self.source
    }

    /// Assigns the reply-to reference; fails if one is already set.
    pub fn set_reply_to(&self, target: EventId) -> Result<(), EventError> {
        self.reply_to
            .set(target)
            .map_err(|_| EventError::ReplyToAlreadySet)
    }

    pub fn reply_to(&self) -> Option<&EventId> {
        self.reply_to.get()
    }
}

impl Clone for Header {
    fn clone(&self) -> Self {
        let reply_to = OnceLock::new();
        if let Some(target) = self.reply_to.get() {
            let _ = reply_to.set(target.clone());
        }
        Self {
            id: self.id.clone(),
            timestamp: self.timestamp,
            sequence: self.sequence,
            source: self.source.clone(),
            reply_to,
        }
    }
}

impl PartialEq for Header {
    /// Two headers are equal iff id, timestamp, and sequence number all match.
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.timestamp == other.timestamp && self.sequence == other.sequence
    }
}

impl Eq for Header {}

impl std::hash::Hash for Header {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.timestamp.hash(state);
        self.sequence.hash(state);
    }
}
