use thiserror::Error;

/// Error raised when an event or activity violates a construction invariant.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventError {
    #[error("event id must not be empty")]
    EmptyId,
    #[error("source id must not be empty")]
    EmptySource,
    #[error("an activity requires at least one component event")]
    EmptyActivity,
    #[error("reply-to reference is already assigned")]
    ReplyToAlreadySet,
}

/// Error raised by the abstraction registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AbstractionError {
    #[error("a non-shareable abstraction with key '{key}' is already registered")]
    DuplicateNonShareable { key: String },
}

/// Error raised when a window or filter spec fails validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("window '{name}' must declare window_ms > 0")]
    ZeroWindow { name: String },
    #[error("window '{name}' must declare capacity > 0")]
    ZeroCapacity { name: String },
    #[error("window '{name}' declares latency_ms {latency_ms} >= window_ms {window_ms}")]
    LatencyExceedsWindow {
        name: String,
        latency_ms: i64,
        window_ms: i64,
    },
    #[error("filter '{name}' must name a key part")]
    EmptyKeyPart { name: String },
}
