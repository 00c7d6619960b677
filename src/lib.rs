//! Complex-event-processing core: ordered deduplicated event collections,
//! eviction windows, duplicate suppression, threaded notification dispatch,
//! and combination expansion for multi-event matching.
//!
//! Producers call `add` on an [`EventSet`] or a window; the set
//! deduplicates, updates abstractions, and fans out add notifications
//! synchronously. Windows additionally evict on arrival or on clock ticks
//! and fan out remove and window-change notifications. Dispatch wrappers
//! move that fan-out onto pool threads.

pub mod action;
pub mod clock;
pub mod combination;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod filter;
pub mod set;
pub mod window;

pub use action::{
    AddEventAction, AddEventTrigger, DuplicateEventAction, DuplicateEventTrigger,
    OutOfOrderAction, RemoveEventAction, RemoveEventTrigger, TickAction, TickTrigger,
    WindowChangeAction, WindowChangeTrigger,
};
pub use clock::{Clock, ManualClock, Metronome, SystemClock};
pub use combination::{Combination, CombinationRow, CombinationsPart};
pub use config::{FilterSpec, WindowSpec};
pub use dispatch::{QueuedDispatch, SerializedDispatch, TargetedDispatch, WorkerPool};
pub use error::{AbstractionError, ConfigError, EventError};
pub use event::{
    Activity, AtomicEvent, Event, EventId, Header, PartValue, SourceId, Timestamp,
};
pub use filter::{DuplicateFilter, KeyFn};
pub use set::{Abstraction, EventSet, IncrementalAbstraction};
pub use window::{
    AtMostNWindow, BoundedDiscreteWindow, ClockTimeWindow, DiscreteTimeWindow,
    ProcessingTimeWindow, Window, WindowCore, WindowPhase,
};
