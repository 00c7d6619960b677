//! Derived computations over an event set, shared through a keyed registry.
//!
//! An abstraction is either *incremental* (it consumes every insertion and
//! keeps itself current) or *static* (the owning set flips it stale on every
//! membership change and it is rebuilt lazily on access). Sharing is keyed by
//! concrete type plus the instance's parameter key: a shareable duplicate
//! registration returns the already-registered instance.

use crate::error::AbstractionError;
use crate::event::Event;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

/// Derived computation over an event set.
pub trait Abstraction: Send + Sync + 'static {
    /// Stable identity within the concrete type: kind parameters, or empty
    /// for parameterless kinds.
    fn key(&self) -> String {
        String::new()
    }

    /// Whether an equal registration may be served by this instance.
    fn is_shareable(&self) -> bool {
        true
    }

    /// Whether the instance reflects the current set contents.
    fn is_current(&self) -> bool;

    fn set_current(&self, current: bool);

    /// Recomputes from an ordered snapshot of the set.
    fn rebuild(&self, events: &[Arc<Event>]);

    /// Incremental view of the instance, when it implements one.
    fn as_incremental(&self) -> Option<&dyn IncrementalAbstraction> {
        None
    }

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// Abstraction kept current by consuming every insertion.
pub trait IncrementalAbstraction: Abstraction {
    fn apply_add(&self, event: &Arc<Event>);
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct AbstractionKey {
    kind: TypeId,
    params: String,
}

struct Registered {
    abstraction: Arc<dyn Abstraction>,
    incremental: bool,
}

/// Registry owned by an `EventSet`; callers never touch it directly.
pub(crate) struct AbstractionRegistry {
    entries: HashMap<AbstractionKey, Registered>,
}

impl AbstractionRegistry {
    pub(crate) fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Feeds an insertion: incremental abstractions consume it, static ones
    /// go stale.
    pub(crate) fn note_insert(&mut self, event: &Arc<Event>) {
        for entry in self.entries.values() {
            if entry.incremental {
                if let Some(incremental) = entry.abstraction.as_incremental() {
                    incremental.apply_add(event);
                }
            } else {
                entry.abstraction.set_current(false);
            }
        }
    }

    /// Flags every static abstraction stale after a removal.
    pub(crate) fn note_remove(&mut self) {
        for entry in self.entries.values() {
            if !entry.incremental {
                entry.abstraction.set_current(false);
            }
        }
    }

    /// Returns the shared instance for `key`, rebuilding it when stale, or
    /// `None` when nothing is registered under the key.
    fn refresh(
        &mut self,
        key: &AbstractionKey,
        events: &[Arc<Event>],
    ) -> Option<Arc<dyn Abstraction>> {
        let entry = self.entries.get(key)?;
        if !entry.abstraction.is_current() {
            entry.abstraction.rebuild(events);
            entry.abstraction.set_current(true);
        }
        Some(Arc::clone(&entry.abstraction))
    }

    /// Default-constructs (or retrieves) the shareable singleton for `A`.
    pub(crate) fn get_or_create<A: Abstraction + Default>(
        &mut self,
        events: &[Arc<Event>],
    ) -> Arc<A> {
        let candidate = Arc::new(A::default());
        let key = AbstractionKey {
            kind: TypeId::of::<A>(),
            params: candidate.key(),
        };
        let shared = match self.refresh(&key, events) {
            Some(existing) => existing,
            None => {
                let shared: Arc<dyn Abstraction> = candidate;
                shared.rebuild(events);
                shared.set_current(true);
                let incremental = shared.as_incremental().is_some();
                self.entries.insert(
                    key,
                    Registered {
                        abstraction: Arc::clone(&shared),
                        incremental,
                    },
                );
                shared
            }
        };
        shared
            .into_any()
            .downcast::<A>()
            .expect("abstraction registered under a foreign type id")
    }

    /// Registers a caller-supplied, possibly parameterized instance.
    pub(crate) fn register(
        &mut self,
        abstraction: Arc<dyn Abstraction>,
        events: &[Arc<Event>],
    ) -> Result<Arc<dyn Abstraction>, AbstractionError> {
        let key = AbstractionKey {
            kind: abstraction.as_any().type_id(),
            params: abstraction.key(),
        };
        if let Some(existing) = self.entries.get(&key) {
            if existing.abstraction.is_shareable() {
                let shared = self
                    .refresh(&key, events)
                    .expect("entry present under the key");
                return Ok(shared);
            }
            return Err(AbstractionError::DuplicateNonShareable { key: key.params });
        }
        abstraction.rebuild(events);
        abstraction.set_current(true);
        let incremental = abstraction.as_incremental().is_some();
        self.entries.insert(
            key,
            Registered {
                abstraction: Arc::clone(&abstraction),
                incremental,
            },
        );
        Ok(abstraction)
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}
