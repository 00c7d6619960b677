//! The core concurrent, deduplicating, ordered event collection.

pub mod abstraction;

pub use abstraction::{Abstraction, IncrementalAbstraction};

use crate::action::{
    ActionRegistry, AddEventAction, AddEventTrigger, RemoveEventAction, RemoveEventTrigger,
};
use crate::error::AbstractionError;
use crate::event::Event;
use abstraction::AbstractionRegistry;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, RwLock};
use tracing::debug;

/// Thread-safe, deduplicated event collection ordered by the total order,
/// with listener fan-out and an abstraction-sharing registry.
///
/// Locking discipline: the sorted collection sits behind a read/write lock;
/// listener lists and the abstraction registry have their own mutexes so an
/// action may register or unregister mid-fan-out. Add-listeners run while the
/// collection's write guard is held, so sequential adds from one producer are
/// observed downstream in order and concurrent adds never interleave their
/// fan-outs; an add-listener must therefore not re-enter the same set.
/// Remove-listeners run after the guard is released and may re-enter.
pub struct EventSet {
    name: String,
    events: RwLock<BTreeSet<Arc<Event>>>,
    abstractions: Mutex<AbstractionRegistry>,
    add_actions: ActionRegistry<dyn AddEventAction>,
    remove_actions: ActionRegistry<dyn RemoveEventAction>,
}

impl EventSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            events: RwLock::new(BTreeSet::new()),
            abstractions: Mutex::new(AbstractionRegistry::new()),
            add_actions: ActionRegistry::new(),
            remove_actions: ActionRegistry::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Inserts an event, returning whether it was newly added.
    ///
    /// Duplicates (equal per the event identity) are absorbed silently apart
    /// from a debug log. On insertion, static abstractions go stale,
    /// incremental ones consume the event, and every registered add-listener
    /// runs before the call returns.
    pub fn add(&self, event: Arc<Event>) -> bool {
        let mut events = self.events.write().expect("event collection lock poisoned");
        if events.contains(event.as_ref()) {
            debug!(set = %self.name, "duplicate event absorbed");
            return false;
        }
        events.insert(Arc::clone(&event));
        self.abstractions
            .lock()
            .expect("abstraction registry lock poisoned")
            .note_insert(&event);
        for action in self.add_actions.snapshot() {
            action.event_added(self, &event);
        }
        true
    }

    /// Removes an event if present; remove-listeners fire after the write
    /// guard is released.
    pub fn remove(&self, event: &Event) -> bool {
        let removed = {
            let mut events = self.events.write().expect("event collection lock poisoned");
            let removed = events.take(event);
            if removed.is_some() {
                self.abstractions
                    .lock()
                    .expect("abstraction registry lock poisoned")
                    .note_remove();
            }
            removed
        };
        match removed {
            Some(event) => {
                for action in self.remove_actions.snapshot() {
                    action.event_removed(self, &event);
                }
                true
            }
            None => false,
        }
    }

    /// Removes every event, firing remove-listeners per event under a single
    /// write-lock hold.
    pub fn clear(&self) {
        let mut events = self.events.write().expect("event collection lock poisoned");
        let drained = std::mem::take(&mut *events);
        if drained.is_empty() {
            return;
        }
        self.abstractions
            .lock()
            .expect("abstraction registry lock poisoned")
            .note_remove();
        let actions = self.remove_actions.snapshot();
        for event in &drained {
            for action in &actions {
                action.event_removed(self, event);
            }
        }
    }

    /// Hard reset for pooled reuse: clears events, abstractions, and
    /// listeners without locking or notifications. Requires exclusive access
    /// by construction and must not race concurrent use.
    pub fn reset(&mut self) {
        self.events
            .get_mut()
            .expect("event collection lock poisoned")
            .clear();
        self.abstractions
            .get_mut()
            .expect("abstraction registry lock poisoned")
            .clear();
        self.add_actions.clear();
        self.remove_actions.clear();
    }

    /// Ordered snapshot copy taken under the read lock.
    pub fn snapshot(&self) -> Vec<Arc<Event>> {
        self.events
            .read()
            .expect("event collection lock poisoned")
            .iter()
            .cloned()
            .collect()
    }

    /// Iterator over an ordered snapshot; the live set may move on.
    pub fn iter(&self) -> impl Iterator<Item = Arc<Event>> {
        self.snapshot().into_iter()
    }

    pub fn len(&self) -> usize {
        self.events
            .read()
            .expect("event collection lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, event: &Event) -> bool {
        self.events
            .read()
            .expect("event collection lock poisoned")
            .contains(event)
    }

    /// Earliest event in total order.
    pub fn first(&self) -> Option<Arc<Event>> {
        self.events
            .read()
            .expect("event collection lock poisoned")
            .first()
            .cloned()
    }

    /// Latest event in total order.
    pub fn last(&self) -> Option<Arc<Event>> {
        self.events
            .read()
            .expect("event collection lock poisoned")
            .last()
            .cloned()
    }

    /// Returns the up-to-date shareable singleton abstraction of type `A`,
    /// creating and building it on first use.
    pub fn get_or_create_abstraction<A: Abstraction + Default>(&self) -> Arc<A> {
        let events = self.events.read().expect("event collection lock poisoned");
        let snapshot: Vec<Arc<Event>> = events.iter().cloned().collect();
        self.abstractions
            .lock()
            .expect("abstraction registry lock poisoned")
            .get_or_create::<A>(&snapshot)
    }

    /// Registers a caller-supplied (possibly parameterized) abstraction.
    ///
    /// An equal shareable registration returns the existing instance and the
    /// argument is discarded; an equal non-shareable one is a
    /// [`AbstractionError::DuplicateNonShareable`] failure.
    pub fn register_abstraction(
        &self,
        abstraction: Arc<dyn Abstraction>,
    ) -> Result<Arc<dyn Abstraction>, AbstractionError> {
        let events = self.events.read().expect("event collection lock poisoned");
        let snapshot: Vec<Arc<Event>> = events.iter().cloned().collect();
        self.abstractions
            .lock()
            .expect("abstraction registry lock poisoned")
            .register(abstraction, &snapshot)
    }
}

impl AddEventTrigger for EventSet {
    fn name(&self) -> &str {
        &self.name
    }

    fn register_add_action(&self, action: Arc<dyn AddEventAction>) {
        if !self.add_actions.register(action) {
            debug!(set = %self.name, "add action already registered");
        }
    }

    fn unregister_add_action(&self, action: &Arc<dyn AddEventAction>) {
        self.add_actions.unregister(action);
    }
}

impl RemoveEventTrigger for EventSet {
    fn name(&self) -> &str {
        &self.name
    }

    fn register_remove_action(&self, action: Arc<dyn RemoveEventAction>) {
        self.remove_actions.register(action);
    }

    fn unregister_remove_action(&self, action: &Arc<dyn RemoveEventAction>) {
        self.remove_actions.unregister(action);
    }
}
