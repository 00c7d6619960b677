//! Key-based duplicate suppression in front of a window.

use crate::action::{
    ActionRegistry, AddEventAction, DuplicateEventAction, DuplicateEventTrigger,
    RemoveEventAction, RemoveEventTrigger, WindowChangeAction,
};
use crate::event::Event;
use crate::window::{DiscreteTimeWindow, Window};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

/// Extracts the dedup key for an event; `None` bypasses the filter.
pub type KeyFn = dyn Fn(&Event) -> Option<String> + Send + Sync;

const DEFAULT_WINDOW: Duration = Duration::from_secs(60 * 60);

#[derive(Default)]
struct KeyTable {
    by_key: HashMap<String, Arc<Event>>,
    key_of: HashMap<Arc<Event>, String>,
}

impl KeyTable {
    fn record(&mut self, key: String, event: Arc<Event>) {
        self.by_key.insert(key.clone(), Arc::clone(&event));
        self.key_of.insert(event, key);
    }

    fn forget(&mut self, event: &Event) {
        if let Some(key) = self.key_of.remove(event) {
            let still_owner = self
                .by_key
                .get(&key)
                .map(|original| original.as_ref() == event)
                .unwrap_or(false);
            if still_owner {
                self.by_key.remove(&key);
            }
        }
    }
}

/// Remove-listener on the wrapped window that purges key entries when their
/// event is evicted, so re-submitted keys forward again.
struct KeyPurger {
    table: Arc<Mutex<KeyTable>>,
}

impl RemoveEventAction for KeyPurger {
    fn event_removed(&self, _trigger: &dyn RemoveEventTrigger, event: &Arc<Event>) {
        self.table
            .lock()
            .expect("duplicate key table lock poisoned")
            .forget(event);
    }
}

/// Guard placed in front of a window: the first event per live key forwards,
/// later events with the same key fire a duplicate notification carrying
/// (original, duplicate) and are dropped. Downstream registrations delegate
/// to the wrapped window, so consumers only ever see non-duplicates.
pub struct DuplicateFilter {
    name: String,
    inner: Arc<dyn Window>,
    key_fn: Box<KeyFn>,
    table: Arc<Mutex<KeyTable>>,
    duplicate_actions: ActionRegistry<dyn DuplicateEventAction>,
}

impl DuplicateFilter {
    pub fn new(
        name: impl Into<String>,
        inner: Arc<dyn Window>,
        key_fn: Box<KeyFn>,
    ) -> Arc<Self> {
        let table = Arc::new(Mutex::new(KeyTable::default()));
        inner.register_remove_action(Arc::new(KeyPurger {
            table: Arc::clone(&table),
        }));
        Arc::new(Self {
            name: name.into(),
            inner,
            key_fn,
            table,
            duplicate_actions: ActionRegistry::new(),
        })
    }

    /// Filter backed by the default one-hour arrival-driven window.
    pub fn with_default_window(name: impl Into<String>, key_fn: Box<KeyFn>) -> Arc<Self> {
        let name = name.into();
        let window: Arc<dyn Window> = Arc::new(DiscreteTimeWindow::new(
            name.clone(),
            DEFAULT_WINDOW.as_millis() as i64,
        ));
        Self::new(name, window, key_fn)
    }

    /// The wrapped window.
    pub fn window(&self) -> &Arc<dyn Window> {
        &self.inner
    }

    /// Offers an event; duplicates are notified and dropped, everything else
    /// forwards to the wrapped window.
    pub fn add(&self, event: Arc<Event>) -> bool {
        let key = match (self.key_fn)(&event) {
            Some(key) => key,
            None => return self.inner.add(event),
        };
        let original = {
            let mut table = self
                .table
                .lock()
                .expect("duplicate key table lock poisoned");
            match table.by_key.get(&key) {
                Some(original) => Some(Arc::clone(original)),
                None => {
                    table.record(key.clone(), Arc::clone(&event));
                    None
                }
            }
        };
        if let Some(original) = original {
            debug!(filter = %self.name, key = %key, "duplicate key suppressed");
            for action in self.duplicate_actions.snapshot() {
                action.duplicate_detected(self, &original, &event);
            }
            return false;
        }
        let admitted = self.inner.add(Arc::clone(&event));
        if !admitted {
            // The window refused the event; release the key so a later
            // arrival is not suppressed against a phantom original.
            self.table
                .lock()
                .expect("duplicate key table lock poisoned")
                .forget(&event);
        }
        admitted
    }

    pub fn register_add_action(&self, action: Arc<dyn AddEventAction>) {
        self.inner.register_add_action(action);
    }

    pub fn unregister_add_action(&self, action: &Arc<dyn AddEventAction>) {
        self.inner.unregister_add_action(action);
    }

    pub fn register_remove_action(&self, action: Arc<dyn RemoveEventAction>) {
        self.inner.register_remove_action(action);
    }

    pub fn unregister_remove_action(&self, action: &Arc<dyn RemoveEventAction>) {
        self.inner.unregister_remove_action(action);
    }

    pub fn register_change_action(&self, action: Arc<dyn WindowChangeAction>) {
        self.inner.register_change_action(action);
    }

    pub fn unregister_change_action(&self, action: &Arc<dyn WindowChangeAction>) {
        self.inner.unregister_change_action(action);
    }
}

impl DuplicateEventTrigger for DuplicateFilter {
    fn name(&self) -> &str {
        &self.name
    }

    fn register_duplicate_action(&self, action: Arc<dyn DuplicateEventAction>) {
        self.duplicate_actions.register(action);
    }

    fn unregister_duplicate_action(&self, action: &Arc<dyn DuplicateEventAction>) {
        self.duplicate_actions.unregister(action);
    }
}
