//! Trigger/action callback contracts.
//!
//! All producer-to-consumer notification flows through these pairs: a
//! consumer registers an action on a trigger, the trigger invokes it. Actions
//! are shared as `Arc`s; registration identity is the `Arc` allocation, so
//! unregistering requires the same handle that was registered.

use crate::event::{Event, Timestamp};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Producer of newly available events.
pub trait AddEventTrigger: Send + Sync {
    fn name(&self) -> &str;
    fn register_add_action(&self, action: Arc<dyn AddEventAction>);
    fn unregister_add_action(&self, action: &Arc<dyn AddEventAction>);
}

/// Consumer invoked once per newly available event.
pub trait AddEventAction: Send + Sync {
    fn event_added(&self, trigger: &dyn AddEventTrigger, event: &Arc<Event>);
}

/// Producer of eviction/removal notifications.
pub trait RemoveEventTrigger: Send + Sync {
    fn name(&self) -> &str;
    fn register_remove_action(&self, action: Arc<dyn RemoveEventAction>);
    fn unregister_remove_action(&self, action: &Arc<dyn RemoveEventAction>);
}

/// Consumer invoked once per evicted or explicitly removed event.
pub trait RemoveEventAction: Send + Sync {
    fn event_removed(&self, trigger: &dyn RemoveEventTrigger, event: &Arc<Event>);
}

/// Producer of window-membership change notifications.
pub trait WindowChangeTrigger: Send + Sync {
    fn name(&self) -> &str;
    fn register_change_action(&self, action: Arc<dyn WindowChangeAction>);
    fn unregister_change_action(&self, action: &Arc<dyn WindowChangeAction>);
}

/// Consumer invoked once after a batch of membership changes settles; the
/// slice is an ordered snapshot of the window at that point.
pub trait WindowChangeAction: Send + Sync {
    fn window_changed(&self, trigger: &dyn WindowChangeTrigger, window: &[Arc<Event>]);
}

/// Consumer invoked when a window observes an arrival older than its latest
/// timestamp. The arrival is still admitted when it fits the window.
pub trait OutOfOrderAction: Send + Sync {
    fn out_of_order(&self, trigger: &dyn WindowChangeTrigger, event: &Arc<Event>);
}

/// Producer of duplicate-suppression notifications.
pub trait DuplicateEventTrigger: Send + Sync {
    fn name(&self) -> &str;
    fn register_duplicate_action(&self, action: Arc<dyn DuplicateEventAction>);
    fn unregister_duplicate_action(&self, action: &Arc<dyn DuplicateEventAction>);
}

/// Consumer invoked with the retained original and the dropped duplicate.
pub trait DuplicateEventAction: Send + Sync {
    fn duplicate_detected(
        &self,
        trigger: &dyn DuplicateEventTrigger,
        original: &Arc<Event>,
        duplicate: &Arc<Event>,
    );
}

/// Clock source driving clock-based windows.
pub trait TickTrigger: Send + Sync {
    fn name(&self) -> &str;
    fn register_tick_action(&self, action: Arc<dyn TickAction>);
    fn unregister_tick_action(&self, action: &Arc<dyn TickAction>);
}

/// Consumer invoked once per tick with the tick's notion of "now".
pub trait TickAction: Send + Sync {
    fn tick(&self, trigger: &dyn TickTrigger, now: Timestamp);
}

/// Append-only-in-spirit action list with identity-based dedup.
///
/// `snapshot` hands fan-out loops a stable copy, so actions may register or
/// unregister mid-loop without invalidating the iteration.
pub(crate) struct ActionRegistry<A: ?Sized> {
    actions: Mutex<Vec<Arc<A>>>,
}

impl<A: ?Sized> ActionRegistry<A> {
    pub(crate) fn new() -> Self {
        Self {
            actions: Mutex::new(Vec::new()),
        }
    }

    /// Registers an action; a second registration of the same `Arc` is a
    /// logged no-op. Returns whether the action was newly added.
    pub(crate) fn register(&self, action: Arc<A>) -> bool {
        let mut actions = self.actions.lock().expect("action registry lock poisoned");
        if actions.iter().any(|known| Arc::ptr_eq(known, &action)) {
            debug!("action already registered; ignoring");
            return false;
        }
        actions.push(action);
        true
    }

    /// Unregisters an action; unknown actions are ignored (idempotent).
    pub(crate) fn unregister(&self, action: &Arc<A>) -> bool {
        let mut actions = self.actions.lock().expect("action registry lock poisoned");
        let before = actions.len();
        actions.retain(|known| !Arc::ptr_eq(known, action));
        actions.len() != before
    }

    pub(crate) fn snapshot(&self) -> Vec<Arc<A>> {
        self.actions
            .lock()
            .expect("action registry lock poisoned")
            .clone()
    }

    pub(crate) fn clear(&self) {
        self.actions
            .lock()
            .expect("action registry lock poisoned")
            .clear();
    }
}
