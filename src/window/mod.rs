//! Eviction windows over an [`EventSet`].
//!
//! A window is a deduplicating ordered collection plus an eviction policy.
//! Every window starts in the `Filling` phase and transitions to `Sliding`
//! on its first eviction. Membership changes are reported through the
//! window-change channel once per settled batch; out-of-order arrivals are
//! admitted but surfaced on their own channel.

pub mod bounded;
pub mod clock;
pub mod count;
pub mod discrete;
pub mod ttl;

pub use bounded::BoundedDiscreteWindow;
pub use clock::ClockTimeWindow;
pub use count::AtMostNWindow;
pub use discrete::DiscreteTimeWindow;
pub use ttl::ProcessingTimeWindow;

use crate::action::{
    ActionRegistry, AddEventAction, AddEventTrigger, OutOfOrderAction, RemoveEventAction,
    RemoveEventTrigger, WindowChangeAction, WindowChangeTrigger,
};
use crate::event::Event;
use crate::set::EventSet;
use std::sync::{Arc, Mutex};

/// Lifecycle phase of a window instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPhase {
    /// No eviction has occurred yet.
    Filling,
    /// Steady state: arrivals or ticks may evict.
    Sliding,
}

/// Common contract of the window family.
///
/// Add/remove listener registration delegates to the backing set, so
/// downstream consumers compose with windows exactly as with plain sets.
pub trait Window: WindowChangeTrigger {
    /// Shared plumbing; not intended for callers.
    #[doc(hidden)]
    fn core(&self) -> &WindowCore;

    /// Offers an event to the window, returning whether it was admitted.
    fn add(&self, event: Arc<Event>) -> bool;

    /// Explicit removal request from upstream; count-pinned windows may
    /// ignore it.
    fn remove(&self, event: &Event) -> bool {
        let removed = self.core().set().remove(event);
        if removed {
            self.core().fire_change(self.as_change_trigger());
        }
        removed
    }

    fn events(&self) -> Vec<Arc<Event>> {
        self.core().set().snapshot()
    }

    fn len(&self) -> usize {
        self.core().set().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn phase(&self) -> WindowPhase {
        self.core().phase()
    }

    /// The backing set, for listener registration and iteration.
    fn set(&self) -> &EventSet {
        self.core().set()
    }

    fn register_add_action(&self, action: Arc<dyn AddEventAction>) {
        self.core().set().register_add_action(action);
    }

    fn unregister_add_action(&self, action: &Arc<dyn AddEventAction>) {
        self.core().set().unregister_add_action(action);
    }

    fn register_remove_action(&self, action: Arc<dyn RemoveEventAction>) {
        self.core().set().register_remove_action(action);
    }

    fn unregister_remove_action(&self, action: &Arc<dyn RemoveEventAction>) {
        self.core().set().unregister_remove_action(action);
    }

    fn register_out_of_order_action(&self, action: Arc<dyn OutOfOrderAction>) {
        self.core().out_of_order_actions.register(action);
    }

    fn unregister_out_of_order_action(&self, action: &Arc<dyn OutOfOrderAction>) {
        self.core().out_of_order_actions.unregister(action);
    }

    /// Upcast used by default methods to fire notifications.
    #[doc(hidden)]
    fn as_change_trigger(&self) -> &dyn WindowChangeTrigger;
}

/// State shared by every window implementation: the backing set, the phase
/// flag, and the change/out-of-order action lists.
pub struct WindowCore {
    set: EventSet,
    phase: Mutex<WindowPhase>,
    change_actions: ActionRegistry<dyn WindowChangeAction>,
    out_of_order_actions: ActionRegistry<dyn OutOfOrderAction>,
}

impl WindowCore {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            set: EventSet::new(name),
            phase: Mutex::new(WindowPhase::Filling),
            change_actions: ActionRegistry::new(),
            out_of_order_actions: ActionRegistry::new(),
        }
    }

    pub(crate) fn set(&self) -> &EventSet {
        &self.set
    }

    pub(crate) fn name(&self) -> &str {
        self.set.name()
    }

    pub(crate) fn phase(&self) -> WindowPhase {
        *self.phase.lock().expect("window phase lock poisoned")
    }

    /// Removes an evicted event, transitioning to `Sliding` on success.
    pub(crate) fn evict(&self, event: &Event) -> bool {
        let removed = self.set.remove(event);
        if removed {
            *self.phase.lock().expect("window phase lock poisoned") = WindowPhase::Sliding;
        }
        removed
    }

    pub(crate) fn fire_change(&self, trigger: &dyn WindowChangeTrigger) {
        let snapshot = self.set.snapshot();
        for action in self.change_actions.snapshot() {
            action.window_changed(trigger, &snapshot);
        }
    }

    pub(crate) fn fire_out_of_order(&self, trigger: &dyn WindowChangeTrigger, event: &Arc<Event>) {
        for action in self.out_of_order_actions.snapshot() {
            action.out_of_order(trigger, event);
        }
    }

    pub(crate) fn register_change_action(&self, action: Arc<dyn WindowChangeAction>) {
        self.change_actions.register(action);
    }

    pub(crate) fn unregister_change_action(&self, action: &Arc<dyn WindowChangeAction>) {
        self.change_actions.unregister(action);
    }
}
