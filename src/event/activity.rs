use super::{Event, Timestamp};
use crate::error::EventError;
use std::cmp::Ordering;
use std::sync::Arc;

/// Composite event spanning an ordered, non-empty set of component events.
///
/// Components are sorted and deduplicated at construction and never mutated
/// afterwards. The activity starts at its earliest component and ends at the
/// end of its latest component, recursively when that component is itself an
/// activity.
#[derive(Debug, Clone)]
pub struct Activity {
    components: Vec<Arc<Event>>,
}

impl Activity {
    /// Builds an activity from component events; errors on an empty input.
    pub fn new(mut components: Vec<Arc<Event>>) -> Result<Self, EventError> {
        if components.is_empty() {
            return Err(EventError::EmptyActivity);
        }
        components.sort_by(|a, b| a.total_cmp(b));
        components.dedup_by(|a, b| a.total_cmp(b) == Ordering::Equal);
        Ok(Self { components })
    }

    /// Components in total order.
    pub fn components(&self) -> &[Arc<Event>] {
        &self.components
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        // Construction rejects empty component sets.
        false
    }

    fn first(&self) -> &Arc<Event> {
        &self.components[0]
    }

    pub(crate) fn last(&self) -> &Arc<Event> {
        &self.components[self.components.len() - 1]
    }

    /// Timestamp of the earliest component.
    pub fn start(&self) -> Timestamp {
        self.first().start()
    }

    /// End of the latest component.
    pub fn end(&self) -> Timestamp {
        self.last().end()
    }
}

impl PartialEq for Activity {
    fn eq(&self, other: &Self) -> bool {
        self.components.len() == other.components.len()
            && self
                .components
                .iter()
                .zip(other.components.iter())
                .all(|(a, b)| a == b)
    }
}

impl Eq for Activity {}

impl std::hash::Hash for Activity {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        for component in &self.components {
            component.hash(state);
        }
    }
}
