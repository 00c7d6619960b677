//! Multi-slot event bindings and their condensed Cartesian representation.

use crate::event::Event;
use std::collections::{BTreeSet, HashSet};
use std::sync::{Arc, OnceLock};

/// One concrete binding across the slots of a multi-event match; a `None`
/// slot is a hole (no candidate bound).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Combination {
    slots: Vec<Option<Arc<Event>>>,
}

impl Combination {
    pub fn new(slots: Vec<Option<Arc<Event>>>) -> Self {
        Self { slots }
    }

    pub fn slots(&self) -> &[Option<Arc<Event>>] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Bound events, holes skipped.
    pub fn events(&self) -> impl Iterator<Item = &Arc<Event>> {
        self.slots.iter().flatten()
    }
}

/// Per-slot candidate sets for one alternative of a condensed part; ordered
/// by slot.
pub type CombinationRow = Vec<Vec<Arc<Event>>>;

/// A set of combinations, either explicit or condensed as Cartesian-product
/// rows expanded lazily.
///
/// Condensed expansion is the cross product across each row's ordered slot
/// sets — an empty slot set contributes a single hole, not zero
/// combinations — unioned across rows with set semantics. The expansion is
/// computed once and cached; the representation is immutable after
/// construction.
pub enum CombinationsPart {
    Explicit(HashSet<Combination>),
    Condensed {
        rows: Vec<CombinationRow>,
        cache: OnceLock<HashSet<Combination>>,
    },
}

impl CombinationsPart {
    pub fn explicit(combinations: HashSet<Combination>) -> Self {
        Self::Explicit(combinations)
    }

    pub fn condensed(rows: Vec<CombinationRow>) -> Self {
        Self::Condensed {
            rows,
            cache: OnceLock::new(),
        }
    }

    /// The full set of combinations, expanding and caching on first access.
    pub fn combinations(&self) -> &HashSet<Combination> {
        match self {
            Self::Explicit(combinations) => combinations,
            Self::Condensed { rows, cache } => cache.get_or_init(|| expand(rows)),
        }
    }

    pub fn count(&self) -> usize {
        self.combinations().len()
    }

    /// Union of all bound events across all combinations, in total order.
    pub fn events(&self) -> BTreeSet<Arc<Event>> {
        self.combinations()
            .iter()
            .flat_map(|combination| combination.events().cloned())
            .collect()
    }
}

fn expand(rows: &[CombinationRow]) -> HashSet<Combination> {
    let mut expanded = HashSet::new();
    for row in rows {
        let mut partials: Vec<Vec<Option<Arc<Event>>>> = vec![Vec::with_capacity(row.len())];
        for slot in row {
            let choices: Vec<Option<Arc<Event>>> = if slot.is_empty() {
                vec![None]
            } else {
                slot.iter().cloned().map(Some).collect()
            };
            let mut grown = Vec::with_capacity(partials.len() * choices.len());
            for partial in &partials {
                for choice in &choices {
                    let mut next = partial.clone();
                    next.push(choice.clone());
                    grown.push(next);
                }
            }
            partials = grown;
        }
        expanded.extend(partials.into_iter().map(Combination::new));
    }
    expanded
}
