use fxhash::FxHashSet;

use super::EntityId;

/// Everything learned so far in one solving session. A snapshot on the
/// backtracking stack is an owned copy of this value.
#[derive(Debug, Clone, PartialEq)]
pub struct Knowledge {
    pub candidates: FxHashSet<EntityId>,
    pub guessed: FxHashSet<EntityId>,
    pub best_distance_miles: f64,
}

impl Knowledge {
    pub fn none(size: usize) -> Self {
        Self {
            candidates: (0..size).collect(),
            guessed: FxHashSet::default(),
            best_distance_miles: f64::INFINITY,
        }
    }

    pub fn sorted_candidates(&self) -> Vec<EntityId> {
        let mut candidates = self.candidates.iter().copied().collect::<Vec<_>>();
        candidates.sort_unstable();
        candidates
    }
}
