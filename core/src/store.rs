use fxhash::FxHashSet;
use itertools::Itertools;
use thiserror::Error;

use crate::{
    algo::km_to_miles,
    entropy,
    geometry::GeometryModel,
    structs::{EntityId, Feedback, Knowledge, RankedGuess},
};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Unknown guess: {0}")]
    UnknownGuess(String),
    #[error("Entity {0} was already guessed")]
    AlreadyGuessed(EntityId),
    #[error("Distance reading must be a finite, non-negative number of miles. Found {0}")]
    InvalidDistance(f64),
    #[error("No snapshot left to restore")]
    EmptyHistory,
    #[error("Not solved yet: {remaining} candidates remain")]
    NotSolved { remaining: usize },
}

/// The live candidate set of one solving session together with its
/// backtracking stack.
///
/// Every committed guess is meant to be preceded by [`CandidateStore::snapshot`]
/// so that a dead end can be undone with [`CandidateStore::restore`].
#[derive(Debug, Clone)]
pub struct CandidateStore<'a> {
    model: &'a GeometryModel,
    tolerance_miles: f64,
    knowledge: Knowledge,
    history: Vec<Knowledge>,
}

impl<'a> CandidateStore<'a> {
    pub fn new(model: &'a GeometryModel, tolerance_miles: f64) -> Self {
        Self {
            model,
            tolerance_miles,
            knowledge: Knowledge::none(model.size()),
            history: Vec::new(),
        }
    }

    pub fn model(&self) -> &'a GeometryModel {
        self.model
    }

    pub fn knowledge(&self) -> &Knowledge {
        &self.knowledge
    }

    pub fn candidates(&self) -> &FxHashSet<EntityId> {
        &self.knowledge.candidates
    }

    pub fn guessed(&self) -> &FxHashSet<EntityId> {
        &self.knowledge.guessed
    }

    pub fn best_distance_miles(&self) -> f64 {
        self.knowledge.best_distance_miles
    }

    pub fn history_depth(&self) -> usize {
        self.history.len()
    }

    pub fn sorted_candidates(&self) -> Vec<EntityId> {
        self.knowledge.sorted_candidates()
    }

    /// Candidates that can still be offered as a guess, ascending.
    pub fn unguessed_candidates(&self) -> Vec<EntityId> {
        self.knowledge
            .candidates
            .iter()
            .copied()
            .filter(|c| !self.knowledge.guessed.contains(c))
            .sorted()
            .collect()
    }

    /// Un-guessed candidates by the entropy of the feedback they would draw.
    pub fn rank(&self, lambda_km: f64) -> Vec<RankedGuess> {
        entropy::rank(
            &self.unguessed_candidates(),
            &self.sorted_candidates(),
            self.model,
            lambda_km,
        )
    }

    pub fn validate_guess(&self, guess: EntityId) -> Result<(), StoreError> {
        if !self.model.contains(guess) {
            return Err(StoreError::UnknownGuess(guess.to_string()));
        }
        if self.knowledge.guessed.contains(&guess) {
            return Err(StoreError::AlreadyGuessed(guess));
        }
        Ok(())
    }

    pub fn snapshot(&mut self) {
        self.history.push(self.knowledge.clone());
        log::debug!("Snapshot taken, depth {}", self.history.len());
    }

    pub fn restore(&mut self) -> Result<(), StoreError> {
        self.knowledge = self.history.pop().ok_or(StoreError::EmptyHistory)?;
        log::debug!(
            "Restored {} candidates, depth {}",
            self.knowledge.candidates.len(),
            self.history.len()
        );
        Ok(())
    }

    /// Narrows the candidates with the reading received for `guess`.
    /// Returns whether any candidate is left. `distance_miles` is ignored
    /// when `is_adjacent` holds.
    pub fn apply_feedback(
        &mut self,
        guess: EntityId,
        is_adjacent: bool,
        distance_miles: f64,
    ) -> Result<bool, StoreError> {
        self.apply(guess, Feedback::new(is_adjacent, distance_miles))
    }

    pub fn apply(&mut self, guess: EntityId, feedback: Feedback) -> Result<bool, StoreError> {
        self.validate_guess(guess)?;
        if let Feedback::Distance { miles } = feedback {
            if !miles.is_finite() || miles < 0. {
                return Err(StoreError::InvalidDistance(miles));
            }
        }

        let before = self.knowledge.candidates.len();
        let knowledge = &mut self.knowledge;
        knowledge.guessed.insert(guess);
        knowledge.candidates.remove(&guess);

        match feedback {
            Feedback::Adjacent => {
                // adjacency is exact, so it replaces whatever distance readings narrowed
                let guessed = &knowledge.guessed;
                knowledge.candidates = self
                    .model
                    .neighbors(guess)
                    .iter()
                    .copied()
                    .filter(|&c| c != guess && !guessed.contains(&c))
                    .collect();
            }
            Feedback::Distance { miles } if miles < knowledge.best_distance_miles => {
                knowledge.best_distance_miles = miles;
                let tolerance_miles = self.tolerance_miles;
                let model = self.model;
                // compared in miles, the unit the reading came in
                knowledge.candidates.retain(|&c| {
                    (km_to_miles(model.distance(guess, c)) - miles).abs() <= tolerance_miles
                });
            }
            Feedback::Distance { .. } => {
                // anything closer than the old best (less tolerance) would have beaten it
                let threshold_miles = knowledge.best_distance_miles - self.tolerance_miles;
                let model = self.model;
                knowledge
                    .candidates
                    .retain(|&c| km_to_miles(model.distance(guess, c)) >= threshold_miles);
            }
        }

        let remaining = self.knowledge.candidates.len();
        log::debug!("Guess {guess} ({feedback}): {before} -> {remaining} candidates");
        if remaining == 0 {
            log::warn!("Feedback for guess {guess} left no consistent candidate");
        }

        Ok(remaining > 0)
    }

    /// Rules `guess` out for good without replaying its feedback.
    pub fn mark_impossible(&mut self, guess: EntityId) -> Result<(), StoreError> {
        if !self.model.contains(guess) {
            return Err(StoreError::UnknownGuess(guess.to_string()));
        }
        self.knowledge.guessed.insert(guess);
        self.knowledge.candidates.remove(&guess);
        Ok(())
    }

    pub fn is_solved(&self) -> bool {
        self.knowledge.candidates.len() == 1
    }

    /// No candidate left and nothing to backtrack to.
    pub fn is_exhausted(&self) -> bool {
        self.knowledge.candidates.is_empty() && self.history.is_empty()
    }

    pub fn solution(&self) -> Result<EntityId, StoreError> {
        match self.knowledge.candidates.iter().exactly_one() {
            Ok(&id) => Ok(id),
            Err(_) => Err(StoreError::NotSolved {
                remaining: self.knowledge.candidates.len(),
            }),
        }
    }

    /// Current candidates other than `guess` whose true distance to it is
    /// nearest the reported reading, paired with the error in miles.
    pub fn closest_by_error(
        &self,
        guess: EntityId,
        distance_miles: f64,
        n: usize,
    ) -> Vec<(EntityId, f64)> {
        self.knowledge
            .candidates
            .iter()
            .filter(|&&c| c != guess)
            .map(|&c| {
                let error = (km_to_miles(self.model.distance(guess, c)) - distance_miles).abs();
                (c, error)
            })
            .sorted_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
            .take(n)
            .collect()
    }
}
