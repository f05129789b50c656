use ndarray::Array1;
use rand::{seq::IteratorRandom, Rng};
use serde::{Deserialize, Serialize};

use crate::{
    algo,
    config::SolverConfig,
    geometry::GeometryModel,
    store::{CandidateStore, StoreError},
    structs::{EntityId, Feedback},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub guess: EntityId,
    pub entropy: f64,
    /// `None` when the guess was the target.
    pub feedback: Option<Feedback>,
    pub remaining: usize,
    pub dead_end: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveReport {
    pub target: EntityId,
    pub solution: Option<EntityId>,
    pub turns: Vec<Turn>,
}

impl SolveReport {
    pub fn guesses(&self) -> usize {
        self.turns.len()
    }

    pub fn dead_ends(&self) -> usize {
        self.turns.iter().filter(|t| t.dead_end).count()
    }
}

/// Plays against a known `target`, always taking the top ranked guess and
/// reading exact feedback off the model. Dead ends are backtracked.
pub fn solve(
    model: &GeometryModel,
    config: &SolverConfig,
    target: EntityId,
) -> Result<SolveReport, StoreError> {
    if !model.contains(target) {
        return Err(StoreError::UnknownGuess(target.to_string()));
    }

    let mut store = CandidateStore::new(model, config.tolerance_miles);
    let mut turns = vec![];

    let solution = loop {
        if store.is_solved() {
            let solution = store.solution()?;
            turns.push(Turn {
                guess: solution,
                entropy: 0.,
                feedback: None,
                remaining: 1,
                dead_end: false,
            });
            break Some(solution);
        }

        let ranked = store.rank(config.lambda_km);
        let Some(best) = ranked.first().copied() else {
            log::warn!("No consistent candidate left for target {target}");
            break None;
        };

        if best.id == target {
            turns.push(Turn {
                guess: best.id,
                entropy: best.entropy,
                feedback: None,
                remaining: store.candidates().len(),
                dead_end: false,
            });
            break Some(target);
        }

        store.snapshot();
        let feedback = algo::observe(best.id, target, model);
        let any_left = store.apply(best.id, feedback)?;
        if !any_left {
            store.restore()?;
            store.mark_impossible(best.id)?;
        }

        turns.push(Turn {
            guess: best.id,
            entropy: best.entropy,
            feedback: Some(feedback),
            remaining: store.candidates().len(),
            dead_end: !any_left,
        });
    };

    log::info!(
        "Target {target}: solution {solution:?} after {} guesses",
        turns.len()
    );

    Ok(SolveReport {
        target,
        solution,
        turns,
    })
}

/// Solves `n` distinct targets drawn at random.
pub fn solve_random<R: Rng + ?Sized>(
    model: &GeometryModel,
    config: &SolverConfig,
    n: usize,
    rng: &mut R,
) -> Result<Vec<SolveReport>, StoreError> {
    (0..model.size())
        .choose_multiple(rng, n)
        .into_iter()
        .map(|target| solve(model, config, target))
        .collect()
}

pub fn mean_guesses(reports: &[SolveReport]) -> Option<f64> {
    Array1::from_iter(reports.iter().map(|r| r.guesses() as f64)).mean()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::Entity;
    use rand::{rngs::StdRng, SeedableRng};

    // a rough grid over europe and africa, far enough apart to tell apart
    fn entities() -> Vec<Entity> {
        let mut entities = vec![];
        for (i, lat) in [-30., -10., 10., 30., 50.].into_iter().enumerate() {
            for (j, lon) in [-10., 5., 20., 35.].into_iter().enumerate() {
                let id = i * 4 + j;
                entities.push(Entity::new(id, &format!("e{id}"), lat, lon));
            }
        }
        entities
    }

    fn config() -> SolverConfig {
        SolverConfig {
            neighbor_count: 3,
            tolerance_miles: 50.,
            ..SolverConfig::default()
        }
    }

    #[test]
    fn finds_every_target() {
        let entities = entities();
        let config = config();
        let model = GeometryModel::build(&entities, config.neighbor_count);

        for target in 0..entities.len() {
            let report = solve(&model, &config, target).unwrap();
            assert_eq!(Some(target), report.solution);
            let last = report.turns.last().unwrap();
            assert_eq!(target, last.guess);
            assert_eq!(None, last.feedback);
            // exact readings never contradict the true target
            assert_eq!(0, report.dead_ends());
            assert!(report.guesses() <= entities.len());
        }
    }

    #[test]
    fn never_repeats_a_guess() {
        let entities = entities();
        let config = config();
        let model = GeometryModel::build(&entities, config.neighbor_count);
        let report = solve(&model, &config, 7).unwrap();

        let mut guesses = report.turns.iter().map(|t| t.guess).collect::<Vec<_>>();
        guesses.sort_unstable();
        guesses.dedup();
        assert_eq!(report.guesses(), guesses.len());
    }

    #[test]
    fn unknown_target_is_rejected() {
        let entities = entities();
        let model = GeometryModel::build(&entities, 3);
        assert_eq!(
            Err(StoreError::UnknownGuess("20".to_string())),
            solve(&model, &config(), 20)
        );
    }

    #[test]
    fn random_targets_are_distinct() {
        let entities = entities();
        let config = config();
        let model = GeometryModel::build(&entities, config.neighbor_count);
        let mut rng = StdRng::seed_from_u64(7);

        let reports = solve_random(&model, &config, 5, &mut rng).unwrap();
        assert_eq!(5, reports.len());
        let mut targets = reports.iter().map(|r| r.target).collect::<Vec<_>>();
        targets.sort_unstable();
        targets.dedup();
        assert_eq!(5, targets.len());
        assert!(reports.iter().all(|r| r.solution == Some(r.target)));

        let mean = mean_guesses(&reports).unwrap();
        assert!(mean >= 1.);
        assert_eq!(None, mean_guesses(&[]));
    }

    #[test]
    fn solves_the_bundled_countries() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../data/country-coord.csv");
        let entities = crate::data::load_entities(path).unwrap();
        let config = SolverConfig::default();
        let model = GeometryModel::build(&entities, config.neighbor_count);
        let translator = crate::translator::Translator::generate(&entities);

        for name in ["France", "Japan", "Peru", "New Zealand"] {
            let target = translator.to_id(name).unwrap();
            let report = solve(&model, &config, target).unwrap();
            assert_eq!(Some(target), report.solution);
            assert_eq!(0, report.dead_ends());
        }
    }

    #[test]
    fn exact_readings_need_no_tolerance() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../data/country-coord.csv");
        let entities = crate::data::load_entities(path).unwrap();
        let config = SolverConfig {
            tolerance_miles: 0.,
            ..SolverConfig::default()
        };
        let model = GeometryModel::build(&entities, config.neighbor_count);

        for target in 0..entities.len() {
            let report = solve(&model, &config, target).unwrap();
            assert_eq!(Some(target), report.solution);
            assert_eq!(0, report.dead_ends(), "target {target}");
        }
    }
}
