use ndarray::Array1;
#[cfg(feature = "parallel")]
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use crate::{
    algo,
    geometry::GeometryModel,
    structs::{EntityId, FeedbackCode, RankedGuess},
};

/// Shannon entropy in bits. Zero probabilities are skipped.
pub fn entropy(arr: Array1<f64>) -> f64 {
    let arr = arr.into_iter().filter(|&x| x > 0.).collect::<Array1<f64>>();

    let arr_log = {
        let mut arr_log = arr.clone();
        arr_log.mapv_inplace(|x| x.log2());
        arr_log
    };

    // a certain outcome scores +0.0, not -0.0
    0. - (arr * arr_log).sum()
}

/// Probability of every feedback code, indexed by `FeedbackCode::to_ind`,
/// with the target drawn uniformly from `candidates`. The guess itself is
/// never a possible target.
pub fn feedback_distribution(
    guess: EntityId,
    candidates: &[EntityId],
    model: &GeometryModel,
    lambda_km: f64,
) -> Vec<f64> {
    let mut counts = vec![0.; FeedbackCode::COUNT];
    let mut total = 0usize;
    for &target in candidates.iter().filter(|&&t| t != guess) {
        counts[algo::encode(guess, target, model, lambda_km).to_ind()] += 1.;
        total += 1;
    }

    if total > 0 {
        let norm = total as f64;
        counts.iter_mut().for_each(|c| *c /= norm);
    }
    counts
}

pub fn guess_entropy(
    guess: EntityId,
    candidates: &[EntityId],
    model: &GeometryModel,
    lambda_km: f64,
) -> f64 {
    if candidates.len() <= 1 {
        return 0.;
    }
    let probs = Array1::from_vec(feedback_distribution(guess, candidates, model, lambda_km));
    entropy(probs)
}

/// Scores every guess in `guesses` against the live `candidates`, best first.
/// Equal scores keep ascending id order.
pub fn rank(
    guesses: &[EntityId],
    candidates: &[EntityId],
    model: &GeometryModel,
    lambda_km: f64,
) -> Vec<RankedGuess> {
    #[cfg(feature = "parallel")]
    let guesses_iter = guesses.par_iter();

    #[cfg(not(feature = "parallel"))]
    let guesses_iter = guesses.iter();

    let mut ranked = guesses_iter
        .map(|&guess| RankedGuess::new(guess, guess_entropy(guess, candidates, model, lambda_km)))
        .collect::<Vec<_>>();

    ranked.sort_by(|a, b| b.entropy.total_cmp(&a.entropy).then(a.id.cmp(&b.id)));
    log::debug!(
        "Ranked {} guesses over {} candidates",
        ranked.len(),
        candidates.len()
    );

    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::Entity;
    use fxhash::FxHashSet;
    use ndarray::{array, Array2};
    use rstest::rstest;

    const LAMBDA: f64 = 5000.;

    // points on a line `step_km` apart, nobody adjacent
    fn line_model(n: usize, step_km: f64) -> GeometryModel {
        let d = Array2::from_shape_fn((n, n), |(i, j)| (i as f64 - j as f64).abs() * step_km);
        GeometryModel::from_parts(d, vec![FxHashSet::default(); n]).unwrap()
    }

    #[rstest]
    #[case(array![0.5, 0.5], 1.)]
    #[case(array![0.25, 0.25, 0.25, 0.25], 2.)]
    #[case(array![1., 0., 0.], 0.)]
    #[case(array![0.5, 0., 0.25, 0.25], 1.5)]
    fn entropy_ok(#[case] probs: Array1<f64>, #[case] expected: f64) {
        assert!((entropy(probs) - expected).abs() < 1e-12);
    }

    #[test]
    fn certain_feedback_scores_positive_zero() {
        let model = line_model(3, 1.);
        let ranked = rank(&[1, 2], &[1, 2], &model, LAMBDA);
        for r in ranked {
            assert_eq!(0., r.entropy);
            assert!(r.entropy.is_sign_positive());
            assert_eq!("0.0000", format!("{:.4}", r.entropy));
        }
        assert!(entropy(array![1.]).is_sign_positive());
        assert!(entropy(Array1::zeros(0)).is_sign_positive());
    }

    #[test]
    fn guess_excludes_itself_from_targets() {
        // from 0, targets 1 and 2 sit at different closeness scores
        let model = line_model(3, 3000.);
        let dist = feedback_distribution(0, &[0, 1, 2], &model, LAMBDA);
        assert!((dist.iter().sum::<f64>() - 1.).abs() < 1e-12);
        assert_eq!(2, dist.iter().filter(|&&p| p > 0.).count());
        assert!((guess_entropy(0, &[0, 1, 2], &model, LAMBDA) - 1.).abs() < 1e-12);
    }

    #[test]
    fn indistinguishable_targets_carry_no_information() {
        // 1 and 2 are both adjacent to 0
        let d = array![[0., 10., 20.], [10., 0., 10.], [20., 10., 0.]];
        let neighbors = vec![
            FxHashSet::from_iter([1, 2]),
            FxHashSet::default(),
            FxHashSet::default(),
        ];
        let model = GeometryModel::from_parts(d, neighbors).unwrap();
        assert_eq!(0., guess_entropy(0, &[1, 2], &model, LAMBDA));
    }

    #[rstest]
    #[case(&[])]
    #[case(&[1])]
    #[case(&[4])]
    fn degenerate_candidate_sets_score_zero(#[case] candidates: &[EntityId]) {
        let model = line_model(5, 1000.);
        assert_eq!(0., guess_entropy(4, candidates, &model, LAMBDA));
    }

    #[test]
    fn entropy_is_bounded_by_candidate_count() {
        let entities = (0..30)
            .map(|i| {
                let i_f = i as f64;
                Entity::new(i, &format!("e{i}"), (i_f * 37.).sin() * 60., (i_f * 11.).cos() * 170.)
            })
            .collect::<Vec<_>>();
        let model = GeometryModel::build(&entities, 4);
        let candidates = (0..30).step_by(2).collect::<Vec<_>>();

        for guess in 0..30 {
            let h = guess_entropy(guess, &candidates, &model, LAMBDA);
            let m = candidates.iter().filter(|&&c| c != guess).count() as f64;
            assert!(h >= 0.);
            assert!(h <= m.log2() + 1e-9, "{guess}: {h} > log2({m})");
        }
    }

    #[test]
    fn distinct_codes_reach_the_bound() {
        // 600 km apart gives a different score for every target
        let model = line_model(5, 600.);
        let candidates = [1, 2, 3, 4];
        let h = guess_entropy(0, &candidates, &model, LAMBDA);
        assert!((h - 2.).abs() < 1e-12);
    }

    #[test]
    fn rank_orders_by_entropy_then_id() {
        let model = line_model(5, 600.);
        let candidates = [0, 1, 2, 3, 4];
        let ranked = rank(&[4, 3, 2, 1, 0], &candidates, &model, LAMBDA);

        assert_eq!(5, ranked.len());
        for pair in ranked.windows(2) {
            assert!(pair[0].entropy >= pair[1].entropy);
            if pair[0].entropy == pair[1].entropy {
                assert!(pair[0].id < pair[1].id);
            }
        }
        // the ends of the line see four distinct scores, 2 bits
        assert_eq!(0, ranked[0].id);
        assert_eq!(4, ranked[1].id);
        assert!((ranked[0].entropy - 2.).abs() < 1e-12);
    }

    #[test]
    fn rank_ties_fall_back_to_ascending_id() {
        let model = line_model(4, 1.);
        let ranked = rank(&[3, 1, 2, 0], &[0, 1, 2, 3], &model, LAMBDA);
        // 1 km steps all round to closeness 100
        assert!(ranked.iter().all(|r| r.entropy == 0.));
        assert_eq!(
            vec![0, 1, 2, 3],
            ranked.iter().map(|r| r.id).collect::<Vec<_>>()
        );
    }
}
