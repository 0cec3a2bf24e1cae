//! Property tests for checkpoint handling.

use factorec_core::{config::MfConfig, test_utils::low_rank_ratings};
use factorec_optim::{validate_checkpoints, Trainer};
use proptest::prelude::*;

fn ascending() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(1usize..4, 1..6).prop_map(|steps| {
        steps
            .iter()
            .scan(0, |acc, step| {
                *acc += step;
                Some(*acc)
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn ascending_checkpoints_give_one_row_each(checkpoints in ascending()) {
        let ratings = low_rank_ratings::<f64>(6, 5, 2, 3.0, 0.5, 1);
        let trainer = Trainer::new(MfConfig::new().with_n_factors(2).with_learning_rate(0.01)).unwrap();
        let mut session = trainer.session(&ratings).unwrap();

        let curve = trainer
            .learning_curve(&mut session, &checkpoints, &ratings, &ratings, None)
            .unwrap();

        prop_assert_eq!(curve.checkpoints(), checkpoints.as_slice());
        prop_assert_eq!(curve.train_mse().len(), checkpoints.len());
        prop_assert_eq!(session.iterations(), *checkpoints.last().unwrap());
    }

    #[test]
    fn swapped_neighbours_are_rejected(mut checkpoints in ascending(), at in 0usize..5) {
        prop_assume!(checkpoints.len() >= 2);
        let at = at % (checkpoints.len() - 1);
        checkpoints.swap(at, at + 1);
        prop_assert!(validate_checkpoints(&checkpoints).is_err());
    }
}
