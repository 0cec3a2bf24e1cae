//! Integration tests for the training driver and learning curves.

use approx::assert_relative_eq;
use factorec_core::{
    prelude::*,
    test_utils::{low_rank_ratings, sparsify},
};
use factorec_optim::{Trainer, TrainingCallback, IterationInfo};
use pretty_assertions::assert_eq;

fn sgd_config() -> MfConfig<f64> {
    MfConfig::new()
        .with_n_factors(2)
        .with_learning_rate(0.02)
        .with_seed(11)
}

fn split_low_rank(seed: u64) -> Split<f64> {
    let ratings = low_rank_ratings::<f64>(20, 15, 2, 3.0, 1.0, seed);
    Splitter::new(3).with_seed(seed).split(&ratings).unwrap()
}

#[test]
fn test_sgd_train_mse_decreases() {
    let split = split_low_rank(1);
    let trainer = Trainer::new(sgd_config()).unwrap();
    let mut session = trainer.session(split.train()).unwrap();

    let curve = trainer
        .learning_curve(&mut session, &[1, 5, 10, 25, 50], split.train(), split.test(), None)
        .unwrap();

    let train = curve.train_mse();
    assert_eq!(curve.checkpoints(), &[1, 5, 10, 25, 50]);
    assert!(train[1] < train[0]);
    assert!(train[2] < train[0]);
    assert!(train[4] < 0.5 * train[0], "train MSE {:?}", train);
    assert!(curve.test_mse().iter().all(|m| m.is_finite()));
}

#[test]
fn test_als_train_mse_is_non_increasing() {
    // Fully observed and unregularized: the masked MSE is the ALS objective.
    let ratings = low_rank_ratings::<f64>(12, 9, 2, 3.0, 0.5, 2);
    let trainer = Trainer::new(
        MfConfig::new()
            .with_strategy(LearningStrategy::Als)
            .with_n_factors(2)
            .with_seed(4),
    )
    .unwrap();
    let mut session = trainer.session(&ratings).unwrap();

    let checkpoints: Vec<usize> = (1..=10).collect();
    let curve = trainer
        .learning_curve(&mut session, &checkpoints, &ratings, &ratings, None)
        .unwrap();

    for pair in curve.train_mse().windows(2) {
        assert!(pair[1] <= pair[0] * (1.0 + 1e-9) + 1e-12, "{:?}", curve.train_mse());
    }
    assert!(!session.model().has_biases());
}

#[test]
fn test_same_seed_same_result() {
    let split = split_low_rank(3);
    let run = |seed: u64| {
        let trainer = Trainer::new(sgd_config().with_seed(seed)).unwrap();
        let mut session = trainer.session(split.train()).unwrap();
        let curve = trainer
            .learning_curve(&mut session, &[2, 4], split.train(), split.test(), None)
            .unwrap();
        (curve, session.into_model())
    };

    let (curve_a, model_a) = run(5);
    let (curve_b, model_b) = run(5);
    let (_, model_c) = run(6);

    assert_eq!(curve_a, curve_b);
    assert_eq!(model_a, model_b);
    assert_ne!(model_a, model_c);
}

#[test]
fn test_same_split_seed_same_split() {
    let ratings = low_rank_ratings::<f64>(10, 10, 2, 3.0, 0.5, 8);
    let a = Splitter::new(4).with_seed(9).split(&ratings).unwrap();
    let b = Splitter::new(4).with_seed(9).split(&ratings).unwrap();
    assert_eq!(a.test(), b.test());
    assert_eq!(a.train(), b.train());
}

#[test]
fn test_unsorted_checkpoints_are_rejected_before_training() {
    let split = split_low_rank(4);
    let trainer = Trainer::new(sgd_config()).unwrap();
    let mut session = trainer.session(split.train()).unwrap();
    let before = session.model().clone();

    let err = trainer
        .learning_curve(&mut session, &[5, 2, 10], split.train(), split.test(), None)
        .unwrap_err();

    assert!(err.is_invalid_argument());
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_eq!(session.model(), &before);
    assert_eq!(session.iterations(), 0);
}

#[test]
fn test_divergence_fails_without_partial_curve() {
    let split = split_low_rank(5);
    let trainer = Trainer::new(sgd_config().with_learning_rate(1e6)).unwrap();
    let mut session = trainer.session(split.train()).unwrap();

    let result = trainer.learning_curve(&mut session, &[1, 20, 40], split.train(), split.test(), None);
    let err = result.unwrap_err();
    assert!(err.is_numerical());
}

#[test]
fn test_callback_error_aborts_training() {
    struct StopAfter(usize);

    impl TrainingCallback<f64> for StopAfter {
        fn on_iteration_end(&mut self, info: &IterationInfo) -> factorec_core::Result<()> {
            if info.iteration >= self.0 {
                return Err(MfError::numerical_error("stopped by callback"));
            }
            Ok(())
        }
    }

    let split = split_low_rank(6);
    let trainer = Trainer::new(sgd_config()).unwrap();
    let mut session = trainer.session(split.train()).unwrap();
    let err = trainer
        .learning_curve_with_callback(
            &mut session,
            &[2, 5],
            split.train(),
            split.test(),
            None,
            &mut StopAfter(3),
        )
        .unwrap_err();

    assert!(err.to_string().contains("stopped by callback"));
    assert_eq!(session.iterations(), 3);
}

#[test]
fn test_sparse_training_and_prediction_range() {
    let dense = low_rank_ratings::<f64>(15, 30, 2, 3.0, 0.5, 7);
    let ratings = sparsify(&dense, 0.4, 12, 7);
    let split = Splitter::new(5).with_seed(2).split(&ratings).unwrap();
    let trainer = Trainer::new(sgd_config().with_regularization(0.01)).unwrap();
    let model = trainer.fit(split.train(), 30).unwrap();

    let predictions = model.predict_all();
    assert_eq!(predictions.shape(), (15, 30));
    let test_mse = mse(&predictions, split.test()).unwrap();
    assert!(test_mse.is_finite());
    assert_relative_eq!(
        model.predict(0, 0).unwrap(),
        predictions[(0, 0)],
        epsilon = 1e-12
    );
}

#[test]
fn test_sessions_train_on_separate_threads() {
    let split = split_low_rank(9);
    let trainer = Trainer::new(sgd_config()).unwrap();

    let models: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let trainer = &trainer;
                let train = split.train();
                scope.spawn(move || trainer.fit(train, 5).unwrap())
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(models[0], models[1]);
}
