//! Mutable state of a training run.
//!
//! A [`TrainingSession`] owns everything that changes while a model is
//! trained: the model itself, the update strategy (with its SGD sample
//! order), the seeded RNG and the number of rounds performed so far. It only
//! borrows the training ratings. Sessions are created by
//! [`Trainer::session`](crate::trainer::Trainer::session) and passed by
//! `&mut` into the trainer operations.

use crate::{
    callback::{IterationInfo, TrainingCallback},
    strategy::{SessionRng, Strategy, UpdateStrategy},
};
use factorec_core::{
    config::{LearningStrategy, MfConfig},
    error::{MfError, Result},
    model::FactorModel,
    ratings::RatingsMatrix,
    types::Scalar,
};
use rand::SeedableRng;
use std::time::Instant;

/// Training state bound to one ratings matrix.
#[derive(Debug, Clone)]
pub struct TrainingSession<'a, T: Scalar> {
    ratings: &'a RatingsMatrix<T>,
    strategy: Strategy<T>,
    model: FactorModel<T>,
    rng: SessionRng,
    n_factors: usize,
    global_mean: T,
    iterations: usize,
}

impl<'a, T: Scalar> TrainingSession<'a, T> {
    /// Builds the session and draws the initial model.
    ///
    /// `config` must already be validated.
    pub(crate) fn new(config: &MfConfig<T>, ratings: &'a RatingsMatrix<T>) -> Result<Self> {
        let (n_users, n_items) = ratings.shape();
        if n_users == 0 || n_items == 0 {
            return Err(MfError::numerical_error(format!(
                "cannot train on a {}x{} ratings matrix",
                n_users, n_items
            )));
        }
        let global_mean = ratings.observed_mean().ok_or_else(|| {
            MfError::numerical_error("training ratings have no observed entry")
        })?;

        let strategy = Strategy::from_config(config, ratings);
        let mut rng = SessionRng::seed_from_u64(config.seed);
        let model = draw_model(
            ratings,
            config.n_factors,
            strategy.uses_biases(),
            global_mean,
            &mut rng,
        )?;

        Ok(Self {
            ratings,
            strategy,
            model,
            rng,
            n_factors: config.n_factors,
            global_mean,
            iterations: 0,
        })
    }

    /// Current model.
    pub fn model(&self) -> &FactorModel<T> {
        &self.model
    }

    /// Consumes the session and returns the model.
    pub fn into_model(self) -> FactorModel<T> {
        self.model
    }

    /// Rounds performed since the model was last initialized.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Training ratings.
    pub fn ratings(&self) -> &'a RatingsMatrix<T> {
        self.ratings
    }

    /// Strategy chosen for this session.
    pub fn strategy(&self) -> LearningStrategy {
        self.strategy.kind()
    }

    /// Current SGD step size, `None` for ALS.
    pub fn learning_rate(&self) -> Option<T> {
        match &self.strategy {
            Strategy::Sgd(sgd) => Some(sgd.learning_rate()),
            Strategy::Als(_) => None,
        }
    }

    /// Mean of the observed training ratings, used as the global bias.
    pub fn global_mean(&self) -> T {
        self.global_mean
    }

    pub(crate) fn set_learning_rate(&mut self, learning_rate: T) -> Result<()> {
        self.strategy.set_learning_rate(learning_rate)
    }

    /// Draws fresh factors from the session RNG and resets the biases and
    /// the iteration count.
    pub(crate) fn reinitialize(&mut self) -> Result<()> {
        self.model = draw_model(
            self.ratings,
            self.n_factors,
            self.strategy.uses_biases(),
            self.global_mean,
            &mut self.rng,
        )?;
        self.iterations = 0;
        Ok(())
    }

    /// Runs `n_iterations` update rounds.
    ///
    /// # Errors
    ///
    /// Propagates strategy and callback errors, and fails with
    /// `NumericalError` as soon as a round leaves a non-finite value in the
    /// model.
    pub(crate) fn run(
        &mut self,
        n_iterations: usize,
        callback: &mut dyn TrainingCallback<T>,
    ) -> Result<()> {
        let kind = self.strategy.kind();
        callback.on_train_start(kind, n_iterations)?;

        for _ in 0..n_iterations {
            let start = Instant::now();
            self.strategy.step(&mut self.model, self.ratings, &mut self.rng)?;
            self.iterations += 1;

            if !self.model.is_finite() {
                return Err(MfError::numerical_error(format!(
                    "{} diverged at iteration {}",
                    self.strategy.name(),
                    self.iterations
                )));
            }

            callback.on_iteration_end(&IterationInfo {
                strategy: kind,
                iteration: self.iterations,
                elapsed: start.elapsed(),
            })?;
        }
        Ok(())
    }
}

fn draw_model<T: Scalar>(
    ratings: &RatingsMatrix<T>,
    n_factors: usize,
    with_biases: bool,
    global_mean: T,
    rng: &mut SessionRng,
) -> Result<FactorModel<T>> {
    let (n_users, n_items) = ratings.shape();
    let model = FactorModel::initialize_with_rng(n_users, n_items, n_factors, rng)?;
    Ok(if with_biases {
        model.with_biases(global_mean)
    } else {
        model
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::{NoOpCallback, RecordingCallback};
    use factorec_core::{test_utils::low_rank_ratings, types::DMatrix};

    #[test]
    fn test_initial_model_shape_and_biases() {
        let ratings = low_rank_ratings::<f64>(7, 5, 2, 3.0, 0.5, 1);
        let config = MfConfig::new().with_n_factors(3);
        let session = TrainingSession::new(&config, &ratings).unwrap();

        let model = session.model();
        assert_eq!((model.n_users(), model.n_items(), model.n_factors()), (7, 5, 3));
        let biases = model.biases().unwrap();
        assert_eq!(biases.global, ratings.observed_mean().unwrap());
        assert!(biases.user.iter().all(|b| *b == 0.0));
        assert_eq!(session.iterations(), 0);
        assert_eq!(session.learning_rate(), Some(0.1));
    }

    #[test]
    fn test_als_session_has_no_biases() {
        let ratings = low_rank_ratings::<f64>(4, 4, 2, 3.0, 0.5, 2);
        let config = MfConfig::new()
            .with_n_factors(2)
            .with_strategy(LearningStrategy::Als);
        let session = TrainingSession::new(&config, &ratings).unwrap();
        assert!(!session.model().has_biases());
        assert_eq!(session.learning_rate(), None);
    }

    #[test]
    fn test_degenerate_matrices_are_numerical_errors() {
        let config = MfConfig::<f64>::new();
        let empty = RatingsMatrix::zeros(3, 3);
        assert!(TrainingSession::new(&config, &empty).unwrap_err().is_numerical());

        let no_items = RatingsMatrix::new(DMatrix::<f64>::zeros(3, 0)).unwrap();
        assert!(TrainingSession::new(&config, &no_items).unwrap_err().is_numerical());
    }

    #[test]
    fn test_reinitialize_draws_fresh_factors() {
        let ratings = low_rank_ratings::<f64>(5, 5, 2, 3.0, 0.5, 3);
        let config = MfConfig::new().with_n_factors(2);
        let mut session = TrainingSession::new(&config, &ratings).unwrap();
        let first = session.model().clone();
        session.reinitialize().unwrap();
        assert_ne!(&first, session.model());
    }

    #[test]
    fn test_run_counts_iterations_and_reports() {
        let ratings = low_rank_ratings::<f64>(6, 4, 2, 3.0, 0.5, 4);
        let config = MfConfig::new().with_n_factors(2).with_learning_rate(0.01);
        let mut session = TrainingSession::new(&config, &ratings).unwrap();
        let mut recorder = RecordingCallback::default();

        session.run(3, &mut recorder).unwrap();
        session.run(2, &mut recorder).unwrap();

        assert_eq!(session.iterations(), 5);
        assert_eq!(recorder.iterations, vec![1, 2, 3, 4, 5]);
        assert_eq!(recorder.starts, vec![(LearningStrategy::Sgd, 3), (LearningStrategy::Sgd, 2)]);
    }

    #[test]
    fn test_divergence_is_reported() {
        let ratings = low_rank_ratings::<f64>(6, 6, 2, 3.0, 0.5, 5);
        let config = MfConfig::new().with_n_factors(4).with_learning_rate(1e6);
        let mut session = TrainingSession::new(&config, &ratings).unwrap();

        let err = session.run(50, &mut NoOpCallback).unwrap_err();
        assert!(err.is_numerical());
        assert!(err.to_string().contains("diverged"));
    }
}
