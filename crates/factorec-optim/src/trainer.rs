//! Training driver.
//!
//! The [`Trainer`] holds a validated [`MfConfig`] and nothing else. All
//! mutable state lives in a [`TrainingSession`], created from the trainer and
//! a training matrix, and passed by `&mut` into every operation. A trainer
//! can therefore be shared freely between threads, each thread driving its
//! own session.
//!
//! # Examples
//!
//! ```rust
//! use factorec_core::prelude::*;
//! use factorec_optim::Trainer;
//! # use nalgebra::DMatrix;
//!
//! # fn main() -> factorec_core::Result<()> {
//! let ratings = RatingsMatrix::new(DMatrix::from_row_slice(3, 3, &[
//!     5.0, 3.0, 0.0,
//!     4.0, 0.0, 1.0,
//!     0.0, 1.0, 5.0,
//! ]))?;
//!
//! let trainer = Trainer::new(MfConfig::new().with_n_factors(2).with_learning_rate(0.05))?;
//! let mut session = trainer.session(&ratings)?;
//! let curve = trainer.learning_curve(&mut session, &[1, 5, 10], &ratings, &ratings, None)?;
//!
//! assert_eq!(curve.checkpoints(), &[1, 5, 10]);
//! # Ok(())
//! # }
//! ```

use crate::{
    callback::{CheckpointInfo, NoOpCallback, TracingProgressCallback, TrainingCallback},
    curve::LearningCurve,
    session::TrainingSession,
};
use factorec_core::{
    config::{check_learning_rate, MfConfig},
    error::{MfError, Result},
    metrics::mse,
    model::FactorModel,
    ratings::RatingsMatrix,
    types::{format_shape, Scalar},
};

/// Trains factor models with a fixed configuration.
#[derive(Debug, Clone)]
pub struct Trainer<T: Scalar> {
    config: MfConfig<T>,
}

impl<T: Scalar> Trainer<T> {
    /// Creates a trainer.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the configuration does not validate.
    pub fn new(config: MfConfig<T>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Configuration of this trainer.
    pub fn config(&self) -> &MfConfig<T> {
        &self.config
    }

    /// Starts a session on `ratings` and draws the initial model.
    ///
    /// # Errors
    ///
    /// Returns `NumericalError` if `ratings` has no rows, no columns or no
    /// observed entry.
    pub fn session<'a>(&self, ratings: &'a RatingsMatrix<T>) -> Result<TrainingSession<'a, T>> {
        let session = TrainingSession::new(&self.config, ratings)?;
        tracing::debug!(
            strategy = %self.config.strategy,
            n_factors = self.config.n_factors,
            shape = %format_shape(ratings.shape()),
            observed = ratings.nnz(),
            "training session created"
        );
        Ok(session)
    }

    /// Trains a model from scratch and returns it.
    pub fn fit(&self, ratings: &RatingsMatrix<T>, n_iterations: usize) -> Result<FactorModel<T>> {
        let mut session = self.session(ratings)?;
        self.train(&mut session, n_iterations, None)?;
        Ok(session.into_model())
    }

    /// Reinitializes the model and runs `n_iterations` rounds.
    ///
    /// The model gets fresh factors drawn from the session RNG, zeroed user
    /// and item biases, and the mean training rating as global bias.
    /// `learning_rate` replaces the SGD step size for this and later calls on
    /// the session; `None` restores the configured rate. ALS has no step
    /// size, but the value is still validated.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a non-positive or non-finite learning
    /// rate and `NumericalError` if training diverges.
    pub fn train(
        &self,
        session: &mut TrainingSession<'_, T>,
        n_iterations: usize,
        learning_rate: Option<T>,
    ) -> Result<()> {
        let mut callback = self.progress_callback();
        self.train_with_callback(session, n_iterations, learning_rate, callback.as_mut())
    }

    /// [`train`](Self::train) reporting to `callback`.
    pub fn train_with_callback(
        &self,
        session: &mut TrainingSession<'_, T>,
        n_iterations: usize,
        learning_rate: Option<T>,
        callback: &mut dyn TrainingCallback<T>,
    ) -> Result<()> {
        let learning_rate = learning_rate.unwrap_or(self.config.learning_rate);
        check_learning_rate(learning_rate)?;
        session.set_learning_rate(learning_rate)?;
        session.reinitialize()?;
        session.run(n_iterations, callback)
    }

    /// Runs `n_iterations` more rounds on the current model.
    pub fn continue_training(
        &self,
        session: &mut TrainingSession<'_, T>,
        n_iterations: usize,
    ) -> Result<()> {
        let mut callback = self.progress_callback();
        self.continue_training_with_callback(session, n_iterations, callback.as_mut())
    }

    /// [`continue_training`](Self::continue_training) reporting to `callback`.
    pub fn continue_training_with_callback(
        &self,
        session: &mut TrainingSession<'_, T>,
        n_iterations: usize,
        callback: &mut dyn TrainingCallback<T>,
    ) -> Result<()> {
        session.run(n_iterations, callback)
    }

    /// Trains up to each checkpoint and records the train and test MSE there.
    ///
    /// The first checkpoint starts from a fresh model (as [`train`](Self::train));
    /// later checkpoints continue from the previous one. Each MSE is masked to
    /// the observed cells of its reference.
    ///
    /// # Errors
    ///
    /// Fails before any training with `InvalidArgument` if `checkpoints` is
    /// empty, holds a zero or is not strictly ascending, and with
    /// `DimensionMismatch` / `InvalidArgument` if a reference does not match
    /// the training shape or has no observed entry. Errors during training
    /// or evaluation are returned as is; no partial curve is produced.
    pub fn learning_curve(
        &self,
        session: &mut TrainingSession<'_, T>,
        checkpoints: &[usize],
        train_ref: &RatingsMatrix<T>,
        test_ref: &RatingsMatrix<T>,
        learning_rate: Option<T>,
    ) -> Result<LearningCurve<T>> {
        let mut callback = self.progress_callback();
        self.learning_curve_with_callback(
            session,
            checkpoints,
            train_ref,
            test_ref,
            learning_rate,
            callback.as_mut(),
        )
    }

    /// [`learning_curve`](Self::learning_curve) reporting to `callback`.
    pub fn learning_curve_with_callback(
        &self,
        session: &mut TrainingSession<'_, T>,
        checkpoints: &[usize],
        train_ref: &RatingsMatrix<T>,
        test_ref: &RatingsMatrix<T>,
        learning_rate: Option<T>,
        callback: &mut dyn TrainingCallback<T>,
    ) -> Result<LearningCurve<T>> {
        validate_checkpoints(checkpoints)?;
        let shape = session.ratings().shape();
        check_reference("train_ref", train_ref, shape)?;
        check_reference("test_ref", test_ref, shape)?;
        if let Some(lr) = learning_rate {
            check_learning_rate(lr)?;
        }

        let mut curve = LearningCurve::with_capacity(checkpoints.len());
        let mut done = 0;
        for (k, &n) in checkpoints.iter().enumerate() {
            if k == 0 {
                self.train_with_callback(session, n, learning_rate, callback)?;
            } else {
                self.continue_training_with_callback(session, n - done, callback)?;
            }
            done = n;

            let predictions = session.model().predict_all();
            let info = CheckpointInfo {
                iterations: n,
                train_mse: mse(&predictions, train_ref)?,
                test_mse: mse(&predictions, test_ref)?,
            };
            callback.on_checkpoint(&info)?;
            curve.push(info.iterations, info.train_mse, info.test_mse);
        }
        Ok(curve)
    }

    fn progress_callback(&self) -> Box<dyn TrainingCallback<T>> {
        if self.config.verbose {
            Box::new(TracingProgressCallback::new(self.config.progress_every))
        } else {
            Box::new(NoOpCallback)
        }
    }
}

/// Checks that `checkpoints` is non-empty, positive and strictly ascending.
pub fn validate_checkpoints(checkpoints: &[usize]) -> Result<()> {
    match checkpoints.first() {
        None => {
            return Err(MfError::invalid_argument(
                "checkpoints",
                "at least one checkpoint is required",
            ))
        }
        Some(0) => {
            return Err(MfError::invalid_argument(
                "checkpoints",
                "checkpoints must be positive",
            ))
        }
        Some(_) => {}
    }
    for pair in checkpoints.windows(2) {
        if pair[1] <= pair[0] {
            return Err(MfError::invalid_argument(
                "checkpoints",
                format!(
                    "checkpoints must be strictly ascending, got {} after {}",
                    pair[1], pair[0]
                ),
            ));
        }
    }
    Ok(())
}

fn check_reference<T: Scalar>(
    name: &str,
    reference: &RatingsMatrix<T>,
    shape: (usize, usize),
) -> Result<()> {
    if reference.shape() != shape {
        return Err(MfError::dimension_mismatch(
            format_shape(shape),
            format!("{} for {}", format_shape(reference.shape()), name),
        ));
    }
    if reference.nnz() == 0 {
        return Err(MfError::invalid_argument(name, "reference has no observed entry"));
    }
    Ok(())
}
