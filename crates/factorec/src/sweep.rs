//! Hyperparameter grid search.
//!
//! A [`GridSearch`] trains one model per combination of latent rank,
//! regularization weight and learning rate, records a learning curve for
//! each against the same train/test split, and reports the combination
//! whose best checkpoint has the smallest test MSE.
//!
//! Combinations are enumerated with the rank outermost and the learning rate
//! innermost. An empty axis keeps the value of the base configuration. Every
//! run uses the base seed, so results do not depend on whether the runs are
//! executed in parallel.
//!
//! # Examples
//!
//! ```rust
//! use factorec::prelude::*;
//! # use nalgebra::DMatrix;
//!
//! # fn main() -> factorec::Result<()> {
//! # let ratings = RatingsMatrix::new(DMatrix::from_fn(8, 10, |u, i| ((u + 2 * i) % 5 + 1) as f64))?;
//! let split = Splitter::new(2).split(&ratings)?;
//! let report = GridSearch::new(MfConfig::new().with_learning_rate(0.01), vec![1, 5, 10])
//!     .with_factor_counts(vec![2, 4])
//!     .with_regularizations(vec![0.01, 0.1])
//!     .run(split.train(), split.test())?;
//!
//! assert_eq!(report.len(), 4);
//! let best = report.best().expect("at least one run");
//! println!("best rank {} at {} iterations", best.config.n_factors, best.best_iterations);
//! # Ok(())
//! # }
//! ```

use factorec_core::{
    config::MfConfig,
    error::{MfError, Result},
    ratings::RatingsMatrix,
    types::Scalar,
};
use factorec_optim::{validate_checkpoints, LearningCurve, Trainer};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Outcome of one grid point.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepResult<T: Scalar> {
    /// Configuration the model was trained with
    pub config: MfConfig<T>,
    /// Full learning curve of the run
    pub curve: LearningCurve<T>,
    /// Checkpoint with the lowest test MSE (earliest on ties)
    pub best_iterations: usize,
    /// Train MSE at that checkpoint
    pub best_train_mse: T,
    /// Test MSE at that checkpoint
    pub best_test_mse: T,
}

/// All results of a grid search, in grid order.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepReport<T: Scalar> {
    results: Vec<SweepResult<T>>,
}

impl<T: Scalar> SweepReport<T> {
    /// Results in grid order.
    pub fn results(&self) -> &[SweepResult<T>] {
        &self.results
    }

    /// Number of grid points.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Returns `true` if the grid was empty.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Result with the smallest best test MSE, the first in grid order on ties.
    pub fn best(&self) -> Option<&SweepResult<T>> {
        let mut best: Option<&SweepResult<T>> = None;
        for result in &self.results {
            match best {
                Some(current) if !(result.best_test_mse < current.best_test_mse) => {}
                _ => best = Some(result),
            }
        }
        best
    }

    /// Consumes the report.
    pub fn into_results(self) -> Vec<SweepResult<T>> {
        self.results
    }
}

/// Grid search over rank, regularization and learning rate.
#[derive(Debug, Clone)]
pub struct GridSearch<T: Scalar> {
    base: MfConfig<T>,
    checkpoints: Vec<usize>,
    factor_counts: Vec<usize>,
    regularizations: Vec<T>,
    learning_rates: Vec<T>,
    parallel: bool,
}

impl<T: Scalar> GridSearch<T> {
    /// Creates a search around `base`, evaluated at `checkpoints`.
    pub fn new(base: MfConfig<T>, checkpoints: Vec<usize>) -> Self {
        Self {
            base,
            checkpoints,
            factor_counts: Vec::new(),
            regularizations: Vec::new(),
            learning_rates: Vec::new(),
            parallel: false,
        }
    }

    /// Latent ranks to try.
    pub fn with_factor_counts(mut self, factor_counts: Vec<usize>) -> Self {
        self.factor_counts = factor_counts;
        self
    }

    /// Regularization weights to try; each value sets all four weights.
    pub fn with_regularizations(mut self, regularizations: Vec<T>) -> Self {
        self.regularizations = regularizations;
        self
    }

    /// SGD learning rates to try.
    pub fn with_learning_rates(mut self, learning_rates: Vec<T>) -> Self {
        self.learning_rates = learning_rates;
        self
    }

    /// Runs the grid points on the rayon thread pool.
    ///
    /// Without the `parallel` feature the runs stay sequential.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Every configuration of the grid, in grid order.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if a grid point does not validate.
    pub fn configurations(&self) -> Result<Vec<MfConfig<T>>> {
        let factor_counts = axis(&self.factor_counts, self.base.n_factors);
        let regularizations: Vec<Option<T>> = if self.regularizations.is_empty() {
            vec![None]
        } else {
            self.regularizations.iter().copied().map(Some).collect()
        };
        let learning_rates = axis(&self.learning_rates, self.base.learning_rate);

        let mut configs =
            Vec::with_capacity(factor_counts.len() * regularizations.len() * learning_rates.len());
        for &n_factors in &factor_counts {
            for reg in &regularizations {
                for &learning_rate in &learning_rates {
                    let mut config = self
                        .base
                        .clone()
                        .with_n_factors(n_factors)
                        .with_learning_rate(learning_rate);
                    if let Some(reg) = *reg {
                        config = config.with_regularization(reg);
                    }
                    config.validate()?;
                    configs.push(config);
                }
            }
        }
        Ok(configs)
    }

    /// Trains and evaluates every grid point.
    ///
    /// # Errors
    ///
    /// Fails before any training on invalid checkpoints or grid points.
    /// The first error of any run is returned.
    pub fn run(&self, train: &RatingsMatrix<T>, test: &RatingsMatrix<T>) -> Result<SweepReport<T>> {
        validate_checkpoints(&self.checkpoints)?;
        let configs = self.configurations()?;
        tracing::info!(
            grid_points = configs.len(),
            parallel = self.parallel,
            "starting grid search"
        );

        let results = if self.parallel {
            self.run_parallel(configs, train, test)?
        } else {
            configs
                .into_iter()
                .map(|config| run_one(config, &self.checkpoints, train, test))
                .collect::<Result<Vec<_>>>()?
        };
        Ok(SweepReport { results })
    }

    #[cfg(feature = "parallel")]
    fn run_parallel(
        &self,
        configs: Vec<MfConfig<T>>,
        train: &RatingsMatrix<T>,
        test: &RatingsMatrix<T>,
    ) -> Result<Vec<SweepResult<T>>> {
        configs
            .into_par_iter()
            .map(|config| run_one(config, &self.checkpoints, train, test))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    fn run_parallel(
        &self,
        configs: Vec<MfConfig<T>>,
        train: &RatingsMatrix<T>,
        test: &RatingsMatrix<T>,
    ) -> Result<Vec<SweepResult<T>>> {
        tracing::warn!("built without the `parallel` feature, running the grid sequentially");
        configs
            .into_iter()
            .map(|config| run_one(config, &self.checkpoints, train, test))
            .collect()
    }
}

fn axis<V: Copy>(values: &[V], base: V) -> Vec<V> {
    if values.is_empty() {
        vec![base]
    } else {
        values.to_vec()
    }
}

fn run_one<T: Scalar>(
    config: MfConfig<T>,
    checkpoints: &[usize],
    train: &RatingsMatrix<T>,
    test: &RatingsMatrix<T>,
) -> Result<SweepResult<T>> {
    let trainer = Trainer::new(config)?;
    let mut session = trainer.session(train)?;
    let curve = trainer.learning_curve(&mut session, checkpoints, train, test, None)?;

    let (best_iterations, best_train_mse, best_test_mse) = curve
        .best_checkpoint()
        .ok_or_else(|| MfError::invalid_argument("checkpoints", "no checkpoint was evaluated"))?;

    let config = trainer.config().clone();
    tracing::info!(
        strategy = %config.strategy,
        n_factors = config.n_factors,
        user_fact_reg = %config.user_fact_reg,
        learning_rate = %config.learning_rate,
        best_iterations,
        best_test_mse = %best_test_mse,
        "grid point done"
    );

    Ok(SweepResult {
        config,
        curve,
        best_iterations,
        best_train_mse,
        best_test_mse,
    })
}
