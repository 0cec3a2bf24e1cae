//! Training configuration.
//!
//! [`MfConfig`] gathers every hyperparameter of a factorization run and is
//! built in the usual `new().with_*()` style. [`MfConfig::validate`] is called
//! by the trainer before any work starts, so invalid values surface as
//! `InvalidArgument` naming the parameter.
//!
//! # Examples
//!
//! ```rust
//! use factorec_core::config::{LearningStrategy, MfConfig};
//!
//! let config = MfConfig::<f64>::new()
//!     .with_n_factors(20)
//!     .with_strategy(LearningStrategy::Sgd)
//!     .with_learning_rate(0.01)
//!     .with_regularization(0.1)
//!     .with_seed(42);
//!
//! assert!(config.validate().is_ok());
//! ```

use crate::{
    error::{MfError, Result},
    types::{constants, Scalar},
};
use num_traits::Float;
use std::fmt;

/// Optimization algorithm used to fit the factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum LearningStrategy {
    /// Stochastic gradient descent with user, item and global biases.
    #[default]
    Sgd,
    /// Alternating least squares on the dense ratings, without biases.
    Als,
}

impl LearningStrategy {
    /// Returns `true` if models trained with this strategy carry biases.
    pub fn uses_biases(self) -> bool {
        matches!(self, Self::Sgd)
    }
}

impl fmt::Display for LearningStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sgd => write!(f, "sgd"),
            Self::Als => write!(f, "als"),
        }
    }
}

impl std::str::FromStr for LearningStrategy {
    type Err = MfError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sgd" => Ok(Self::Sgd),
            "als" => Ok(Self::Als),
            other => Err(MfError::invalid_argument(
                "strategy",
                format!("expected `sgd` or `als`, got `{}`", other),
            )),
        }
    }
}

/// Hyperparameters of a factorization run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MfConfig<T: Scalar> {
    /// Latent rank
    pub n_factors: usize,

    /// Update strategy
    pub strategy: LearningStrategy,

    /// L2 weight on user factors (SGD and ALS)
    pub user_fact_reg: T,

    /// L2 weight on item factors (SGD and ALS)
    pub item_fact_reg: T,

    /// L2 weight on user biases (SGD only)
    pub user_bias_reg: T,

    /// L2 weight on item biases (SGD only)
    pub item_bias_reg: T,

    /// Step size (SGD only)
    pub learning_rate: T,

    /// Emit progress through `tracing` during training
    pub verbose: bool,

    /// Iterations between progress events when `verbose` is set
    pub progress_every: usize,

    /// Seed of the session RNG (initialization and SGD shuffles)
    pub seed: u64,
}

impl<T: Scalar> Default for MfConfig<T> {
    fn default() -> Self {
        Self {
            n_factors: constants::DEFAULT_N_FACTORS,
            strategy: LearningStrategy::Sgd,
            user_fact_reg: T::zero(),
            item_fact_reg: T::zero(),
            user_bias_reg: T::zero(),
            item_bias_reg: T::zero(),
            learning_rate: <T as Scalar>::from_f64(constants::DEFAULT_LEARNING_RATE),
            verbose: false,
            progress_every: constants::DEFAULT_PROGRESS_EVERY,
            seed: 0,
        }
    }
}

impl<T: Scalar> MfConfig<T> {
    /// Creates a configuration with default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the latent rank.
    pub fn with_n_factors(mut self, n_factors: usize) -> Self {
        self.n_factors = n_factors;
        self
    }

    /// Sets the update strategy.
    pub fn with_strategy(mut self, strategy: LearningStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the user and item factor regularization.
    pub fn with_factor_regularization(mut self, user: T, item: T) -> Self {
        self.user_fact_reg = user;
        self.item_fact_reg = item;
        self
    }

    /// Sets the user and item bias regularization.
    pub fn with_bias_regularization(mut self, user: T, item: T) -> Self {
        self.user_bias_reg = user;
        self.item_bias_reg = item;
        self
    }

    /// Sets all four regularization weights to the same value.
    pub fn with_regularization(self, reg: T) -> Self {
        self.with_factor_regularization(reg, reg)
            .with_bias_regularization(reg, reg)
    }

    /// Sets the SGD learning rate.
    pub fn with_learning_rate(mut self, learning_rate: T) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Enables or disables progress events.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Sets the number of iterations between progress events.
    pub fn with_progress_every(mut self, every: usize) -> Self {
        self.progress_every = every;
        self
    }

    /// Sets the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Checks every parameter.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` naming the first offending parameter:
    /// `n_factors` and `progress_every` must be positive, regularization
    /// weights finite and non-negative, the learning rate finite and positive.
    pub fn validate(&self) -> Result<()> {
        if self.n_factors == 0 {
            return Err(MfError::invalid_argument("n_factors", "must be positive, got 0"));
        }
        if self.progress_every == 0 {
            return Err(MfError::invalid_argument("progress_every", "must be positive, got 0"));
        }
        for (name, value) in [
            ("user_fact_reg", self.user_fact_reg),
            ("item_fact_reg", self.item_fact_reg),
            ("user_bias_reg", self.user_bias_reg),
            ("item_bias_reg", self.item_bias_reg),
        ] {
            check_non_negative(name, value)?;
        }
        check_learning_rate(self.learning_rate)
    }
}

/// Checks that a learning rate is finite and strictly positive.
pub fn check_learning_rate<T: Scalar>(learning_rate: T) -> Result<()> {
    if !Float::is_finite(learning_rate) || learning_rate <= T::zero() {
        return Err(MfError::invalid_argument(
            "learning_rate",
            format!("must be finite and positive, got {}", learning_rate),
        ));
    }
    Ok(())
}

fn check_non_negative<T: Scalar>(name: &str, value: T) -> Result<()> {
    if !Float::is_finite(value) || value < T::zero() {
        return Err(MfError::invalid_argument(
            name,
            format!("must be finite and non-negative, got {}", value),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MfConfig::<f64>::default();
        assert_eq!(config.n_factors, 40);
        assert_eq!(config.strategy, LearningStrategy::Sgd);
        assert_eq!(config.learning_rate, 0.1);
        assert_eq!(config.user_fact_reg, 0.0);
        assert!(!config.verbose);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = MfConfig::<f32>::new()
            .with_n_factors(5)
            .with_strategy(LearningStrategy::Als)
            .with_regularization(0.5)
            .with_seed(3);
        assert_eq!(config.n_factors, 5);
        assert_eq!(config.strategy, LearningStrategy::Als);
        assert_eq!(config.item_bias_reg, 0.5);
        assert_eq!(config.user_fact_reg, 0.5);
        assert_eq!(config.seed, 3);
    }

    #[test]
    fn test_validation_names_parameter() {
        let err = MfConfig::<f64>::new().with_n_factors(0).validate().unwrap_err();
        assert!(err.to_string().contains("n_factors"));

        let err = MfConfig::<f64>::new()
            .with_factor_regularization(0.1, -1.0)
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("item_fact_reg"));

        let err = MfConfig::<f64>::new().with_learning_rate(0.0).validate().unwrap_err();
        assert!(err.to_string().contains("learning_rate"));

        let err = MfConfig::<f64>::new()
            .with_learning_rate(f64::NAN)
            .validate()
            .unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!("SGD".parse::<LearningStrategy>().unwrap(), LearningStrategy::Sgd);
        assert_eq!("als".parse::<LearningStrategy>().unwrap(), LearningStrategy::Als);
        assert!("adam".parse::<LearningStrategy>().is_err());
        assert_eq!(LearningStrategy::Als.to_string(), "als");
        assert!(LearningStrategy::Sgd.uses_biases());
        assert!(!LearningStrategy::Als.uses_biases());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_config_from_json() {
        let config: MfConfig<f64> = serde_json::from_str(
            r#"{ "n_factors": 8, "strategy": "als", "item_fact_reg": 0.01, "seed": 5 }"#,
        )
        .unwrap();
        assert_eq!(config.n_factors, 8);
        assert_eq!(config.strategy, LearningStrategy::Als);
        assert_eq!(config.item_fact_reg, 0.01);
        assert_eq!(config.learning_rate, 0.1);
        assert_eq!(config.seed, 5);
    }
}
