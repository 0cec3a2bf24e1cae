//! Update strategies.
//!
//! A strategy performs one full update round of a [`FactorModel`] against
//! the training ratings: one shuffled SGD epoch, or one ALS alternation
//! (users then items). The strategy is chosen once, when a training session
//! is built, and never changes for the life of that session.

use crate::{als::AlsStrategy, sgd::SgdStrategy};
use factorec_core::{
    config::{LearningStrategy, MfConfig},
    error::Result,
    model::FactorModel,
    ratings::RatingsMatrix,
    types::Scalar,
};
use rand::rngs::StdRng;
use std::fmt::Debug;

/// RNG owned by a training session.
pub type SessionRng = StdRng;

/// One round of parameter updates.
pub trait UpdateStrategy<T: Scalar>: Debug + Send + Sync {
    /// Short lowercase name used in logs.
    fn name(&self) -> &'static str;

    /// Whether the model this strategy trains carries bias terms.
    fn uses_biases(&self) -> bool;

    /// Runs one update round in place.
    ///
    /// `ratings` must have the model's shape. Strategies that need
    /// randomness draw it from `rng` only, so a round is a pure function of
    /// the model, the ratings and the RNG state.
    fn step(
        &mut self,
        model: &mut FactorModel<T>,
        ratings: &RatingsMatrix<T>,
        rng: &mut SessionRng,
    ) -> Result<()>;
}

/// The two available strategies behind a single type.
#[derive(Debug, Clone)]
pub enum Strategy<T: Scalar> {
    /// Stochastic gradient descent with biases
    Sgd(SgdStrategy<T>),
    /// Alternating least squares without biases
    Als(AlsStrategy<T>),
}

impl<T: Scalar> Strategy<T> {
    /// Builds the strategy selected by `config` for the given training ratings.
    pub fn from_config(config: &MfConfig<T>, ratings: &RatingsMatrix<T>) -> Self {
        match config.strategy {
            LearningStrategy::Sgd => Self::Sgd(SgdStrategy::from_config(config, ratings)),
            LearningStrategy::Als => Self::Als(AlsStrategy::from_config(config)),
        }
    }

    /// Which strategy this is.
    pub fn kind(&self) -> LearningStrategy {
        match self {
            Self::Sgd(_) => LearningStrategy::Sgd,
            Self::Als(_) => LearningStrategy::Als,
        }
    }

    /// Sets the SGD step size. ALS has no step size and ignores it.
    pub fn set_learning_rate(&mut self, learning_rate: T) -> Result<()> {
        match self {
            Self::Sgd(sgd) => sgd.set_learning_rate(learning_rate),
            Self::Als(_) => Ok(()),
        }
    }
}

impl<T: Scalar> UpdateStrategy<T> for Strategy<T> {
    fn name(&self) -> &'static str {
        match self {
            Self::Sgd(s) => s.name(),
            Self::Als(s) => s.name(),
        }
    }

    fn uses_biases(&self) -> bool {
        match self {
            Self::Sgd(s) => s.uses_biases(),
            Self::Als(s) => s.uses_biases(),
        }
    }

    fn step(
        &mut self,
        model: &mut FactorModel<T>,
        ratings: &RatingsMatrix<T>,
        rng: &mut SessionRng,
    ) -> Result<()> {
        match self {
            Self::Sgd(s) => s.step(model, ratings, rng),
            Self::Als(s) => s.step(model, ratings, rng),
        }
    }
}
