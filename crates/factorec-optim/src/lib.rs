//! factorec Optimization - Training engines for explicit-feedback matrix factorization.
//!
//! This crate fits [`FactorModel`](factorec_core::model::FactorModel)s to a
//! ratings matrix and records learning curves against held-out data.
//!
//! # Available Strategies
//!
//! - **SGD**: Sequential stochastic gradient descent over shuffled observed
//!   cells, with user, item and global biases
//! - **ALS**: Alternating least squares on the dense ratings, solved exactly
//!   per half-step, without biases
//!
//! # Examples
//!
//! ```rust
//! use factorec_core::prelude::*;
//! use factorec_optim::Trainer;
//! # use nalgebra::DMatrix;
//!
//! # fn main() -> factorec_core::Result<()> {
//! # let ratings = RatingsMatrix::new(DMatrix::from_fn(6, 8, |u, i| ((u * 3 + i) % 5 + 1) as f64))?;
//! let split = Splitter::new(2).with_seed(7).split(&ratings)?;
//!
//! let trainer = Trainer::new(
//!     MfConfig::new()
//!         .with_strategy(LearningStrategy::Als)
//!         .with_n_factors(3)
//!         .with_regularization(0.1),
//! )?;
//! let mut session = trainer.session(split.train())?;
//! let curve = trainer.learning_curve(&mut session, &[1, 2, 5], split.train(), split.test(), None)?;
//!
//! assert_eq!(curve.len(), 3);
//! # Ok(())
//! # }
//! ```

pub mod als;
pub mod callback;
pub mod curve;
pub mod session;
pub mod sgd;
pub mod strategy;
pub mod trainer;

// Re-export main types for convenience
pub use als::AlsStrategy;
pub use callback::{
    CheckpointInfo, IterationInfo, NoOpCallback, TracingProgressCallback, TrainingCallback,
};
pub use curve::LearningCurve;
pub use session::TrainingSession;
pub use sgd::SgdStrategy;
pub use strategy::{SessionRng, Strategy, UpdateStrategy};
pub use trainer::{validate_checkpoints, Trainer};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::callback::{NoOpCallback, TracingProgressCallback, TrainingCallback};
    pub use crate::curve::LearningCurve;
    pub use crate::session::TrainingSession;
    pub use crate::trainer::Trainer;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<S: Send + Sync>() {}
    fn assert_send<S: Send>() {}

    #[test]
    fn test_exports_are_thread_safe() {
        assert_send_sync::<Trainer<f64>>();
        assert_send_sync::<Strategy<f32>>();
        assert_send::<TrainingSession<'static, f64>>();
        assert_send::<TracingProgressCallback>();
    }
}
