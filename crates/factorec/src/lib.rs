//! # factorec
//!
//! Explicit-feedback collaborative filtering by low-rank matrix factorization.
//!
//! A ratings matrix is split into train and test halves by holding out a
//! fixed number of ratings per user; a latent factor model is fitted to the
//! training half with stochastic gradient descent or alternating least
//! squares; learning curves of the masked MSE on both halves show how the
//! model generalizes with the number of iterations.
//!
//! ## Quick Start
//!
//! ```rust
//! use factorec::prelude::*;
//! # use nalgebra::DMatrix;
//!
//! # fn main() -> factorec::Result<()> {
//! # let ratings = RatingsMatrix::new(DMatrix::from_fn(10, 12, |u, i| ((u + i) % 5 + 1) as f64))?;
//! // Hold out 3 ratings per user for testing
//! let split = Splitter::new(3).with_seed(42).split(&ratings)?;
//!
//! // SGD with biases
//! let trainer = Trainer::new(
//!     MfConfig::new()
//!         .with_n_factors(4)
//!         .with_learning_rate(0.01)
//!         .with_regularization(0.01),
//! )?;
//! let mut session = trainer.session(split.train())?;
//! let curve = trainer.learning_curve(
//!     &mut session,
//!     &[1, 2, 5, 10],
//!     split.train(),
//!     split.test(),
//!     None,
//! )?;
//!
//! let (iterations, test_mse) = curve.best_test().expect("non-empty curve");
//! println!("best test MSE {test_mse:.4} after {iterations} iterations");
//!
//! let model = session.into_model();
//! let score = model.predict(0, 1)?;
//! # let _ = score;
//! # Ok(())
//! # }
//! ```
//!
//! ## Crates
//!
//! - [`factorec_core`]: ratings, splitting, the factor model, metrics, config
//! - [`factorec_optim`]: SGD and ALS training, sessions, learning curves
//! - this crate: data loading and hyperparameter grid search

pub use factorec_core;
pub use factorec_optim;

pub mod data;
pub mod sweep;

pub use factorec_core::{ErrorKind, MfError, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use factorec_core::prelude::*;
    pub use factorec_optim::prelude::*;

    pub use crate::data::{load_ratings, parse_records, DataError, DatasetSummary, RatingsTable};
    pub use crate::sweep::{GridSearch, SweepReport, SweepResult};
}
