//! Core types for explicit-feedback matrix factorization.
//!
//! This crate provides the data structures shared by the training engines:
//! the ratings container, the per-user train/test splitter, the latent factor
//! model and the masked evaluation metrics.
//!
//! # Key Concepts
//!
//! - **Ratings**: a dense user × item matrix where zero means "unobserved"
//! - **Split**: disjoint train/test halves with a fixed holdout per user
//! - **Factor model**: user and item latent vectors, plus biases for SGD
//! - **Masked MSE**: squared error averaged over observed cells only
//!
//! # Modules
//!
//! - [`config`]: Hyperparameters and strategy selection
//! - [`error`]: Error types
//! - [`metrics`]: Masked MSE / RMSE
//! - [`model`]: Latent factor model and prediction
//! - [`ratings`]: Ratings matrix
//! - [`split`]: Train/test splitting
//! - [`types`]: Scalar trait, aliases and constants

pub mod config;
pub mod error;
pub mod metrics;
pub mod model;
pub mod ratings;
pub mod split;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export commonly used items at the crate root
pub use error::{ErrorKind, MfError, Result};

/// Prelude module for convenient imports.
///
/// # Example
/// ```
/// use factorec_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{LearningStrategy, MfConfig};
    pub use crate::error::{ErrorKind, MfError, Result};
    pub use crate::metrics::{model_mse, mse, rmse};
    pub use crate::model::{Biases, FactorModel};
    pub use crate::ratings::RatingsMatrix;
    pub use crate::split::{train_test_split, Split, Splitter};
    pub use crate::types::{constants, DMatrix, DVector, Scalar, Shape};
}
