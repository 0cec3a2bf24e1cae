//! Type definitions and aliases for matrix factorization.
//!
//! This module provides the numeric trait used throughout the library,
//! matrix/vector aliases and a handful of numerical constants.

use nalgebra::{Dyn, OMatrix, OVector, RealField, Scalar as NalgebraScalar};
use num_traits::{Float, FromPrimitive};
use std::fmt::{Debug, Display};

/// Trait for scalar types used for ratings and factors (f32 or f64).
///
/// This trait combines all the numeric traits needed by the training
/// engines: nalgebra's `RealField` for the least-squares solves and
/// `num_traits::Float` for elementwise arithmetic.
pub trait Scalar:
    NalgebraScalar
    + RealField
    + Float
    + FromPrimitive
    + Display
    + Debug
    + Default
    + Copy
    + Send
    + Sync
    + 'static
{
    /// Machine epsilon for this scalar type.
    const EPSILON: Self;

    /// Convert from f64 (for constants and sampled values).
    ///
    /// # Panics
    ///
    /// Panics if the conversion fails.
    fn from_f64(v: f64) -> Self {
        <Self as FromPrimitive>::from_f64(v).expect("Failed to convert from f64")
    }

    /// Convert from usize (for counts used as divisors).
    ///
    /// # Panics
    ///
    /// Panics if the conversion fails.
    fn from_usize(v: usize) -> Self {
        <Self as FromPrimitive>::from_usize(v).expect("Failed to convert from usize")
    }
}

impl Scalar for f32 {
    const EPSILON: Self = f32::EPSILON;
}

impl Scalar for f64 {
    const EPSILON: Self = f64::EPSILON;
}

/// Type alias for a dynamically-sized matrix.
pub type DMatrix<T> = OMatrix<T, Dyn, Dyn>;

/// Type alias for a dynamically-sized vector.
pub type DVector<T> = OVector<T, Dyn>;

/// Shape of a ratings or prediction matrix as `(n_users, n_items)`.
pub type Shape = (usize, usize);

/// Formats a shape the way error messages report it.
pub fn format_shape(shape: Shape) -> String {
    format!("({}, {})", shape.0, shape.1)
}

/// Returns `true` when every entry of the matrix is finite.
pub fn all_finite<T: Scalar>(matrix: &DMatrix<T>) -> bool {
    matrix.iter().all(|v| Float::is_finite(*v))
}

/// Numerical constants.
pub mod constants {
    /// Default number of ratings held out per user by the splitter.
    pub const DEFAULT_HOLDOUT_PER_USER: usize = 10;

    /// Default latent rank.
    pub const DEFAULT_N_FACTORS: usize = 40;

    /// Default SGD learning rate.
    pub const DEFAULT_LEARNING_RATE: f64 = 0.1;

    /// Default number of iterations between progress reports.
    pub const DEFAULT_PROGRESS_EVERY: usize = 10;
}
