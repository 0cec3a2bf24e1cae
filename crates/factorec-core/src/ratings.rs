//! Dense-backed ratings matrix with an implicit sparsity pattern.
//!
//! A [`RatingsMatrix`] stores one value per `(user, item)` cell. The value
//! zero marks an unobserved cell and is never a real rating, so the set of
//! nonzero cells is the observation pattern used by splitting, training and
//! evaluation alike.
//!
//! # Examples
//!
//! ```rust
//! use factorec_core::ratings::RatingsMatrix;
//!
//! let ratings = RatingsMatrix::<f64>::from_records(
//!     &[(0, 1, 4.0), (1, 0, 3.0), (1, 2, 5.0)],
//!     2,
//!     3,
//! ).unwrap();
//!
//! assert_eq!(ratings.shape(), (2, 3));
//! assert_eq!(ratings.nnz(), 3);
//! assert!(!ratings.is_observed(0, 0));
//! ```

use crate::{
    error::{MfError, Result},
    types::{format_shape, DMatrix, Scalar, Shape},
};
use num_traits::Float;

/// User × item ratings; zero means unobserved.
///
/// The shape is fixed at construction. User and item indices are dense,
/// 0-based integers.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RatingsMatrix<T: Scalar> {
    values: DMatrix<T>,
}

impl<T: Scalar> RatingsMatrix<T> {
    /// Wraps a dense matrix.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if any entry is NaN or infinite.
    pub fn new(values: DMatrix<T>) -> Result<Self> {
        for u in 0..values.nrows() {
            for i in 0..values.ncols() {
                let v = values[(u, i)];
                if !Float::is_finite(v) {
                    return Err(MfError::invalid_argument(
                        "ratings",
                        format!("entry ({}, {}) is not finite: {}", u, i, v),
                    ));
                }
            }
        }
        Ok(Self { values })
    }

    /// Creates a matrix with no observed entries.
    pub fn zeros(n_users: usize, n_items: usize) -> Self {
        Self {
            values: DMatrix::zeros(n_users, n_items),
        }
    }

    /// Builds a matrix from 0-based `(user, item, rating)` triples.
    ///
    /// Later triples for the same cell overwrite earlier ones.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an index outside the given shape, or for
    /// a rating that is zero or not finite (zero is reserved for "unobserved").
    pub fn from_records(records: &[(usize, usize, T)], n_users: usize, n_items: usize) -> Result<Self> {
        let mut values = DMatrix::zeros(n_users, n_items);
        for (k, &(u, i, r)) in records.iter().enumerate() {
            if u >= n_users || i >= n_items {
                return Err(MfError::invalid_argument(
                    "records",
                    format!(
                        "record {} at ({}, {}) lies outside shape {}",
                        k,
                        u,
                        i,
                        format_shape((n_users, n_items))
                    ),
                ));
            }
            if r == T::zero() || !Float::is_finite(r) {
                return Err(MfError::invalid_argument(
                    "records",
                    format!("record {} has rating {}; ratings must be finite and nonzero", k, r),
                ));
            }
            values[(u, i)] = r;
        }
        Ok(Self { values })
    }

    /// Number of user rows.
    pub fn n_users(&self) -> usize {
        self.values.nrows()
    }

    /// Number of item columns.
    pub fn n_items(&self) -> usize {
        self.values.ncols()
    }

    /// Shape as `(n_users, n_items)`.
    pub fn shape(&self) -> Shape {
        self.values.shape()
    }

    /// Returns the stored value (zero if unobserved).
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds.
    #[inline]
    pub fn get(&self, user: usize, item: usize) -> T {
        self.values[(user, item)]
    }

    /// Returns `true` if the cell holds a rating.
    #[inline]
    pub fn is_observed(&self, user: usize, item: usize) -> bool {
        self.values[(user, item)] != T::zero()
    }

    /// Number of observed cells.
    pub fn nnz(&self) -> usize {
        self.values.iter().filter(|v| **v != T::zero()).count()
    }

    /// Observed cells in row-major order.
    pub fn observed_entries(&self) -> Vec<(usize, usize)> {
        let mut entries = Vec::with_capacity(self.nnz());
        for u in 0..self.n_users() {
            for i in 0..self.n_items() {
                if self.is_observed(u, i) {
                    entries.push((u, i));
                }
            }
        }
        entries
    }

    /// Item indices observed for a user, ascending.
    pub fn user_observed(&self, user: usize) -> Vec<usize> {
        (0..self.n_items())
            .filter(|&i| self.is_observed(user, i))
            .collect()
    }

    /// User indices that rated an item, ascending.
    pub fn item_observed(&self, item: usize) -> Vec<usize> {
        (0..self.n_users())
            .filter(|&u| self.is_observed(u, item))
            .collect()
    }

    /// Mean of the observed ratings, `None` when nothing is observed.
    pub fn observed_mean(&self) -> Option<T> {
        let (sum, count) = self
            .values
            .iter()
            .filter(|v| **v != T::zero())
            .fold((T::zero(), 0usize), |(s, c), v| (s + *v, c + 1));
        if count == 0 {
            None
        } else {
            Some(sum / <T as Scalar>::from_usize(count))
        }
    }

    /// Fraction of observed cells in `[0, 1]`; zero for an empty shape.
    pub fn density(&self) -> f64 {
        let cells = self.n_users() * self.n_items();
        if cells == 0 {
            0.0
        } else {
            self.nnz() as f64 / cells as f64
        }
    }

    /// Borrows the underlying dense matrix.
    pub fn as_matrix(&self) -> &DMatrix<T> {
        &self.values
    }

    /// Consumes the wrapper and returns the dense matrix.
    pub fn into_matrix(self) -> DMatrix<T> {
        self.values
    }

    pub(crate) fn set(&mut self, user: usize, item: usize, value: T) {
        self.values[(user, item)] = value;
    }
}

impl<T: Scalar> TryFrom<DMatrix<T>> for RatingsMatrix<T> {
    type Error = MfError;

    fn try_from(values: DMatrix<T>) -> Result<Self> {
        Self::new(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> RatingsMatrix<f64> {
        RatingsMatrix::new(DMatrix::from_row_slice(
            3,
            4,
            &[
                5.0, 0.0, 3.0, 0.0, //
                0.0, 0.0, 0.0, 1.0, //
                4.0, 2.0, 0.0, 0.0,
            ],
        ))
        .unwrap()
    }

    #[test]
    fn test_observation_pattern() {
        let r = sample();
        assert_eq!(r.shape(), (3, 4));
        assert_eq!(r.nnz(), 5);
        assert_eq!(
            r.observed_entries(),
            vec![(0, 0), (0, 2), (1, 3), (2, 0), (2, 1)]
        );
        assert_eq!(r.user_observed(0), vec![0, 2]);
        assert_eq!(r.item_observed(0), vec![0, 2]);
        assert!(r.is_observed(2, 1));
        assert!(!r.is_observed(1, 1));
    }

    #[test]
    fn test_observed_mean_and_density() {
        let r = sample();
        assert_eq!(r.observed_mean(), Some(3.0));
        assert!((r.density() - 5.0 / 12.0).abs() < 1e-12);

        let empty = RatingsMatrix::<f64>::zeros(2, 2);
        assert_eq!(empty.observed_mean(), None);
        assert_eq!(empty.density(), 0.0);
    }

    #[test]
    fn test_rejects_non_finite() {
        let m = DMatrix::from_row_slice(1, 2, &[1.0, f64::NAN]);
        let err = RatingsMatrix::new(m).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_from_records() {
        let r = RatingsMatrix::<f32>::from_records(&[(0, 1, 2.0), (0, 1, 4.0), (1, 0, 1.0)], 2, 2)
            .unwrap();
        assert_eq!(r.get(0, 1), 4.0);
        assert_eq!(r.nnz(), 2);

        assert!(RatingsMatrix::<f32>::from_records(&[(2, 0, 1.0)], 2, 2).is_err());
        assert!(RatingsMatrix::<f32>::from_records(&[(0, 0, 0.0)], 2, 2).is_err());
    }
}
