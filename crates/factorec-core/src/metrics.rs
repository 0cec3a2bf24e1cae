//! Masked error metrics.
//!
//! Only cells observed in the reference matrix contribute: an unobserved
//! cell carries no rating to compare against, whatever the prediction says.

use crate::{
    error::{MfError, Result},
    model::FactorModel,
    ratings::RatingsMatrix,
    types::{format_shape, DMatrix, Scalar},
};
use num_traits::Float;

/// Mean squared error over the observed cells of `reference`.
///
/// # Errors
///
/// - `DimensionMismatch` if the shapes differ.
/// - `InvalidArgument` if `reference` has no observed cell.
/// - `NumericalError` if the result is not finite.
///
/// # Examples
///
/// ```rust
/// use factorec_core::{metrics::mse, ratings::RatingsMatrix};
/// use nalgebra::DMatrix;
///
/// let reference = RatingsMatrix::new(DMatrix::from_row_slice(2, 2, &[0.0, 2.0, 3.0, 0.0])).unwrap();
/// let predictions = DMatrix::from_row_slice(2, 2, &[5.0, 2.0, 3.0, 5.0]);
/// assert_eq!(mse(&predictions, &reference).unwrap(), 0.0);
/// ```
pub fn mse<T: Scalar>(predictions: &DMatrix<T>, reference: &RatingsMatrix<T>) -> Result<T> {
    if predictions.shape() != reference.shape() {
        return Err(MfError::dimension_mismatch(
            format_shape(reference.shape()),
            format_shape(predictions.shape()),
        ));
    }

    let mut sum = T::zero();
    let mut count = 0usize;
    for (p, r) in predictions.iter().zip(reference.as_matrix().iter()) {
        if *r != T::zero() {
            let diff = *p - *r;
            sum += diff * diff;
            count += 1;
        }
    }

    if count == 0 {
        return Err(MfError::invalid_argument(
            "reference",
            "has no observed entries, the mean is undefined",
        ));
    }

    let value = sum / <T as Scalar>::from_usize(count);
    if !Float::is_finite(value) {
        return Err(MfError::numerical_error(format!(
            "mean squared error is not finite ({})",
            value
        )));
    }
    Ok(value)
}

/// Root mean squared error over the observed cells of `reference`.
pub fn rmse<T: Scalar>(predictions: &DMatrix<T>, reference: &RatingsMatrix<T>) -> Result<T> {
    mse(predictions, reference).map(<T as Float>::sqrt)
}

/// MSE of a model's full prediction matrix against `reference`.
///
/// Materializes [`FactorModel::predict_all`]; when scoring the same model
/// against several references, call it once and reuse the matrix with
/// [`mse`] instead.
pub fn model_mse<T: Scalar>(model: &FactorModel<T>, reference: &RatingsMatrix<T>) -> Result<T> {
    mse(&model.predict_all(), reference)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_masking() {
        let reference =
            RatingsMatrix::new(DMatrix::from_row_slice(2, 2, &[0.0, 2.0, 3.0, 0.0])).unwrap();
        let predictions = DMatrix::from_row_slice(2, 2, &[5.0, 2.0, 3.0, 5.0]);
        assert_eq!(mse(&predictions, &reference).unwrap(), 0.0);
    }

    #[test]
    fn test_value() {
        let reference =
            RatingsMatrix::new(DMatrix::from_row_slice(1, 3, &[1.0, 0.0, 4.0])).unwrap();
        let predictions = DMatrix::from_row_slice(1, 3, &[2.0, 9.0, 2.0]);
        // (1 + 4) / 2
        assert_relative_eq!(mse(&predictions, &reference).unwrap(), 2.5);
        assert_relative_eq!(rmse(&predictions, &reference).unwrap(), 2.5f64.sqrt());
    }

    #[test]
    fn test_shape_mismatch() {
        let reference = RatingsMatrix::new(DMatrix::from_element(2, 3, 1.0)).unwrap();
        let predictions = DMatrix::from_element(3, 2, 1.0);
        let err = mse(&predictions, &reference).unwrap_err();
        assert!(matches!(err, MfError::DimensionMismatch { .. }));
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_empty_reference() {
        let reference = RatingsMatrix::<f64>::zeros(2, 2);
        let predictions = DMatrix::from_element(2, 2, 1.0);
        assert!(mse(&predictions, &reference).unwrap_err().is_invalid_argument());
    }

    #[test]
    fn test_non_finite_prediction() {
        let reference = RatingsMatrix::new(DMatrix::from_element(1, 2, 1.0)).unwrap();
        let predictions = DMatrix::from_row_slice(1, 2, &[f64::INFINITY, 1.0]);
        assert!(mse(&predictions, &reference).unwrap_err().is_numerical());
    }

    #[test]
    fn test_model_mse() {
        let users = DMatrix::from_row_slice(1, 1, &[2.0]);
        let items = DMatrix::from_row_slice(2, 1, &[1.0, 2.0]);
        let model = FactorModel::from_parts(users, items, None).unwrap();
        let reference = RatingsMatrix::new(DMatrix::from_row_slice(1, 2, &[3.0, 0.0])).unwrap();
        assert_relative_eq!(model_mse(&model, &reference).unwrap(), 1.0);
    }

    proptest! {
        #[test]
        fn prop_unobserved_cells_never_matter(
            values in prop::collection::vec(0u8..=5, 12),
            noise in prop::collection::vec(-10.0f64..10.0, 12),
        ) {
            prop_assume!(values.iter().any(|v| *v != 0));
            let reference = RatingsMatrix::new(DMatrix::from_iterator(
                3,
                4,
                values.iter().map(|v| *v as f64),
            ))
            .unwrap();
            let exact = reference.as_matrix().clone();
            let mut perturbed = exact.clone();
            for (k, v) in perturbed.iter_mut().enumerate() {
                if *v == 0.0 {
                    *v = noise[k];
                }
            }
            prop_assert_eq!(mse(&perturbed, &reference).unwrap(), 0.0);
        }
    }
}
