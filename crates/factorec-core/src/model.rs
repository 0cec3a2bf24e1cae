//! Latent factor model with optional bias terms.
//!
//! A [`FactorModel`] holds one latent vector per user and per item, stored
//! as the rows of two matrices sharing the latent rank `F`. Models trained
//! with stochastic gradient descent additionally carry [`Biases`]; models
//! trained with alternating least squares do not, and predict with the bare
//! dot product.
//!
//! # Prediction
//!
//! ```text
//! with biases:    r̂(u, i) = μ + b_u + b_i + ⟨p_u, q_i⟩
//! without biases: r̂(u, i) = ⟨p_u, q_i⟩
//! ```

use crate::{
    error::{MfError, Result},
    types::{all_finite, DMatrix, DVector, Scalar},
};
use num_traits::Float;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

/// Additive bias terms of an SGD-trained model.
#[derive(Debug, Clone, PartialEq)]
pub struct Biases<T: Scalar> {
    /// Per-user offset b_u
    pub user: DVector<T>,
    /// Per-item offset b_i
    pub item: DVector<T>,
    /// Global offset μ
    pub global: T,
}

impl<T: Scalar> Biases<T> {
    /// Zero user/item biases around the given global bias.
    pub fn zeros(n_users: usize, n_items: usize, global: T) -> Self {
        Self {
            user: DVector::zeros(n_users),
            item: DVector::zeros(n_items),
            global,
        }
    }
}

/// User and item latent factors plus optional biases.
#[derive(Debug, Clone, PartialEq)]
pub struct FactorModel<T: Scalar> {
    user_factors: DMatrix<T>,
    item_factors: DMatrix<T>,
    biases: Option<Biases<T>>,
}

impl<T: Scalar> FactorModel<T> {
    /// Draws a bias-free model from a `StdRng` seeded with `seed`.
    ///
    /// See [`FactorModel::initialize_with_rng`].
    pub fn initialize(n_users: usize, n_items: usize, n_factors: usize, seed: u64) -> Result<Self> {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::initialize_with_rng(n_users, n_items, n_factors, &mut rng)
    }

    /// Draws a bias-free model.
    ///
    /// Every factor entry is sampled independently from a normal distribution
    /// with mean 0 and standard deviation `1 / n_factors`. User rows are drawn
    /// first, row by row, then item rows.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if any dimension is zero.
    pub fn initialize_with_rng<R: Rng + ?Sized>(
        n_users: usize,
        n_items: usize,
        n_factors: usize,
        rng: &mut R,
    ) -> Result<Self> {
        if n_factors == 0 {
            return Err(MfError::invalid_argument("n_factors", "must be positive, got 0"));
        }
        if n_users == 0 || n_items == 0 {
            return Err(MfError::invalid_argument(
                "shape",
                format!("model needs at least one user and one item, got ({}, {})", n_users, n_items),
            ));
        }

        let normal = Normal::new(0.0, 1.0 / n_factors as f64)
            .map_err(|e| MfError::invalid_argument("n_factors", e.to_string()))?;
        let user_factors = sample_rows(n_users, n_factors, &normal, rng);
        let item_factors = sample_rows(n_items, n_factors, &normal, rng);

        Ok(Self {
            user_factors,
            item_factors,
            biases: None,
        })
    }

    /// Attaches zeroed user/item biases around `global`.
    pub fn with_biases(mut self, global: T) -> Self {
        self.biases = Some(Biases::zeros(self.n_users(), self.n_items(), global));
        self
    }

    /// Assembles a model from explicit parameters.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if the factor matrices disagree on the
    /// latent rank or the bias vectors disagree with the factor rows.
    pub fn from_parts(
        user_factors: DMatrix<T>,
        item_factors: DMatrix<T>,
        biases: Option<Biases<T>>,
    ) -> Result<Self> {
        if user_factors.ncols() != item_factors.ncols() {
            return Err(MfError::dimension_mismatch(
                format!("{} item factor columns", user_factors.ncols()),
                item_factors.ncols(),
            ));
        }
        if let Some(b) = &biases {
            if b.user.len() != user_factors.nrows() {
                return Err(MfError::dimension_mismatch(
                    format!("{} user biases", user_factors.nrows()),
                    b.user.len(),
                ));
            }
            if b.item.len() != item_factors.nrows() {
                return Err(MfError::dimension_mismatch(
                    format!("{} item biases", item_factors.nrows()),
                    b.item.len(),
                ));
            }
        }
        Ok(Self {
            user_factors,
            item_factors,
            biases,
        })
    }

    /// Number of users.
    pub fn n_users(&self) -> usize {
        self.user_factors.nrows()
    }

    /// Number of items.
    pub fn n_items(&self) -> usize {
        self.item_factors.nrows()
    }

    /// Latent rank `F`.
    pub fn n_factors(&self) -> usize {
        self.user_factors.ncols()
    }

    /// User factors, one row per user.
    pub fn user_factors(&self) -> &DMatrix<T> {
        &self.user_factors
    }

    /// Item factors, one row per item.
    pub fn item_factors(&self) -> &DMatrix<T> {
        &self.item_factors
    }

    /// Bias terms, if the model has them.
    pub fn biases(&self) -> Option<&Biases<T>> {
        self.biases.as_ref()
    }

    /// Returns `true` for models that carry bias terms.
    pub fn has_biases(&self) -> bool {
        self.biases.is_some()
    }

    /// Mutable access to all parameters at once, for in-place updates.
    pub fn parts_mut(&mut self) -> (&mut DMatrix<T>, &mut DMatrix<T>, Option<&mut Biases<T>>) {
        (
            &mut self.user_factors,
            &mut self.item_factors,
            self.biases.as_mut(),
        )
    }

    /// Returns `true` when no parameter is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        all_finite(&self.user_factors)
            && all_finite(&self.item_factors)
            && self.biases.as_ref().map_or(true, |b| {
                Float::is_finite(b.global)
                    && b.user.iter().all(|v| Float::is_finite(*v))
                    && b.item.iter().all(|v| Float::is_finite(*v))
            })
    }

    /// Predicted rating for one `(user, item)` pair.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if either index is out of range.
    pub fn predict(&self, user: usize, item: usize) -> Result<T> {
        if user >= self.n_users() {
            return Err(MfError::invalid_argument(
                "user",
                format!("index {} out of range for {} users", user, self.n_users()),
            ));
        }
        if item >= self.n_items() {
            return Err(MfError::invalid_argument(
                "item",
                format!("index {} out of range for {} items", item, self.n_items()),
            ));
        }
        Ok(self.score(user, item))
    }

    /// Prediction without bounds checking beyond nalgebra's indexing.
    #[inline]
    pub fn score(&self, user: usize, item: usize) -> T {
        let interaction = self.user_factors.row(user).dot(&self.item_factors.row(item));
        match &self.biases {
            Some(b) => b.global + b.user[user] + b.item[item] + interaction,
            None => interaction,
        }
    }

    /// Dense matrix of predictions for every `(user, item)` pair.
    ///
    /// This costs O(n_users · n_items · F) time and allocates a full
    /// n_users × n_items matrix. It dominates the cost of every
    /// learning-curve checkpoint, so callers evaluating many checkpoints on
    /// large matrices should space them out.
    pub fn predict_all(&self) -> DMatrix<T> {
        let mut predictions = &self.user_factors * self.item_factors.transpose();
        if let Some(b) = &self.biases {
            for u in 0..self.n_users() {
                for i in 0..self.n_items() {
                    predictions[(u, i)] += b.global + b.user[u] + b.item[i];
                }
            }
        }
        predictions
    }
}

fn sample_rows<T, R>(n_rows: usize, n_cols: usize, normal: &Normal<f64>, rng: &mut R) -> DMatrix<T>
where
    T: Scalar,
    R: Rng + ?Sized,
{
    let mut m = DMatrix::zeros(n_rows, n_cols);
    for r in 0..n_rows {
        for c in 0..n_cols {
            m[(r, c)] = <T as Scalar>::from_f64(normal.sample(rng));
        }
    }
    m
}
