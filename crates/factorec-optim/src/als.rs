//! Alternating least squares without bias terms.
//!
//! One ALS iteration holds the item factors fixed and solves every user's
//! factor vector in closed form, then holds the new user factors fixed and
//! solves every item's vector the same way. Each half-step is the exact
//! minimizer of the regularized squared reconstruction error of the dense
//! ratings matrix (unobserved cells count as zero ratings):
//!
//! ```text
//! users:  (VᵀV + λ_u I) p_u = Vᵀ r_u       for every user row r_u
//! items:  (UᵀU + λ_i I) q_i = Uᵀ r_i       for every item column r_i
//! ```
//!
//! All solves of a half-step share one Gram matrix, so it is factorized once
//! (Cholesky) and reused for every right-hand side.

use crate::strategy::{SessionRng, UpdateStrategy};
use factorec_core::{
    config::MfConfig,
    error::{MfError, Result},
    model::FactorModel,
    ratings::RatingsMatrix,
    types::{all_finite, format_shape, DMatrix, Scalar},
};
use num_traits::Float;

/// ALS update strategy.
#[derive(Debug, Clone)]
pub struct AlsStrategy<T: Scalar> {
    user_fact_reg: T,
    item_fact_reg: T,
}

impl<T: Scalar> AlsStrategy<T> {
    /// Builds the strategy with the factor regularization of `config`.
    pub fn from_config(config: &MfConfig<T>) -> Self {
        Self::new(config.user_fact_reg, config.item_fact_reg)
    }

    /// Creates the strategy from explicit regularization weights.
    pub fn new(user_fact_reg: T, item_fact_reg: T) -> Self {
        Self {
            user_fact_reg,
            item_fact_reg,
        }
    }
}

/// Solves `(FᵀF + λI) X = rhs` for all columns of `rhs` and returns `Xᵀ`.
///
/// `fixed` is `n_fixed × k` and `rhs` is `k × n_solved`; the result is
/// `n_solved × k`, one solved factor vector per row.
fn solve_half_step<T: Scalar>(
    fixed: &DMatrix<T>,
    rhs: &DMatrix<T>,
    lambda: T,
    side: &str,
) -> Result<DMatrix<T>> {
    let k = fixed.ncols();
    let gram = fixed.transpose() * fixed + DMatrix::<T>::identity(k, k) * lambda;
    let singular = || {
        MfError::numerical_error(format!(
            "{} normal equations are singular (regularization {})",
            side, lambda
        ))
    };
    let cholesky = gram.cholesky().ok_or_else(singular)?;

    // Squared Cholesky pivots are the Schur complements; a pivot at rounding
    // level relative to the largest one means the Gram matrix is rank deficient.
    let (min_pivot, max_pivot) = cholesky.l_dirty().diagonal().iter().fold(
        (<T as Float>::max_value(), T::zero()),
        |(lo, hi), l| {
            let p = *l * *l;
            (if p < lo { p } else { lo }, if p > hi { p } else { hi })
        },
    );
    let tolerance = max_pivot * <T as Scalar>::EPSILON * <T as Scalar>::from_usize(k);
    if !(min_pivot > tolerance) {
        return Err(singular());
    }

    let solved = cholesky.solve(rhs);
    if !all_finite(&solved) {
        return Err(singular());
    }
    Ok(solved.transpose())
}

impl<T: Scalar> UpdateStrategy<T> for AlsStrategy<T> {
    fn name(&self) -> &'static str {
        "als"
    }

    fn uses_biases(&self) -> bool {
        false
    }

    fn step(
        &mut self,
        model: &mut FactorModel<T>,
        ratings: &RatingsMatrix<T>,
        _rng: &mut SessionRng,
    ) -> Result<()> {
        let model_shape = (model.n_users(), model.n_items());
        if ratings.shape() != model_shape {
            return Err(MfError::dimension_mismatch(
                format_shape(model_shape),
                format_shape(ratings.shape()),
            ));
        }

        let r = ratings.as_matrix();
        let (users, items, _) = model.parts_mut();

        // Vᵀ Rᵀ holds Vᵀ r_u in column u.
        let user_rhs = items.transpose() * r.transpose();
        *users = solve_half_step(items, &user_rhs, self.user_fact_reg, "user")?;

        // Uᵀ R holds Uᵀ r_i in column i.
        let item_rhs = users.transpose() * r;
        *items = solve_half_step(users, &item_rhs, self.item_fact_reg, "item")?;

        Ok(())
    }
}
