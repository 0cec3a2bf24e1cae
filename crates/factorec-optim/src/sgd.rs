//! Stochastic gradient descent with bias terms.
//!
//! Each epoch visits every observed training cell once, in a fresh random
//! order, and applies the regularized gradient step of the squared error of
//! that single cell. Updates are sequential: a sample sees the effect of all
//! samples visited before it in the same epoch.
//!
//! # Update Rule
//!
//! For a sample `(u, i)` with rating `r`, prediction `r̂` and `e = r - r̂`:
//!
//! ```text
//! b_u ← b_u + η (e - λ_bu b_u)
//! b_i ← b_i + η (e - λ_bi b_i)
//! p_u ← p_u + η (e q_i - λ_pu p_u)
//! q_i ← q_i + η (e p_u - λ_qi q_i)      p_u taken before its own update
//! ```

use crate::strategy::{SessionRng, UpdateStrategy};
use factorec_core::{
    config::{check_learning_rate, MfConfig},
    error::{MfError, Result},
    model::FactorModel,
    ratings::RatingsMatrix,
    types::{format_shape, Scalar, Shape},
};
use rand::seq::SliceRandom;

/// SGD update strategy.
///
/// Holds the sample set of the training matrix (its observed cells in
/// row-major order) and the step size and regularization weights.
#[derive(Debug, Clone)]
pub struct SgdStrategy<T: Scalar> {
    learning_rate: T,
    user_fact_reg: T,
    item_fact_reg: T,
    user_bias_reg: T,
    item_bias_reg: T,
    shape: Shape,
    samples: Vec<(usize, usize)>,
    order: Vec<usize>,
}

impl<T: Scalar> SgdStrategy<T> {
    /// Builds the strategy for `ratings` with the hyperparameters of `config`.
    pub fn from_config(config: &MfConfig<T>, ratings: &RatingsMatrix<T>) -> Self {
        let samples = ratings.observed_entries();
        Self {
            learning_rate: config.learning_rate,
            user_fact_reg: config.user_fact_reg,
            item_fact_reg: config.item_fact_reg,
            user_bias_reg: config.user_bias_reg,
            item_bias_reg: config.item_bias_reg,
            shape: ratings.shape(),
            order: (0..samples.len()).collect(),
            samples,
        }
    }

    /// Current step size.
    pub fn learning_rate(&self) -> T {
        self.learning_rate
    }

    /// Replaces the step size.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` unless the rate is finite and positive.
    pub fn set_learning_rate(&mut self, learning_rate: T) -> Result<()> {
        check_learning_rate(learning_rate)?;
        self.learning_rate = learning_rate;
        Ok(())
    }

    /// Observed training cells, row-major.
    pub fn samples(&self) -> &[(usize, usize)] {
        &self.samples
    }

    /// Visiting order of the last epoch, as indices into [`samples`](Self::samples).
    pub fn last_order(&self) -> &[usize] {
        &self.order
    }

    /// Applies the update of a single sample and returns its pre-update error.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the model has no bias terms.
    pub fn update_sample(
        &self,
        model: &mut FactorModel<T>,
        user: usize,
        item: usize,
        rating: T,
    ) -> Result<T> {
        let lr = self.learning_rate;
        let err = rating - model.score(user, item);

        let (users, items, biases) = model.parts_mut();
        let biases = biases.ok_or_else(|| {
            MfError::invalid_argument("model", "SGD updates need a model with bias terms")
        })?;

        let b_u = biases.user[user];
        let b_i = biases.item[item];
        biases.user[user] = b_u + lr * (err - self.user_bias_reg * b_u);
        biases.item[item] = b_i + lr * (err - self.item_bias_reg * b_i);

        // `p_old` is read before the user row is written, and the item update
        // uses it rather than the freshly updated user value.
        for f in 0..users.ncols() {
            let p_old = users[(user, f)];
            let q_old = items[(item, f)];
            users[(user, f)] = p_old + lr * (err * q_old - self.user_fact_reg * p_old);
            items[(item, f)] = q_old + lr * (err * p_old - self.item_fact_reg * q_old);
        }

        Ok(err)
    }
}

impl<T: Scalar> UpdateStrategy<T> for SgdStrategy<T> {
    fn name(&self) -> &'static str {
        "sgd"
    }

    fn uses_biases(&self) -> bool {
        true
    }

    fn step(
        &mut self,
        model: &mut FactorModel<T>,
        ratings: &RatingsMatrix<T>,
        rng: &mut SessionRng,
    ) -> Result<()> {
        if ratings.shape() != self.shape {
            return Err(MfError::dimension_mismatch(
                format_shape(self.shape),
                format_shape(ratings.shape()),
            ));
        }
        let model_shape = (model.n_users(), model.n_items());
        if model_shape != self.shape {
            return Err(MfError::dimension_mismatch(
                format_shape(self.shape),
                format_shape(model_shape),
            ));
        }
        if !model.has_biases() {
            return Err(MfError::invalid_argument(
                "model",
                "SGD updates need a model with bias terms",
            ));
        }

        // Fresh permutation of the canonical order every epoch.
        for (k, slot) in self.order.iter_mut().enumerate() {
            *slot = k;
        }
        self.order.shuffle(rng);

        for &idx in &self.order {
            let (u, i) = self.samples[idx];
            self.update_sample(model, u, i, ratings.get(u, i))?;
        }
        Ok(())
    }
}
