//! Per-user train/test splitting of observed ratings.
//!
//! For every user a fixed number of observed ratings is moved out of the
//! training matrix into a test matrix of the same shape. The two halves are
//! disjoint: no cell is nonzero in both.

use crate::{
    error::{MfError, Result},
    ratings::RatingsMatrix,
    types::{constants::DEFAULT_HOLDOUT_PER_USER, Scalar},
};
use rand::{rngs::StdRng, seq::index, Rng, SeedableRng};

/// Disjoint train/test halves of a ratings matrix.
#[derive(Debug, Clone)]
pub struct Split<T: Scalar> {
    train: RatingsMatrix<T>,
    test: RatingsMatrix<T>,
    holdout_per_user: usize,
}

impl<T: Scalar> Split<T> {
    /// Training half.
    pub fn train(&self) -> &RatingsMatrix<T> {
        &self.train
    }

    /// Held-out half.
    pub fn test(&self) -> &RatingsMatrix<T> {
        &self.test
    }

    /// Number of ratings moved to the test half for each user.
    pub fn holdout_per_user(&self) -> usize {
        self.holdout_per_user
    }

    /// Returns `true` when no cell is observed in both halves.
    pub fn is_disjoint(&self) -> bool {
        self.train
            .as_matrix()
            .iter()
            .zip(self.test.as_matrix().iter())
            .all(|(a, b)| *a * *b == T::zero())
    }

    /// Splits into `(train, test)`.
    pub fn into_parts(self) -> (RatingsMatrix<T>, RatingsMatrix<T>) {
        (self.train, self.test)
    }
}

/// Seeded splitter holding out a fixed number of ratings per user.
///
/// # Examples
///
/// ```rust
/// use factorec_core::{ratings::RatingsMatrix, split::Splitter};
/// use nalgebra::DMatrix;
///
/// let ratings = RatingsMatrix::new(DMatrix::from_row_slice(2, 3, &[
///     1.0, 2.0, 3.0,
///     4.0, 0.0, 5.0,
/// ])).unwrap();
///
/// let split = Splitter::new(1).with_seed(7).split(&ratings).unwrap();
/// assert!(split.is_disjoint());
/// assert_eq!(split.test().nnz(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct Splitter {
    holdout_per_user: usize,
    seed: u64,
}

impl Default for Splitter {
    fn default() -> Self {
        Self {
            holdout_per_user: DEFAULT_HOLDOUT_PER_USER,
            seed: 0,
        }
    }
}

impl Splitter {
    /// Creates a splitter holding out `holdout_per_user` ratings per user.
    pub fn new(holdout_per_user: usize) -> Self {
        Self {
            holdout_per_user,
            ..Self::default()
        }
    }

    /// Sets the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Number of ratings held out per user.
    pub fn holdout_per_user(&self) -> usize {
        self.holdout_per_user
    }

    /// Splits `ratings`, drawing holdout cells from a `StdRng` seeded with
    /// the configured seed.
    pub fn split<T: Scalar>(&self, ratings: &RatingsMatrix<T>) -> Result<Split<T>> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        train_test_split(ratings, self.holdout_per_user, &mut rng)
    }
}

/// Moves `holdout_per_user` uniformly sampled observed ratings of every user
/// into a test matrix.
///
/// Users are visited in index order and each user's holdout is sampled
/// without replacement from its observed items, so the result is a pure
/// function of the input and the RNG state.
///
/// # Errors
///
/// - `InvalidArgument` if `holdout_per_user` is zero.
/// - `InsufficientObservations` for the first user with fewer observed
///   ratings than `holdout_per_user`.
pub fn train_test_split<T, R>(
    ratings: &RatingsMatrix<T>,
    holdout_per_user: usize,
    rng: &mut R,
) -> Result<Split<T>>
where
    T: Scalar,
    R: Rng + ?Sized,
{
    if holdout_per_user == 0 {
        return Err(MfError::invalid_argument(
            "holdout_per_user",
            "must be at least 1",
        ));
    }

    // Check every row before drawing so a failure does not depend on RNG state.
    let observed: Vec<Vec<usize>> = (0..ratings.n_users())
        .map(|u| ratings.user_observed(u))
        .collect();
    if let Some((user, items)) = observed
        .iter()
        .enumerate()
        .find(|(_, items)| items.len() < holdout_per_user)
    {
        return Err(MfError::insufficient_observations(
            user,
            items.len(),
            holdout_per_user,
        ));
    }

    let (n_users, n_items) = ratings.shape();
    let mut train = ratings.clone();
    let mut test = RatingsMatrix::zeros(n_users, n_items);

    for (user, items) in observed.iter().enumerate() {
        for pos in index::sample(&mut *rng, items.len(), holdout_per_user) {
            let item = items[pos];
            test.set(user, item, ratings.get(user, item));
            train.set(user, item, T::zero());
        }
    }

    let split = Split {
        train,
        test,
        holdout_per_user,
    };
    assert!(split.is_disjoint(), "train and test halves overlap");
    Ok(split)
}
