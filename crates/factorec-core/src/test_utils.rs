//! Synthetic ratings for tests, examples and benchmarks.

use crate::{ratings::RatingsMatrix, types::{DMatrix, Scalar}};
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

/// Generates an exactly low-rank, fully observed ratings matrix.
///
/// Entries are `offset + ⟨a_u, b_i⟩` with factor entries drawn from
/// `Normal(0, scale)`. With `offset` well above the spread of the dot
/// products no entry is zero, so every cell is observed.
pub fn low_rank_ratings<T: Scalar>(
    n_users: usize,
    n_items: usize,
    rank: usize,
    offset: f64,
    scale: f64,
    seed: u64,
) -> RatingsMatrix<T> {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, scale).expect("scale must be finite and non-negative");
    let a = DMatrix::<f64>::from_fn(n_users, rank, |_, _| normal.sample(&mut rng));
    let b = DMatrix::<f64>::from_fn(n_items, rank, |_, _| normal.sample(&mut rng));
    let product = &a * b.transpose();
    let values = DMatrix::from_fn(n_users, n_items, |u, i| {
        let v = offset + product[(u, i)];
        assert!(v != 0.0, "synthetic rating landed on zero");
        <T as Scalar>::from_f64(v)
    });
    RatingsMatrix::new(values).expect("synthetic ratings are finite")
}

/// Masks a ratings matrix, keeping each observed cell with probability
/// `keep`, except that `min_per_user` randomly chosen cells of every user
/// (or all of them, if the user has fewer) are always kept.
pub fn sparsify<T: Scalar>(
    ratings: &RatingsMatrix<T>,
    keep: f64,
    min_per_user: usize,
    seed: u64,
) -> RatingsMatrix<T> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut values = ratings.as_matrix().clone();
    for u in 0..ratings.n_users() {
        let mut observed = ratings.user_observed(u);
        observed.shuffle(&mut rng);
        for (k, &i) in observed.iter().enumerate() {
            if k >= min_per_user && !rng.gen_bool(keep) {
                values[(u, i)] = T::zero();
            }
        }
    }
    RatingsMatrix::new(values).expect("masked ratings are finite")
}
