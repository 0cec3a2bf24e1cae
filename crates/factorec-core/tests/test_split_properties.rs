//! Property tests for the train/test splitter.

use factorec_core::{error::MfError, ratings::RatingsMatrix, split::Splitter, types::DMatrix};
use proptest::prelude::*;

/// Matrices whose rows each hold at least `min_per_row` nonzero ratings.
fn ratings_with_min_row(min_per_row: usize) -> impl Strategy<Value = RatingsMatrix<f64>> {
    (1usize..8, min_per_row.max(1)..16).prop_flat_map(move |(n_users, n_items)| {
        prop::collection::vec(prop::option::weighted(0.6, 1u8..=5), n_users * n_items).prop_map(
            move |cells| {
                let mut values = DMatrix::<f64>::zeros(n_users, n_items);
                for u in 0..n_users {
                    for i in 0..n_items {
                        // The first `min_per_row` cells of each row are always rated.
                        let cell = cells[u * n_items + i].or(if i < min_per_row { Some(3) } else { None });
                        if let Some(r) = cell {
                            values[(u, i)] = f64::from(r);
                        }
                    }
                }
                RatingsMatrix::new(values).unwrap()
            },
        )
    })
}

proptest! {
    #[test]
    fn split_is_disjoint_and_complete(
        ratings in ratings_with_min_row(3),
        k in 1usize..=3,
        seed in any::<u64>(),
    ) {
        let split = Splitter::new(k).with_seed(seed).split(&ratings).unwrap();

        prop_assert!(split.is_disjoint());
        let sum = split.train().as_matrix() + split.test().as_matrix();
        prop_assert_eq!(&sum, ratings.as_matrix());
        for u in 0..ratings.n_users() {
            prop_assert_eq!(split.test().user_observed(u).len(), k);
            prop_assert_eq!(
                split.train().user_observed(u).len(),
                ratings.user_observed(u).len() - k
            );
        }
    }

    #[test]
    fn short_rows_fail_whatever_the_seed(
        ratings in ratings_with_min_row(1),
        seed in any::<u64>(),
    ) {
        let longest = (0..ratings.n_users())
            .map(|u| ratings.user_observed(u).len())
            .max()
            .unwrap_or(0);
        let err = Splitter::new(longest + 1).with_seed(seed).split(&ratings).unwrap_err();
        let is_insufficient = matches!(err, MfError::InsufficientObservations { user: 0, .. });
        prop_assert!(is_insufficient);
    }
}
