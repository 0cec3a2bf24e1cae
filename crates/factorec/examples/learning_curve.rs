//! Learning curves of SGD and ALS on synthetic ratings.
//!
//! Generates a sparse low-rank ratings matrix (or loads a `u.data` style file
//! given as the first argument), holds out 10 ratings per user, and prints
//! the train/test MSE learning curve of both strategies as CSV.
//!
//! Run with: cargo run --example learning_curve [path/to/u.data]
//! Set `RUST_LOG=debug` for per-iteration progress.

use factorec::prelude::*;
use factorec_core::test_utils::{low_rank_ratings, sparsify};
use std::error::Error;
use tracing_subscriber::EnvFilter;

fn main() -> std::result::Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let ratings: RatingsMatrix<f64> = match std::env::args().nth(1) {
        Some(path) => load_ratings(path)?,
        None => sparsify(&low_rank_ratings(300, 400, 8, 3.5, 0.4, 7), 0.06, 20, 7),
    };
    tracing::info!(summary = %DatasetSummary::of(&ratings), "dataset ready");

    let split = Splitter::new(10).with_seed(42).split(&ratings)?;
    let checkpoints = [1, 2, 5, 10, 25, 50, 100];

    let runs = [
        (
            "als",
            MfConfig::new()
                .with_strategy(LearningStrategy::Als)
                .with_n_factors(20)
                .with_regularization(0.01),
        ),
        (
            "sgd",
            MfConfig::new()
                .with_n_factors(40)
                .with_learning_rate(0.001)
                .with_verbose(true),
        ),
    ];

    let stdout = std::io::stdout();
    for (name, config) in runs {
        let trainer = Trainer::new(config)?;
        let mut session = trainer.session(split.train())?;
        let curve = trainer.learning_curve(&mut session, &checkpoints, split.train(), split.test(), None)?;

        println!("# {}", name);
        curve.write_csv(stdout.lock())?;
        if let Some((iterations, test_mse)) = curve.best_test() {
            tracing::info!(strategy = name, iterations, test_mse, "best checkpoint");
        }
    }
    Ok(())
}
