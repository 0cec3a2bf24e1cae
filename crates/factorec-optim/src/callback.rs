//! Callback support for training sessions.
//!
//! Callbacks observe a training run without being able to alter the model:
//! they are told when a run starts, after every update round, and after
//! every learning-curve checkpoint has been evaluated. Returning an error
//! from a callback aborts the run and the error is propagated to the caller.

use factorec_core::{config::LearningStrategy, error::Result, types::Scalar};
use std::time::Duration;

/// Information about a finished update round.
#[derive(Clone, Debug)]
pub struct IterationInfo {
    /// Strategy that performed the round
    pub strategy: LearningStrategy,

    /// Total rounds performed on the current model, this one included
    pub iteration: usize,

    /// Wall time spent in this round
    pub elapsed: Duration,
}

/// Information about an evaluated learning-curve checkpoint.
#[derive(Clone, Debug)]
pub struct CheckpointInfo<T: Scalar> {
    /// Iteration count of the checkpoint
    pub iterations: usize,

    /// Masked MSE against the training reference
    pub train_mse: T,

    /// Masked MSE against the test reference
    pub test_mse: T,
}

/// Trait for training callbacks.
///
/// All methods have no-op defaults.
pub trait TrainingCallback<T: Scalar>: Send {
    /// Called when a `train` or `continue_training` call starts.
    fn on_train_start(&mut self, strategy: LearningStrategy, n_iterations: usize) -> Result<()> {
        let _ = (strategy, n_iterations);
        Ok(())
    }

    /// Called after each update round.
    fn on_iteration_end(&mut self, info: &IterationInfo) -> Result<()> {
        let _ = info;
        Ok(())
    }

    /// Called after a learning-curve checkpoint has been evaluated.
    fn on_checkpoint(&mut self, info: &CheckpointInfo<T>) -> Result<()> {
        let _ = info;
        Ok(())
    }
}

/// A callback that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpCallback;

impl<T: Scalar> TrainingCallback<T> for NoOpCallback {}

/// A callback that reports progress through `tracing`.
///
/// Emits an `info` event every `every` iterations and at each checkpoint,
/// and a `debug` event for every other round.
#[derive(Debug, Clone, Copy)]
pub struct TracingProgressCallback {
    every: usize,
}

impl TracingProgressCallback {
    /// Create a progress callback reporting every `every` iterations.
    ///
    /// A value of zero is treated as one.
    pub fn new(every: usize) -> Self {
        Self {
            every: every.max(1),
        }
    }

    /// Reporting interval.
    pub fn every(&self) -> usize {
        self.every
    }
}

impl<T: Scalar> TrainingCallback<T> for TracingProgressCallback {
    fn on_train_start(&mut self, strategy: LearningStrategy, n_iterations: usize) -> Result<()> {
        tracing::debug!(%strategy, n_iterations, "training started");
        Ok(())
    }

    fn on_iteration_end(&mut self, info: &IterationInfo) -> Result<()> {
        if info.iteration % self.every == 0 {
            tracing::info!(
                strategy = %info.strategy,
                iteration = info.iteration,
                elapsed_us = info.elapsed.as_micros() as u64,
                "current iteration: {}",
                info.iteration
            );
        } else {
            tracing::debug!(strategy = %info.strategy, iteration = info.iteration, "round done");
        }
        Ok(())
    }

    fn on_checkpoint(&mut self, info: &CheckpointInfo<T>) -> Result<()> {
        tracing::info!(
            iterations = info.iterations,
            train_mse = %info.train_mse,
            test_mse = %info.test_mse,
            "checkpoint evaluated"
        );
        Ok(())
    }
}

/// Records every event, for tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingCallback {
    pub starts: Vec<(LearningStrategy, usize)>,
    pub iterations: Vec<usize>,
    pub checkpoints: Vec<usize>,
}

#[cfg(test)]
impl<T: Scalar> TrainingCallback<T> for RecordingCallback {
    fn on_train_start(&mut self, strategy: LearningStrategy, n_iterations: usize) -> Result<()> {
        self.starts.push((strategy, n_iterations));
        Ok(())
    }

    fn on_iteration_end(&mut self, info: &IterationInfo) -> Result<()> {
        self.iterations.push(info.iteration);
        Ok(())
    }

    fn on_checkpoint(&mut self, info: &CheckpointInfo<T>) -> Result<()> {
        self.checkpoints.push(info.iterations);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_interval_is_at_least_one() {
        assert_eq!(TracingProgressCallback::new(0).every(), 1);
        assert_eq!(TracingProgressCallback::new(10).every(), 10);
    }

    #[test]
    fn test_default_methods_succeed() {
        let mut cb = NoOpCallback;
        let info = IterationInfo {
            strategy: LearningStrategy::Sgd,
            iteration: 3,
            elapsed: Duration::from_millis(1),
        };
        assert!(TrainingCallback::<f64>::on_iteration_end(&mut cb, &info).is_ok());
        assert!(TrainingCallback::<f64>::on_train_start(&mut cb, LearningStrategy::Als, 5).is_ok());
        let checkpoint = CheckpointInfo { iterations: 5, train_mse: 0.5f64, test_mse: 0.7 };
        assert!(cb.on_checkpoint(&checkpoint).is_ok());
    }
}
