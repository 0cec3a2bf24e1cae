//! Learning curves.

use factorec_core::types::Scalar;
use std::io::{self, Write};

/// Train and test MSE recorded at increasing iteration counts.
///
/// The three sequences always have the same length, and the checkpoints are
/// strictly ascending.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LearningCurve<T: Scalar> {
    checkpoints: Vec<usize>,
    train_mse: Vec<T>,
    test_mse: Vec<T>,
}

impl<T: Scalar> LearningCurve<T> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            checkpoints: Vec::with_capacity(capacity),
            train_mse: Vec::with_capacity(capacity),
            test_mse: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, iterations: usize, train_mse: T, test_mse: T) {
        debug_assert!(self.checkpoints.last().map_or(true, |&last| last < iterations));
        self.checkpoints.push(iterations);
        self.train_mse.push(train_mse);
        self.test_mse.push(test_mse);
    }

    /// Iteration counts at which the model was evaluated.
    pub fn checkpoints(&self) -> &[usize] {
        &self.checkpoints
    }

    /// Training MSE per checkpoint.
    pub fn train_mse(&self) -> &[T] {
        &self.train_mse
    }

    /// Test MSE per checkpoint.
    pub fn test_mse(&self) -> &[T] {
        &self.test_mse
    }

    /// Number of checkpoints.
    pub fn len(&self) -> usize {
        self.checkpoints.len()
    }

    /// Returns `true` if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.checkpoints.is_empty()
    }

    /// `(iterations, train_mse, test_mse)` rows in checkpoint order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, T, T)> + '_ {
        self.checkpoints
            .iter()
            .zip(&self.train_mse)
            .zip(&self.test_mse)
            .map(|((&n, &train), &test)| (n, train, test))
    }

    /// Row with the smallest test MSE, the earliest one on ties.
    pub fn best_checkpoint(&self) -> Option<(usize, T, T)> {
        let mut best: Option<(usize, T, T)> = None;
        for row in self.iter() {
            match best {
                Some((_, _, current)) if !(row.2 < current) => {}
                _ => best = Some(row),
            }
        }
        best
    }

    /// Checkpoint with the smallest test MSE, the earliest one on ties.
    pub fn best_test(&self) -> Option<(usize, T)> {
        self.best_checkpoint().map(|(n, _, test)| (n, test))
    }

    /// Writes the curve as CSV with an `iterations,train_mse,test_mse` header.
    pub fn write_csv<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writeln!(writer, "iterations,train_mse,test_mse")?;
        for (n, train, test) in self.iter() {
            writeln!(writer, "{},{},{}", n, train, test)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn curve() -> LearningCurve<f64> {
        let mut c = LearningCurve::with_capacity(4);
        c.push(1, 2.0, 2.5);
        c.push(5, 1.0, 1.5);
        c.push(10, 0.5, 1.5);
        c.push(25, 0.25, 1.75);
        c
    }

    #[test]
    fn test_best_test_prefers_earliest() {
        assert_eq!(curve().best_test(), Some((5, 1.5)));
        assert_eq!(curve().best_checkpoint(), Some((5, 1.0, 1.5)));
        assert_eq!(LearningCurve::<f64>::with_capacity(0).best_test(), None);
    }

    #[test]
    fn test_write_csv() {
        let mut out = Vec::new();
        curve().write_csv(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "iterations,train_mse,test_mse\n1,2,2.5\n5,1,1.5\n10,0.5,1.5\n25,0.25,1.75\n"
        );
    }

    #[test]
    fn test_sequences_have_equal_length() {
        let c = curve();
        assert_eq!(c.len(), 4);
        assert_eq!(c.checkpoints(), &[1, 5, 10, 25]);
        assert_eq!(c.train_mse().len(), c.test_mse().len());
        assert!(!c.is_empty());
    }
}
