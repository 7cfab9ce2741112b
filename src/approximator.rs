//! The learned scoring function the agent consults and trains.
//!
//! The agent only ever sees [`QFunction`]; the sequential network below is the
//! production implementation, tests substitute their own.

use thiserror::Error;

use crate::game::{FeatureVector, FEATURES};
use crate::sequential::Sequential;
use crate::sequential::layer::Dense;
use crate::sequential::tensor::Tensor;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApproximatorError {
    #[error("expected {expected} features, got {found}")]
    FeatureLength { expected: usize, found: usize },
    #[error("update called with an empty batch")]
    EmptyBatch,
    #[error("non-finite training target {0}")]
    NonFiniteTarget(f32),
    #[error("approximator produced a non-finite output")]
    NonFiniteOutput,
}

/// Quality estimate for a featurized state.
pub trait QFunction {
    fn predict(&mut self, features: &[f32]) -> Result<f32, ApproximatorError>;

    /// One optimizer step towards the targets of the whole batch.
    fn update(&mut self, batch: &[(FeatureVector, f32)]) -> Result<(), ApproximatorError>;
}

pub const DEFAULT_HIDDEN: [usize; 2] = [32, 20];
pub const DEFAULT_LEARNING_RATE: f32 = 0.001;

impl QFunction for Sequential {
    fn predict(&mut self, features: &[f32]) -> Result<f32, ApproximatorError> {
        let expected = self.input_size().unwrap_or(FEATURES);
        if features.len() != expected {
            return Err(ApproximatorError::FeatureLength { expected, found: features.len() });
        }

        let output = Sequential::predict(self, &Tensor::from_vec(features.to_vec(), vec![1, expected]));
        let score = output.read()[0];
        if !score.is_finite() {
            return Err(ApproximatorError::NonFiniteOutput);
        }
        Ok(score)
    }

    fn update(&mut self, batch: &[(FeatureVector, f32)]) -> Result<(), ApproximatorError> {
        if batch.is_empty() {
            return Err(ApproximatorError::EmptyBatch);
        }
        let expected = self.input_size().unwrap_or(FEATURES);
        if expected != FEATURES {
            return Err(ApproximatorError::FeatureLength { expected, found: FEATURES });
        }
        if let Some(&(_, target)) = batch.iter().find(|(_, target)| !target.is_finite()) {
            return Err(ApproximatorError::NonFiniteTarget(target));
        }

        let rows: Vec<&[f32]> = batch.iter().map(|(features, _)| features.as_slice()).collect();
        let x = Tensor::from_rows(&rows);
        let y = Tensor::from_vec(batch.iter().map(|&(_, target)| target).collect(), vec![batch.len(), 1]);

        self.train_on_batch(&x, &y);

        if self.layers.iter().any(|layer| {
            layer
                .as_any()
                .downcast_ref::<Dense>()
                .is_some_and(|dense| !dense.weights.all_finite())
        }) {
            return Err(ApproximatorError::NonFiniteOutput);
        }
        Ok(())
    }
}
