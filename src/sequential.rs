pub mod tensor;
pub mod layer;
pub mod loss;
pub mod optimizer;

use tensor::Tensor;
use layer::{Layer, Dense, ReLU};
use loss::{Loss, MeanSquaredError};
use optimizer::{Optimizer, RmsProp};

use rand::Rng;

pub struct Sequential {
    pub layers: Vec<Box<dyn Layer>>,
    pub loss: Box<dyn Loss>,
    pub optimizer: Box<dyn Optimizer>
}

impl Sequential {
    pub fn new(layers: Vec<Box<dyn Layer>>, loss: Box<dyn Loss>, optimizer: Box<dyn Optimizer>) -> Self {
        Self {
            layers,
            loss,
            optimizer
        }
    }

    /// Scalar value network: `inputs -> hidden.. (ReLU) -> 1`, MSE loss, RMSProp.
    pub fn value_network<R: Rng>(inputs: usize, hidden: &[usize], learning_rate: f32, rng: &mut R) -> Self {
        let mut layers: Vec<Box<dyn Layer>> = Vec::with_capacity(hidden.len() * 2 + 1);
        let mut width = inputs;
        for &size in hidden {
            layers.push(Box::new(Dense::new(width, size, rng)));
            layers.push(Box::new(ReLU::new()));
            width = size;
        }
        layers.push(Box::new(Dense::new(width, 1, rng)));

        Self::new(layers, Box::new(MeanSquaredError), Box::new(RmsProp::new(learning_rate)))
    }

    pub fn input_size(&self) -> Option<usize> {
        self.layers
            .iter()
            .find_map(|layer| layer.as_any().downcast_ref::<Dense>())
            .map(Dense::input_size)
    }

    pub fn predict(&mut self, input: &Tensor) -> Tensor {
        let mut output = input.clone();
        for layer in &mut self.layers {
            output = layer.forward(&output);
        }
        output
    }

    // one optimizer step on the batch, returns the loss before the step
    pub fn train_on_batch(&mut self, x_batch: &Tensor, y_batch: &Tensor) -> f32 {
        let y_pred = self.predict(x_batch);
        let loss = self.loss.calculate(&y_pred, y_batch);

        let mut d_output = self.loss.gradient(&y_pred, y_batch);
        for layer in self.layers.iter_mut().rev() {
            d_output = layer.backward(&d_output);
        }
        self.optimizer.step(&mut self.layers);

        loss
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequential::optimizer::SGD;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn linear_model() -> Sequential {
        let dense = Dense::from_parts(
            Tensor::from_vec(vec![0.5, -0.5], vec![2, 1]),
            Tensor::from_vec(vec![0.1], vec![1, 1]),
        );
        Sequential::new(vec![Box::new(dense)], Box::new(MeanSquaredError), Box::new(SGD::new(0.1)))
    }

    #[test]
    fn test_value_network_shape() {
        let mut model = Sequential::value_network(11, &[32, 20], 0.001, &mut StdRng::seed_from_u64(1));

        assert_eq!(model.layers.len(), 5);
        assert_eq!(model.input_size(), Some(11));

        let output = model.predict(&Tensor::from_vec(vec![1.0; 11], vec![1, 11]));
        assert_eq!(output.shape, vec![1, 1]);
    }

    #[test]
    fn test_train_on_batch() {
        let mut model = linear_model();
        let x = Tensor::from_vec(vec![1.0, 2.0], vec![1, 2]);
        let y = Tensor::from_vec(vec![1.0], vec![1, 1]);

        // prediction 0.5 - 1.0 + 0.1 = -0.4, loss 1.96
        let loss = model.train_on_batch(&x, &y);
        assert!((loss - 1.96).abs() < 1e-5);

        // d = 2 * (-1.4) = -2.8; w -= 0.1 * x * d, b -= 0.1 * d
        let dense = model.layers[0].as_any().downcast_ref::<Dense>().unwrap();
        let weights = dense.weights.read();
        assert!((weights[0] - 0.78).abs() < 1e-5);
        assert!((weights[1] - 0.06).abs() < 1e-5);
        assert!((dense.biases.read()[0] - 0.38).abs() < 1e-5);
    }

    #[test]
    fn test_repeated_updates_reduce_loss() {
        let mut model = Sequential::value_network(3, &[8], 0.01, &mut StdRng::seed_from_u64(9));
        let x = Tensor::from_vec(vec![1.0, 0.0, 1.0, 0.0, 1.0, 0.0], vec![2, 3]);
        let y = Tensor::from_vec(vec![5.0, -5.0], vec![2, 1]);

        let first = model.train_on_batch(&x, &y);
        let mut last = first;
        for _ in 0..300 {
            last = model.train_on_batch(&x, &y);
        }

        assert!(last < first, "loss went from {} to {}", first, last);
    }
}
