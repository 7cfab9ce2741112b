use super::layer::{Layer, Dense};
use super::tensor::Tensor;

pub trait Optimizer: Send {
    fn step(&mut self, layers: &mut [Box<dyn Layer>]);
}


// SGD

#[derive(Clone)]
pub struct SGD {
    learning_rate: f32
}

impl SGD {
    pub fn new(learning_rate: f32) -> Self {
        Self {
            learning_rate
        }
    }
}

impl Optimizer for SGD {
    fn step(&mut self, layers: &mut [Box<dyn Layer>]) {
        let lr = self.learning_rate;
        for layer in layers {
            let Some(dense) = layer.as_any_mut().downcast_mut::<Dense>() else {
                continue;
            };
            if let (Some(d_weights), Some(d_biases)) = (&dense.d_weights, &dense.d_biases) {
                let weights = dense.weights.map2(d_weights, |w, dw| w - lr * dw);
                let biases = dense.biases.map2(d_biases, |b, db| b - lr * db);
                dense.weights = weights;
                dense.biases = biases;
            }
        }
    }
}


// RMSProp: per-parameter step scaled by a running average of squared gradients

pub struct RmsProp {
    learning_rate: f32,
    decay: f32,
    epsilon: f32,
    mean_squares: Vec<Option<(Tensor, Tensor)>> // (weights, biases) per layer index
}

impl RmsProp {
    pub fn new(learning_rate: f32) -> Self {
        Self {
            learning_rate,
            decay: 0.9,
            epsilon: 1e-8,
            mean_squares: Vec::new()
        }
    }

    fn scaled_step(&self, param: &Tensor, grad: &Tensor, mean_square: &Tensor) -> (Tensor, Tensor) {
        let (lr, decay, eps) = (self.learning_rate, self.decay, self.epsilon);
        let updated_ms = mean_square.map2(grad, |ms, g| decay * ms + (1.0 - decay) * g * g);
        let step = grad.map2(&updated_ms, |g, ms| lr * g / (ms.sqrt() + eps));
        (param.map2(&step, |p, s| p - s), updated_ms)
    }
}

impl Optimizer for RmsProp {
    fn step(&mut self, layers: &mut [Box<dyn Layer>]) {
        if self.mean_squares.len() < layers.len() {
            self.mean_squares.resize_with(layers.len(), || None);
        }

        for (idx, layer) in layers.iter_mut().enumerate() {
            let Some(dense) = layer.as_any_mut().downcast_mut::<Dense>() else {
                continue;
            };
            let (Some(d_weights), Some(d_biases)) = (&dense.d_weights, &dense.d_biases) else {
                continue;
            };

            let (ms_weights, ms_biases) = self.mean_squares[idx].take().unwrap_or_else(|| {
                (Tensor::zeros(dense.weights.shape.clone()), Tensor::zeros(dense.biases.shape.clone()))
            });

            let (weights, ms_weights) = self.scaled_step(&dense.weights, d_weights, &ms_weights);
            let (biases, ms_biases) = self.scaled_step(&dense.biases, d_biases, &ms_biases);

            dense.weights = weights;
            dense.biases = biases;
            self.mean_squares[idx] = Some((ms_weights, ms_biases));
        }
    }
}
