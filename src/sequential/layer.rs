use super::tensor::Tensor;
use rand::Rng;
use std::any::Any;

pub trait Layer: Send {
    fn forward(&mut self, input: &Tensor) -> Tensor;
    fn backward(&mut self, d_output: &Tensor) -> Tensor;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn as_any(&self) -> &dyn Any;
}


// dense layer

pub struct Dense {
    pub weights: Tensor,
    pub biases: Tensor,
    cached_input: Option<Tensor>, // for back propagation
    pub d_weights: Option<Tensor>,
    pub d_biases: Option<Tensor>
}

impl Dense {
    // He initialisation, suited to the ReLU layers that follow
    pub fn new<R: Rng>(input_size: usize, output_size: usize, rng: &mut R) -> Self {
        let std_dev = (2.0 / input_size.max(1) as f32).sqrt();
        Self::from_parts(
            Tensor::random(vec![input_size, output_size], std_dev, rng),
            Tensor::zeros(vec![1, output_size]),
        )
    }

    pub fn from_parts(weights: Tensor, biases: Tensor) -> Self {
        assert_eq!(biases.shape, vec![1, weights.shape[1]], "bias shape must be [1, outputs]");
        Self {
            weights,
            biases,
            cached_input: None,
            d_weights: None,
            d_biases: None
        }
    }

    pub fn input_size(&self) -> usize {
        self.weights.shape[0]
    }
}

impl Layer for Dense {
    fn forward(&mut self, input: &Tensor) -> Tensor {
        self.cached_input = Some(input.clone());
        input.matmul(&self.weights).add_row(&self.biases)
    }

    fn backward(&mut self, d_output: &Tensor) -> Tensor {
        let Some(cached_input) = &self.cached_input else {
            panic!("complete forward pass first.");
        };

        // dL/dW = input.T @ dL/dY
        self.d_weights = Some(cached_input.transpose().matmul(d_output));
        // dL/db = column sums of dL/dY
        self.d_biases = Some(d_output.sum_rows());

        // dL/dX = dL/dY @ W.T
        d_output.matmul(&self.weights.transpose())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}


// relu layer

#[derive(Default)]
pub struct ReLU {
    cached_input: Option<Tensor>
}

impl ReLU {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Layer for ReLU {
    fn forward(&mut self, input: &Tensor) -> Tensor {
        self.cached_input = Some(input.clone());
        input.map(|x| x.max(0.0))
    }

    fn backward(&mut self, d_output: &Tensor) -> Tensor {
        let Some(cached_input) = &self.cached_input else {
            panic!("complete forward pass first.");
        };
        cached_input.map2(d_output, |input_val, grad| if input_val > 0.0 { grad } else { 0.0 })
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn assert_vec_approx_eq(a: &[f32], b: &[f32]) {
        let tolerance = 1e-6;
        assert_eq!(a.len(), b.len(), "vectors have different lengths");
        for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
            assert!((x - y).abs() < tolerance, "mismatch at index {}: {} vs {}", i, x, y);
        }
    }

    fn fixed_dense() -> Dense {
        Dense::from_parts(
            Tensor::from_vec(vec![10.0, 20.0, 30.0, 40.0], vec![2, 2]),
            Tensor::from_vec(vec![1.0, 2.0], vec![1, 2]),
        )
    }

    #[test]
    fn test_dense_new_shapes() {
        let layer = Dense::new(11, 32, &mut StdRng::seed_from_u64(0));

        assert_eq!(layer.weights.shape, vec![11, 32]);
        assert_eq!(layer.biases.shape, vec![1, 32]);
        assert_eq!(layer.input_size(), 11);
        assert!(layer.biases.read().iter().all(|&b| b == 0.0));
    }

    #[test]
    fn test_dense_forward() {
        let mut layer = fixed_dense();

        // [1, 2] @ [[10, 20], [30, 40]] + [1, 2] = [71, 102]
        let output = layer.forward(&Tensor::from_vec(vec![1.0, 2.0], vec![1, 2]));

        assert_eq!(output.shape, vec![1, 2]);
        assert_vec_approx_eq(&output.read(), &[71.0, 102.0]);
    }

    #[test]
    fn test_dense_backward() {
        let mut layer = fixed_dense();
        layer.forward(&Tensor::from_vec(vec![1.0, 2.0], vec![1, 2]));

        // [5, 8] @ [[10, 30], [20, 40]] = [210, 470]
        let d_input = layer.backward(&Tensor::from_vec(vec![5.0, 8.0], vec![1, 2]));
        assert_vec_approx_eq(&d_input.read(), &[210.0, 470.0]);

        // [[1], [2]] @ [[5, 8]]
        assert_vec_approx_eq(&layer.d_weights.as_ref().unwrap().read(), &[5.0, 8.0, 10.0, 16.0]);
        assert_vec_approx_eq(&layer.d_biases.as_ref().unwrap().read(), &[5.0, 8.0]);
    }

    #[test]
    #[should_panic]
    fn test_dense_backward_without_forward() {
        let mut layer = fixed_dense();
        layer.backward(&Tensor::from_vec(vec![5.0, 8.0], vec![1, 2]));
    }

    #[test]
    fn test_relu_round_trip() {
        let input = Tensor::from_vec(vec![-10.0, -0.5, 0.0, 0.5, 10.0], vec![1, 5]);
        let mut layer = ReLU::new();

        let output = layer.forward(&input);
        assert_vec_approx_eq(&output.read(), &[0.0, 0.0, 0.0, 0.5, 10.0]);

        let d_input = layer.backward(&Tensor::from_vec(vec![1.0; 5], vec![1, 5]));
        assert_vec_approx_eq(&d_input.read(), &[0.0, 0.0, 0.0, 1.0, 1.0]);
    }
}
