use super::tensor::Tensor;

pub trait Loss: Send {
    fn calculate(&self, y_pred: &Tensor, y_true: &Tensor) -> f32;
    fn gradient(&self, y_pred: &Tensor, y_true: &Tensor) -> Tensor;
}


// mean squared error, averaged over the batch rows

pub struct MeanSquaredError;

impl Loss for MeanSquaredError {
    fn calculate(&self, y_pred: &Tensor, y_true: &Tensor) -> f32 {
        let batch = y_pred.shape[0].max(1) as f32;
        let squared_errors = y_pred.map2(y_true, |pred, target| (pred - target).powi(2));
        let total: f32 = squared_errors.read().iter().sum();
        total / batch
    }

    fn gradient(&self, y_pred: &Tensor, y_true: &Tensor) -> Tensor {
        let batch = y_pred.shape[0].max(1) as f32;
        y_pred.map2(y_true, move |pred, target| 2.0 * (pred - target) / batch)
    }
}
