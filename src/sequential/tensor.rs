use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use rand::Rng;
use rand_distr::{Normal, Distribution};
use rayon::prelude::*;
use std::fmt;

/// Row-major 2D buffer shared behind a lock; `clone` shares, `deep_clone` copies.
pub struct Tensor {
    pub data: Arc<RwLock<Vec<f32>>>,
    pub shape: Vec<usize>,
    pub strides: Vec<usize>
}

impl Tensor {
    pub fn zeros(shape: Vec<usize>) -> Self {
        let data: Vec<f32> = vec![0.0; shape.iter().product()];
        Self::from_vec(data, shape)
    }

    // zero-mean gaussian init with the given standard deviation
    pub fn random<R: Rng>(shape: Vec<usize>, std_dev: f32, rng: &mut R) -> Self {
        let normal = Normal::new(0.0, std_dev).unwrap_or_else(|_| panic!("invalid std dev {}", std_dev));
        let data: Vec<f32> = (0..shape.iter().product()).map(|_| normal.sample(rng)).collect();
        Self::from_vec(data, shape)
    }

    pub fn from_vec(data: Vec<f32>, shape: Vec<usize>) -> Self {
        assert_eq!(data.len(), shape.iter().product::<usize>(), "data does not fit shape {:?}", shape);
        Self {
            data: Arc::new(RwLock::new(data)),
            strides: Tensor::calc_strides(&shape),
            shape
        }
    }

    /// Stacks equally sized rows into a [rows, width] tensor.
    pub fn from_rows(rows: &[&[f32]]) -> Self {
        let width = rows.first().map_or(0, |row| row.len());
        let mut data = Vec::with_capacity(rows.len() * width);
        for row in rows {
            assert_eq!(row.len(), width, "ragged rows");
            data.extend_from_slice(row);
        }
        Self::from_vec(data, vec![rows.len(), width])
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Vec<f32>> {
        self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Vec<f32>> {
        self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn all_finite(&self) -> bool {
        self.read().iter().all(|x| x.is_finite())
    }

    // shares storage, only the view changes
    pub fn transpose(&self) -> Self {
        let mut new_shape = self.shape.clone();
        new_shape.reverse();
        let mut new_strides = self.strides.clone();
        new_strides.reverse();

        Self {
            data: Arc::clone(&self.data),
            shape: new_shape,
            strides: new_strides
        }
    }

    pub fn matmul(&self, other: &Tensor) -> Tensor {
        assert_eq!(self.shape.len(), 2, "self must be a 2D tensor.");
        assert_eq!(other.shape.len(), 2, "other must be a 2D tensor.");
        assert_eq!(self.shape[1], other.shape[0], "self columns must equal other rows");

        let k = self.shape[1];
        let n = other.shape[1];
        let c = Tensor::zeros(vec![self.shape[0], n]);

        let a_data = self.read();
        let b_data = other.read();
        {
            let mut c_guard = c.write();
            c_guard.par_chunks_mut(n.max(1)).enumerate().for_each(|(m_idx, c_row)| {
                for k_idx in 0..k {
                    let a_val = a_data[m_idx * self.strides[0] + k_idx * self.strides[1]];
                    for (n_idx, c_val) in c_row.iter_mut().enumerate() {
                        *c_val += a_val * b_data[k_idx * other.strides[0] + n_idx * other.strides[1]];
                    }
                }
            });
        }

        c
    }

    // column sums of a 2D tensor, as [1, cols]
    pub fn sum_rows(&self) -> Tensor {
        assert_eq!(self.shape.len(), 2, "sum_rows only works for 2D tensors");

        let n = self.shape[1];
        let data = self.read();
        let totals = data.par_chunks(n.max(1)).fold(
            || vec![0.0; n],
            |mut acc, row| {
                for (a, x) in acc.iter_mut().zip(row) {
                    *a += x;
                }
                acc
            }
        ).reduce(
            || vec![0.0; n],
            |mut acc, partial| {
                for (a, x) in acc.iter_mut().zip(partial) {
                    *a += x;
                }
                acc
            }
        );

        Tensor::from_vec(totals, vec![1, n])
    }

    pub fn add_row(&self, row: &Tensor) -> Tensor {
        assert_eq!(row.shape, vec![1, self.shape[1]], "row must be [1, cols]");

        let n = self.shape[1];
        let out = self.deep_clone();
        {
            let mut out_data = out.write();
            let row_data = row.read();
            out_data.par_chunks_mut(n.max(1)).for_each(|chunk| {
                for (x, b) in chunk.iter_mut().zip(row_data.iter()) {
                    *x += b;
                }
            });
        }
        out
    }

    pub fn map<F>(&self, f: F) -> Tensor
    where F: Fn(f32) -> f32 + Sync + Send {
        let input_data = self.read();
        let new_data: Vec<f32> = input_data.par_iter().map(|&x| f(x)).collect();
        Tensor::from_vec(new_data, self.shape.clone())
    }

    pub fn map2<F>(&self, other: &Tensor, f: F) -> Tensor
    where F: Fn(f32, f32) -> f32 + Sync + Send {
        assert_eq!(self.shape, other.shape, "tensors must have the same shape");

        let data1 = self.read();
        let data2 = other.read();
        let new_data: Vec<f32> = data1.par_iter().zip(data2.par_iter()).map(|(&x1, &x2)| f(x1, x2)).collect();
        Tensor::from_vec(new_data, self.shape.clone())
    }

    pub fn deep_clone(&self) -> Tensor {
        let data_clone = self.read().clone();
        Tensor::from_vec(data_clone, self.shape.clone())
    }

    fn calc_strides(shape: &[usize]) -> Vec<usize> {
        let mut strides: Vec<usize> = vec![1; shape.len()];
        for i in (0..strides.len().saturating_sub(1)).rev() {
            strides[i] = strides[i+1] * shape[i+1];
        }
        strides
    }
}

impl Clone for Tensor {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            shape: self.shape.clone(),
            strides: self.strides.clone()
        }
    }
}

impl PartialEq for Tensor {
    fn eq(&self, other: &Self) -> bool {
        self.shape == other.shape && *self.read() == *other.read()
    }
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tensor")
         .field("shape", &self.shape)
         .field("data", &*self.read())
         .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn assert_vec_approx_eq(a: &[f32], b: &[f32]) {
        let tolerance = 1e-4;
        assert_eq!(a.len(), b.len(), "vectors have different lengths");
        for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
            assert!((x - y).abs() < tolerance, "mismatch at index {}: {} vs {}", i, x, y);
        }
    }

    fn reference_matmul(a: &Tensor, b: &Tensor) -> Vec<f32> {
        let (m, k, n) = (a.shape[0], a.shape[1], b.shape[1]);
        let mut result = vec![0.0; m * n];
        let a_data = a.read();
        let b_data = b.read();

        for i in 0..m {
            for j in 0..n {
                for l in 0..k {
                    result[i * n + j] += a_data[i * a.strides[0] + l * a.strides[1]] * b_data[l * b.strides[0] + j * b.strides[1]];
                }
            }
        }
        result
    }

    #[test]
    fn test_strides() {
        let t = Tensor::zeros(vec![3, 4]);
        assert_eq!(t.strides, vec![4, 1]);
        assert_eq!(t.transpose().strides, vec![1, 4]);
        assert_eq!(t.transpose().shape, vec![4, 3]);
    }

    #[test]
    fn test_random_is_seeded() {
        let a = Tensor::random(vec![4, 8], 0.5, &mut StdRng::seed_from_u64(11));
        let b = Tensor::random(vec![4, 8], 0.5, &mut StdRng::seed_from_u64(11));

        assert_eq!(a.read().len(), 32);
        assert_eq!(a, b);
    }

    #[test]
    fn test_from_rows() {
        let t = Tensor::from_rows(&[&[1.0, 2.0], &[3.0, 4.0], &[5.0, 6.0]]);
        assert_eq!(t.shape, vec![3, 2]);
        assert_eq!(*t.read(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    #[should_panic]
    fn test_from_vec_rejects_bad_shape() {
        Tensor::from_vec(vec![1.0, 2.0, 3.0], vec![2, 2]);
    }

    #[test]
    fn test_matmul_simple() {
        let a = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], vec![2, 3]);
        let b = Tensor::from_vec(vec![7.0, 8.0, 9.0, 10.0, 11.0, 12.0], vec![3, 2]);

        let c = a.matmul(&b);

        assert_eq!(c.shape, vec![2, 2]);
        assert_eq!(*c.read(), vec![58.0, 64.0, 139.0, 154.0]);
    }

    #[test]
    fn test_matmul_transpose_against_reference() {
        let mut rng = StdRng::seed_from_u64(5);
        let a = Tensor::random(vec![12, 11], 1.0, &mut rng);
        let b = a.transpose();

        let fast = a.matmul(&b);

        assert_eq!(fast.shape, vec![12, 12]);
        assert_vec_approx_eq(&fast.read(), &reference_matmul(&a, &b));
    }

    #[test]
    fn test_sum_rows_and_add_row() {
        let t = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], vec![2, 3]);

        let s = t.sum_rows();
        assert_eq!(s.shape, vec![1, 3]);
        assert_vec_approx_eq(&s.read(), &[5.0, 7.0, 9.0]);

        let shifted = t.add_row(&Tensor::from_vec(vec![1.0, 0.0, -1.0], vec![1, 3]));
        assert_vec_approx_eq(&shifted.read(), &[2.0, 2.0, 2.0, 5.0, 5.0, 5.0]);
        assert_eq!(t.read()[0], 1.0);
    }

    #[test]
    fn test_map2_and_finite() {
        let a = Tensor::from_vec(vec![1.0, 2.0, 3.0], vec![1, 3]);
        let b = Tensor::from_vec(vec![10.0, 20.0, 30.0], vec![1, 3]);

        assert_vec_approx_eq(&a.map2(&b, |x, y| x + y).read(), &[11.0, 22.0, 33.0]);
        assert!(a.all_finite());
        assert!(!a.map(|x| x / 0.0).all_finite());
    }

    #[test]
    #[should_panic]
    fn test_map2_shape_mismatch() {
        let a = Tensor::from_vec(vec![1.0, 2.0, 3.0], vec![1, 3]);
        let b = Tensor::from_vec(vec![10.0, 20.0], vec![1, 2]);
        a.map2(&b, |x, y| x + y);
    }
}
