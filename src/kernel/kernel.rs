use rand::Rng;
use serde::Serialize;

use crate::error::FilterError;
use crate::kernel::params::{cell_count, FilterParams};

/// A square, normalized convolution kernel stored row-major.
///
/// Every kernel built through this type has an odd side length, non-negative
/// entries and entries that sum to 1.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kernel {
    size: usize,
    weights: Vec<f64>,
}

impl Kernel {
    /// Draws a random kernel from `rng`.
    ///
    /// Each entry is uniform on `[0, blur_parameter)`. When `center_parameter`
    /// is set, the center cell is overwritten with it before normalization.
    pub fn random<R: Rng + ?Sized>(params: &FilterParams, rng: &mut R) -> Result<Kernel, FilterError> {
        params.validate()?;
        let size = params.kernel_size;
        let cells = cell_count(size)?;

        let mut weights: Vec<f64> = (0..cells)
            .map(|_| rng.gen::<f64>() * params.blur_parameter)
            .collect();

        if let Some(center) = params.center_parameter {
            let mid = size / 2;
            weights[mid * size + mid] = center;
        }

        Kernel::normalized(size, weights)
    }

    /// Builds a kernel from explicit row-major weights and normalizes them.
    pub fn from_weights(size: usize, weights: Vec<f64>) -> Result<Kernel, FilterError> {
        let cells = cell_count(size)?;
        if weights.len() != cells {
            return Err(FilterError::InvalidParameter(format!(
                "expected {} weights for a {}x{} kernel, got {}",
                cells,
                size,
                size,
                weights.len()
            )));
        }
        if let Some(w) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
            return Err(FilterError::InvalidParameter(format!(
                "kernel weights must be finite and non-negative, found {}",
                w
            )));
        }
        Kernel::normalized(size, weights)
    }

    /// The pass-through kernel: 1 at the center, 0 elsewhere.
    pub fn identity(size: usize) -> Result<Kernel, FilterError> {
        let mut weights = vec![0.0; cell_count(size)?];
        weights[(size / 2) * size + size / 2] = 1.0;
        Kernel::from_weights(size, weights)
    }

    fn normalized(size: usize, mut weights: Vec<f64>) -> Result<Kernel, FilterError> {
        let sum: f64 = weights.iter().sum();
        if !(sum.is_finite() && sum > 0.0) {
            return Err(FilterError::InvalidParameter(format!(
                "kernel weights sum to {}, cannot normalize",
                sum
            )));
        }
        for w in weights.iter_mut() {
            *w /= sum;
        }
        Ok(Kernel { size, weights })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Half-width of the kernel window (`size / 2`).
    pub fn radius(&self) -> usize {
        self.size / 2
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.weights[row * self.size + col]
    }

    pub fn center(&self) -> f64 {
        self.get(self.radius(), self.radius())
    }

    pub fn sum(&self) -> f64 {
        self.weights.iter().sum()
    }
}

/// Generates one random normalized kernel.
pub fn generate_kernel<R: Rng + ?Sized>(
    size: usize,
    blur_parameter: f64,
    center_parameter: Option<f64>,
    rng: &mut R,
) -> Result<Kernel, FilterError> {
    Kernel::random(&FilterParams::new(size, blur_parameter, center_parameter), rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn random_kernel_sums_to_one() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for size in [1, 3, 5, 7] {
            let k = generate_kernel(size, 0.3, Some(1.0), &mut rng).unwrap();
            assert_eq!(k.weights().len(), size * size);
            assert_abs_diff_eq!(k.sum(), 1.0, epsilon = 1e-9);
            assert!(k.weights().iter().all(|w| *w >= 0.0));
        }
    }

    #[test]
    fn pinned_center_keeps_its_share_of_the_total() {
        let params = FilterParams::new(3, 0.5, Some(2.0));
        let mut a = ChaCha8Rng::seed_from_u64(11);
        let mut b = ChaCha8Rng::seed_from_u64(11);

        let kernel = Kernel::random(&params, &mut a).unwrap();

        // Replay the same draws to recover the pre-normalization sum.
        let mut raw: Vec<f64> = (0..9).map(|_| b.gen::<f64>() * 0.5).collect();
        raw[4] = 2.0;
        let sum: f64 = raw.iter().sum();

        assert_abs_diff_eq!(kernel.center(), 2.0 / sum, epsilon = 1e-12);
    }

    #[test]
    fn zero_blur_without_center_is_invalid() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let err = generate_kernel(3, 0.0, None, &mut rng).unwrap_err();
        assert!(matches!(err, FilterError::InvalidParameter(_)));
    }

    #[test]
    fn zero_blur_with_center_is_identity() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let k = generate_kernel(3, 0.0, Some(1.0), &mut rng).unwrap();
        assert_eq!(k, Kernel::identity(3).unwrap());
    }

    #[test]
    fn seeded_generation_is_reproducible() {
        let a = generate_kernel(5, 1.0, None, &mut ChaCha8Rng::seed_from_u64(42)).unwrap();
        let b = generate_kernel(5, 1.0, None, &mut ChaCha8Rng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn unseeded_generation_differs_between_calls() {
        let mut rng = rand::thread_rng();
        let a = generate_kernel(3, 1.0, Some(1.0), &mut rng).unwrap();
        let b = generate_kernel(3, 1.0, Some(1.0), &mut rng).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn from_weights_rejects_bad_shapes() {
        assert!(Kernel::from_weights(3, vec![1.0; 8]).is_err());
        assert!(Kernel::from_weights(2, vec![1.0; 4]).is_err());
        assert!(Kernel::from_weights(3, vec![-1.0, 2.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]).is_err());
        assert!(Kernel::from_weights(3, vec![0.0; 9]).is_err());
    }

    #[test]
    fn huge_sizes_are_rejected_without_panicking() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for size in [(1usize << 32) + 1, usize::MAX] {
            let err = generate_kernel(size, 1.0, Some(1.0), &mut rng).unwrap_err();
            assert!(matches!(err, FilterError::InvalidParameter(_)));
            assert!(Kernel::identity(size).is_err());
            assert!(Kernel::from_weights(size, vec![1.0]).is_err());
        }
    }

    #[test]
    fn from_weights_normalizes() {
        let k = Kernel::from_weights(3, vec![1.0; 9]).unwrap();
        for w in k.weights() {
            assert_abs_diff_eq!(*w, 1.0 / 9.0, epsilon = 1e-12);
        }
    }
}
