use serde::{Deserialize, Serialize};

use crate::error::FilterError;

/// Largest accepted kernel side length.
pub const MAX_KERNEL_SIZE: usize = 4095;

/// Checks that `size` is a usable side length and returns `size * size`.
pub(crate) fn cell_count(size: usize) -> Result<usize, FilterError> {
    if size == 0 || size % 2 == 0 {
        return Err(FilterError::InvalidParameter(format!(
            "kernel_size must be a positive odd integer, got {}",
            size
        )));
    }
    if size > MAX_KERNEL_SIZE {
        return Err(FilterError::InvalidParameter(format!(
            "kernel_size must not exceed {}, got {}",
            MAX_KERNEL_SIZE, size
        )));
    }
    size.checked_mul(size).ok_or_else(|| {
        FilterError::InvalidParameter(format!("kernel_size {} overflows the cell count", size))
    })
}

/// Parameters shared by every kernel of one filter set.
///
/// Fields:
/// - `kernel_size`      : odd side length of the square kernel
/// - `blur_parameter`   : exclusive upper bound of the uniform draw for each entry
/// - `center_parameter` : value pinned at the center cell before normalization;
///                        `None` leaves the center random
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterParams {
    pub kernel_size: usize,
    pub blur_parameter: f64,
    pub center_parameter: Option<f64>,
}

impl FilterParams {
    pub fn new(kernel_size: usize, blur_parameter: f64, center_parameter: Option<f64>) -> Self {
        FilterParams { kernel_size, blur_parameter, center_parameter }
    }

    /// Rejects parameter combinations that cannot produce a normalized kernel.
    pub fn validate(&self) -> Result<(), FilterError> {
        cell_count(self.kernel_size)?;
        if !self.blur_parameter.is_finite() || self.blur_parameter < 0.0 {
            return Err(FilterError::InvalidParameter(format!(
                "blur_parameter must be finite and non-negative, got {}",
                self.blur_parameter
            )));
        }
        match self.center_parameter {
            Some(c) if !c.is_finite() || c < 0.0 => Err(FilterError::InvalidParameter(format!(
                "center_parameter must be finite and non-negative, got {}",
                c
            ))),
            None if self.blur_parameter == 0.0 => Err(FilterError::InvalidParameter(
                "blur_parameter 0 without a center_parameter gives an all-zero kernel".into(),
            )),
            Some(c) if c == 0.0 && self.blur_parameter == 0.0 => Err(FilterError::InvalidParameter(
                "blur_parameter 0 with center_parameter 0 gives an all-zero kernel".into(),
            )),
            _ => Ok(()),
        }
    }
}

impl Default for FilterParams {
    fn default() -> Self {
        FilterParams { kernel_size: 3, blur_parameter: 1.0, center_parameter: Some(1.0) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_params_are_valid() {
        assert!(FilterParams::default().validate().is_ok());
    }

    #[test]
    fn even_and_zero_sizes_are_rejected() {
        for size in [0, 2, 4] {
            let params = FilterParams::new(size, 1.0, Some(1.0));
            assert!(matches!(params.validate(), Err(FilterError::InvalidParameter(_))));
        }
    }

    #[test]
    fn oversized_kernels_are_rejected() {
        for size in [MAX_KERNEL_SIZE + 2, (1usize << 32) + 1, usize::MAX] {
            let params = FilterParams::new(size, 1.0, Some(1.0));
            assert!(matches!(params.validate(), Err(FilterError::InvalidParameter(_))));
        }
        assert_eq!(cell_count(MAX_KERNEL_SIZE).unwrap(), MAX_KERNEL_SIZE * MAX_KERNEL_SIZE);
    }

    #[test]
    fn zero_blur_needs_a_positive_center() {
        assert!(FilterParams::new(3, 0.0, None).validate().is_err());
        assert!(FilterParams::new(3, 0.0, Some(0.0)).validate().is_err());
        assert!(FilterParams::new(3, 0.0, Some(2.0)).validate().is_ok());
    }

    #[test]
    fn non_finite_values_are_rejected() {
        assert!(FilterParams::new(3, f64::NAN, None).validate().is_err());
        assert!(FilterParams::new(3, 1.0, Some(f64::INFINITY)).validate().is_err());
        assert!(FilterParams::new(3, -0.5, Some(1.0)).validate().is_err());
    }
}
