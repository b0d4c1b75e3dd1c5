use image::DynamicImage;
use rand::Rng;
use tracing::debug;

use crate::error::FilterError;
use crate::filter::convolve::filter_image;
use crate::kernel::kernel::Kernel;
use crate::kernel::params::FilterParams;

/// One kernel per class label, addressed by label.
///
/// Labels are contiguous (`0..len`), so the set is a plain `Vec` and every
/// label below `len()` is guaranteed to have a kernel. The set is never
/// mutated after construction and can be shared across worker threads.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSet {
    kernels: Vec<Kernel>,
}

impl FilterSet {
    /// Draws `num_classes` independent kernels from `rng`.
    pub fn build<R: Rng + ?Sized>(
        num_classes: usize,
        params: &FilterParams,
        rng: &mut R,
    ) -> Result<FilterSet, FilterError> {
        params.validate()?;
        let kernels = (0..num_classes)
            .map(|_| Kernel::random(params, rng))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(num_classes, kernel_size = params.kernel_size, "built filter set");
        Ok(FilterSet { kernels })
    }

    pub fn from_kernels(kernels: Vec<Kernel>) -> FilterSet {
        FilterSet { kernels }
    }

    pub fn get(&self, label: usize) -> Result<&Kernel, FilterError> {
        self.kernels.get(label).ok_or(FilterError::UnknownLabel {
            label,
            num_classes: self.kernels.len(),
        })
    }

    /// Filters `image` with the kernel of `label`.
    pub fn apply(&self, image: &DynamicImage, label: usize) -> Result<DynamicImage, FilterError> {
        let kernel = self.get(label)?;
        Ok(filter_image(image, kernel))
    }

    pub fn len(&self) -> usize {
        self.kernels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kernels.is_empty()
    }

    /// Iterates `(label, kernel)` pairs in label order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Kernel)> {
        self.kernels.iter().enumerate()
    }
}

/// Builds a filter set for labels `0..num_classes`.
pub fn build_filter_set<R: Rng + ?Sized>(
    num_classes: usize,
    params: &FilterParams,
    rng: &mut R,
) -> Result<FilterSet, FilterError> {
    FilterSet::build(num_classes, params, rng)
}
