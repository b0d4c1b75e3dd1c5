use image::DynamicImage;

use crate::error::FilterError;
use crate::kernel::FilterSet;

/// Filters `image` with the kernel assigned to `label`.
///
/// Fails with `FilterError::UnknownLabel` when the set has no kernel for
/// `label`; the input is only borrowed and is left untouched either way.
pub fn apply_class_filter(
    image: &DynamicImage,
    label: usize,
    filters: &FilterSet,
) -> Result<DynamicImage, FilterError> {
    filters.apply(image, label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::{FilterParams, Kernel};
    use image::{Rgb, RgbImage};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn sample_image() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(6, 6, |x, y| Rgb([(x * 40) as u8, (y * 40) as u8, 128])))
    }

    #[test]
    fn unknown_label_fails_and_leaves_the_image_alone() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let filters = FilterSet::build(2, &FilterParams::default(), &mut rng).unwrap();
        let image = sample_image();
        let before = image.clone();

        let err = apply_class_filter(&image, 7, &filters).unwrap_err();

        assert_eq!(err, FilterError::UnknownLabel { label: 7, num_classes: 2 });
        assert_eq!(image, before);
    }

    #[test]
    fn identity_filter_set_is_a_no_op() {
        let filters = FilterSet::from_kernels(vec![Kernel::identity(3).unwrap(), Kernel::identity(5).unwrap()]);
        let image = sample_image();
        for label in 0..2 {
            assert_eq!(apply_class_filter(&image, label, &filters).unwrap(), image);
        }
    }

    #[test]
    fn each_label_uses_its_own_kernel() {
        let blur = Kernel::from_weights(3, vec![1.0; 9]).unwrap();
        let filters = FilterSet::from_kernels(vec![Kernel::identity(3).unwrap(), blur]);
        let image = sample_image();

        let a = apply_class_filter(&image, 0, &filters).unwrap();
        let b = apply_class_filter(&image, 1, &filters).unwrap();

        assert_eq!(a, image);
        assert_ne!(b, image);
    }
}
