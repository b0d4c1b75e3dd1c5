//! Same-size 2D correlation over `image` buffers.
//!
//! The kernel is not flipped, matching the usual `filter2D` convention. Pixels
//! outside the image are taken from the mirrored interior without repeating
//! the edge pixel (reflect-101: `gfedcb|abcdefgh|gfedcba`). Every channel is
//! filtered independently, alpha included.

use image::{DynamicImage, ImageBuffer, Pixel};

use crate::kernel::Kernel;

/// Channel sample types the correlation can read and write back.
pub trait Sample: Copy {
    fn as_f64(self) -> f64;
    /// Converts an accumulated value back, rounding and saturating integer types.
    fn saturate(value: f64) -> Self;
}

impl Sample for u8 {
    fn as_f64(self) -> f64 {
        self as f64
    }
    fn saturate(value: f64) -> Self {
        value.round().clamp(0.0, u8::MAX as f64) as u8
    }
}

impl Sample for u16 {
    fn as_f64(self) -> f64 {
        self as f64
    }
    fn saturate(value: f64) -> Self {
        value.round().clamp(0.0, u16::MAX as f64) as u16
    }
}

impl Sample for f32 {
    fn as_f64(self) -> f64 {
        self as f64
    }
    fn saturate(value: f64) -> Self {
        value as f32
    }
}

/// Maps a possibly out-of-range coordinate into `0..len` by reflect-101.
pub fn reflect_101(index: isize, len: usize) -> usize {
    if len <= 1 {
        return 0;
    }
    let period = 2 * (len as isize - 1);
    let i = index.rem_euclid(period);
    if i >= len as isize {
        (period - i) as usize
    } else {
        i as usize
    }
}

/// Source coordinate for every (output position, kernel tap) pair.
fn tap_table(len: usize, kernel: &Kernel) -> Vec<usize> {
    let size = kernel.size();
    let radius = kernel.radius() as isize;
    let mut taps = Vec::with_capacity(len * size);
    for pos in 0..len as isize {
        for k in 0..size as isize {
            taps.push(reflect_101(pos + k - radius, len));
        }
    }
    taps
}

/// Correlates one image buffer with `kernel`. Output has the same size and pixel type.
pub fn correlate<P>(image: &ImageBuffer<P, Vec<P::Subpixel>>, kernel: &Kernel) -> ImageBuffer<P, Vec<P::Subpixel>>
where
    P: Pixel,
    P::Subpixel: Sample,
{
    let mut output = image.clone();
    let (width, height) = image.dimensions();
    let (width, height) = (width as usize, height as usize);
    if width == 0 || height == 0 {
        return output;
    }

    let channels = P::CHANNEL_COUNT as usize;
    let size = kernel.size();
    let x_taps = tap_table(width, kernel);
    let y_taps = tap_table(height, kernel);

    let src: &[P::Subpixel] = image.as_raw();
    let dst: &mut [P::Subpixel] = &mut output;
    let mut acc = vec![0.0f64; channels];

    for y in 0..height {
        for x in 0..width {
            acc.iter_mut().for_each(|a| *a = 0.0);
            for ky in 0..size {
                let row = y_taps[y * size + ky] * width;
                for kx in 0..size {
                    let weight = kernel.get(ky, kx);
                    if weight == 0.0 {
                        continue;
                    }
                    let base = (row + x_taps[x * size + kx]) * channels;
                    for (c, a) in acc.iter_mut().enumerate() {
                        *a += weight * src[base + c].as_f64();
                    }
                }
            }
            let out = (y * width + x) * channels;
            for (c, a) in acc.iter().enumerate() {
                dst[out + c] = <P::Subpixel as Sample>::saturate(*a);
            }
        }
    }

    output
}

/// Correlates a decoded image with `kernel`, keeping its color type.
pub fn filter_image(image: &DynamicImage, kernel: &Kernel) -> DynamicImage {
    match image {
        DynamicImage::ImageLuma8(buf)   => DynamicImage::ImageLuma8(correlate(buf, kernel)),
        DynamicImage::ImageLumaA8(buf)  => DynamicImage::ImageLumaA8(correlate(buf, kernel)),
        DynamicImage::ImageRgb8(buf)    => DynamicImage::ImageRgb8(correlate(buf, kernel)),
        DynamicImage::ImageRgba8(buf)   => DynamicImage::ImageRgba8(correlate(buf, kernel)),
        DynamicImage::ImageLuma16(buf)  => DynamicImage::ImageLuma16(correlate(buf, kernel)),
        DynamicImage::ImageLumaA16(buf) => DynamicImage::ImageLumaA16(correlate(buf, kernel)),
        DynamicImage::ImageRgb16(buf)   => DynamicImage::ImageRgb16(correlate(buf, kernel)),
        DynamicImage::ImageRgba16(buf)  => DynamicImage::ImageRgba16(correlate(buf, kernel)),
        DynamicImage::ImageRgb32F(buf)  => DynamicImage::ImageRgb32F(correlate(buf, kernel)),
        DynamicImage::ImageRgba32F(buf) => DynamicImage::ImageRgba32F(correlate(buf, kernel)),
        other => DynamicImage::ImageRgba32F(correlate(&other.to_rgba32f(), kernel)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 37 % 256) as u8, (y * 53 % 256) as u8, ((x + y) * 11 % 256) as u8])
        })
    }

    #[test]
    fn reflect_101_mirrors_without_repeating_the_edge() {
        assert_eq!(reflect_101(-1, 5), 1);
        assert_eq!(reflect_101(-2, 5), 2);
        assert_eq!(reflect_101(5, 5), 3);
        assert_eq!(reflect_101(6, 5), 2);
        assert_eq!(reflect_101(2, 5), 2);
        assert_eq!(reflect_101(-3, 1), 0);
        assert_eq!(reflect_101(-1, 2), 1);
    }

    #[test]
    fn identity_kernel_returns_the_input() {
        let img = gradient(7, 5);
        for size in [1, 3, 5] {
            let out = correlate(&img, &Kernel::identity(size).unwrap());
            assert_eq!(out, img);
        }
    }

    #[test]
    fn constant_image_is_a_fixed_point() {
        let img = RgbaImage::from_pixel(6, 4, Rgba([90, 10, 200, 255]));
        let kernel = Kernel::from_weights(3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]).unwrap();
        assert_eq!(correlate(&img, &kernel), img);
    }

    #[test]
    fn box_blur_uses_reflected_borders() {
        // Row 0 1 2 reflected: [1] 0 1 2 [1]
        let img = GrayImage::from_raw(3, 1, vec![0, 30, 60]).unwrap();
        let kernel = Kernel::from_weights(3, vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0]).unwrap();
        let out = correlate(&img, &kernel);
        assert_eq!(out.into_raw(), vec![20, 30, 40]);
    }

    #[test]
    fn kernel_is_not_flipped() {
        // Weight only on the right-hand tap: output(x) = input(x + 1).
        let img = GrayImage::from_raw(4, 1, vec![10, 20, 30, 40]).unwrap();
        let kernel = Kernel::from_weights(3, vec![0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0]).unwrap();
        let out = correlate(&img, &kernel);
        assert_eq!(out.into_raw(), vec![20, 30, 40, 30]);
    }

    #[test]
    fn filter_image_keeps_color_type_and_size() {
        let kernel = Kernel::from_weights(3, vec![1.0; 9]).unwrap();
        let gray = DynamicImage::ImageLuma8(GrayImage::from_pixel(5, 3, Luma([12])));
        let rgb16 = DynamicImage::ImageRgb8(gradient(4, 6)).into_rgb16();
        let rgb16 = DynamicImage::ImageRgb16(rgb16);

        let out = filter_image(&gray, &kernel);
        assert_eq!(out.color(), gray.color());
        assert_eq!((out.width(), out.height()), (5, 3));

        let out = filter_image(&rgb16, &kernel);
        assert_eq!(out.color(), rgb16.color());
        assert_eq!((out.width(), out.height()), (4, 6));
    }

    #[test]
    fn large_kernel_on_tiny_image_stays_in_bounds() {
        let img = gradient(2, 1);
        let kernel = Kernel::from_weights(7, vec![1.0; 49]).unwrap();
        let out = correlate(&img, &kernel);
        assert_eq!(out.dimensions(), (2, 1));
    }
}
