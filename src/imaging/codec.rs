use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageError, ImageOutputFormat};
use serde::{Deserialize, Serialize};

/// On-disk encoding used for filtered images and samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputFormat {
    Jpeg { quality: u8 },
    Png,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg { .. } => "jpg",
            OutputFormat::Png => "png",
        }
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        OutputFormat::Jpeg { quality: 95 }
    }
}

pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, ImageError> {
    image::load_from_memory(bytes)
}

pub fn open_image(path: &Path) -> Result<DynamicImage, ImageError> {
    image::open(path)
}

/// Encodes `image` into an in-memory file.
///
/// JPEG has no alpha channel and only 8-bit samples, so anything else is
/// flattened to 8-bit gray or RGB first.
pub fn encode_image(image: &DynamicImage, format: OutputFormat) -> Result<Vec<u8>, ImageError> {
    let mut buf = Cursor::new(Vec::new());
    match format {
        OutputFormat::Png => image.write_to(&mut buf, ImageOutputFormat::Png)?,
        OutputFormat::Jpeg { quality } => {
            let flat = match image {
                DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => image.clone(),
                DynamicImage::ImageLumaA8(_)
                | DynamicImage::ImageLuma16(_)
                | DynamicImage::ImageLumaA16(_) => DynamicImage::ImageLuma8(image.to_luma8()),
                _ => DynamicImage::ImageRgb8(image.to_rgb8()),
            };
            flat.write_to(&mut buf, ImageOutputFormat::Jpeg(quality.clamp(1, 100)))?;
        }
    }
    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgba, RgbaImage};

    #[test]
    fn jpeg_drops_alpha_but_keeps_size() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 5, Rgba([10, 20, 30, 128])));
        let bytes = encode_image(&img, OutputFormat::Jpeg { quality: 90 }).unwrap();
        let back = decode_image(&bytes).unwrap();
        assert_eq!(back.dimensions(), (8, 5));
        assert_eq!(back.color(), image::ColorType::Rgb8);
    }

    #[test]
    fn png_is_lossless() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_fn(4, 4, |x, y| Rgba([x as u8, y as u8, 7, 200])));
        let bytes = encode_image(&img, OutputFormat::Png).unwrap();
        assert_eq!(decode_image(&bytes).unwrap(), img);
    }

    #[test]
    fn garbage_does_not_decode() {
        assert!(decode_image(b"definitely not an image").is_err());
    }
}
