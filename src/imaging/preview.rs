//! Single-image preview used by the image upload endpoint.
//!
//! Decodes image bytes (PNG/JPEG/BMP/GIF), converts to grayscale and resizes
//! to exactly `width × height` with bilinear filtering.

use image::imageops::FilterType;
use image::ImageError;

use crate::imaging::codec::{decode_image, encode_image, OutputFormat};

/// Returns the preview encoded as PNG bytes.
pub fn grayscale_preview(bytes: &[u8], width: u32, height: u32) -> Result<Vec<u8>, ImageError> {
    let img = decode_image(bytes)?;
    let gray = img.grayscale();
    let resized = gray.resize_exact(width, height, FilterType::Triangle);
    encode_image(&resized, OutputFormat::Png)
}
