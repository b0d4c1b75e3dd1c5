pub mod codec;
pub mod preview;

pub use codec::{decode_image, encode_image, open_image, OutputFormat};
pub use preview::grayscale_preview;
