pub mod convolve;
pub mod apply;

pub use convolve::{correlate, filter_image};
pub use apply::apply_class_filter;
