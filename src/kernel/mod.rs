pub mod kernel;
pub mod params;
pub mod filter_set;

pub use kernel::{generate_kernel, Kernel};
pub use params::{FilterParams, MAX_KERNEL_SIZE};
pub use filter_set::{build_filter_set, FilterSet};
