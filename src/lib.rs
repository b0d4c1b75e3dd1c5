pub mod error;
pub mod kernel;
pub mod filter;
pub mod imaging;
pub mod dataset;
pub mod pipeline;
pub mod config;
pub mod logging;

// Convenience re-exports
pub use error::{ConfigError, DatasetError, FilterError, ItemError, JobError};
pub use kernel::{build_filter_set, generate_kernel, FilterParams, FilterSet, Kernel};
pub use filter::apply_class_filter;
pub use dataset::{ClassInfo, Dataset};
pub use pipeline::{run_archive, run_directory, BatchReport, JobOutput, JobSpec};
pub use config::ServiceConfig;
