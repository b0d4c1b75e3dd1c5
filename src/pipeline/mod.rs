pub mod context;
pub mod report;
pub mod batch;
pub mod job;

pub use context::{JobSpec, NamingPolicy, OutputLayout};
pub use report::{BatchReport, FailureSummary, ItemOutcome, SampleRecord};
pub use batch::process_dataset;
pub use job::{run_archive, run_directory, JobOutput};
