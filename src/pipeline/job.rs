use std::path::Path;

use rand::Rng;
use tracing::info;

use crate::dataset::{extract_archive, pack_directory, ClassInfo, Dataset};
use crate::error::JobError;
use crate::kernel::FilterSet;
use crate::pipeline::batch::process_dataset;
use crate::pipeline::context::{JobSpec, OutputLayout};
use crate::pipeline::report::{BatchReport, FailureSummary};

/// What a finished dataset job hands back to its caller.
#[derive(Debug)]
pub struct JobOutput {
    pub classes: Vec<ClassInfo>,
    pub report: BatchReport,
    /// Failed items, with paths relative to the dataset root.
    pub failures: Vec<FailureSummary>,
    /// The filtered dataset as a zip: `<class_name>/filtered_<index>.<ext>`.
    pub archive: Vec<u8>,
}

/// Runs the whole pipeline on a dataset zip held in memory.
///
/// The archive is unpacked into a private temporary directory that is removed
/// when the job returns.
pub fn run_archive<R: Rng + ?Sized>(bytes: &[u8], spec: &JobSpec, rng: &mut R) -> Result<JobOutput, JobError> {
    spec.params.validate()?;
    let work = tempfile::tempdir().map_err(JobError::WorkDir)?;
    let dataset_root = work.path().join("dataset");
    std::fs::create_dir_all(&dataset_root).map_err(JobError::WorkDir)?;

    let files = extract_archive(bytes, &dataset_root, spec.max_extracted_bytes)?;
    info!(files, "unpacked dataset archive");

    run_in(&dataset_root, work.path(), spec, rng)
}

/// Runs the pipeline on an already unpacked dataset directory.
pub fn run_directory<R: Rng + ?Sized>(root: &Path, spec: &JobSpec, rng: &mut R) -> Result<JobOutput, JobError> {
    spec.params.validate()?;
    let work = tempfile::tempdir().map_err(JobError::WorkDir)?;
    run_in(root, work.path(), spec, rng)
}

fn run_in<R: Rng + ?Sized>(root: &Path, work: &Path, spec: &JobSpec, rng: &mut R) -> Result<JobOutput, JobError> {
    let dataset = Dataset::load(root)?;
    info!(images = dataset.len(), classes = dataset.num_classes(), "loaded dataset");

    let filters = FilterSet::build(dataset.num_classes(), &spec.params, rng)?;
    info!(
        classes = filters.len(),
        kernel_size = spec.params.kernel_size,
        blur_parameter = spec.params.blur_parameter,
        center_parameter = ?spec.params.center_parameter,
        "created class filters"
    );

    let layout = OutputLayout {
        dataset_dir: work.join("filtered_dataset"),
        samples_dir: spec.samples_dir.clone(),
    };
    std::fs::create_dir_all(&layout.dataset_dir).map_err(JobError::WorkDir)?;

    let report = process_dataset(&dataset, &filters, &layout, &spec.naming, spec.workers);
    let failures = report.failure_summaries(&dataset.root);
    info!(processed = report.processed(), failed = failures.len(), "filtered dataset");

    let archive = pack_directory(&layout.dataset_dir)?;

    Ok(JobOutput { classes: dataset.classes, report, failures, archive })
}
