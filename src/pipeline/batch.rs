use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::dataset::{Dataset, DatasetItem};
use crate::error::ItemError;
use crate::imaging::{encode_image, open_image};
use crate::kernel::FilterSet;
use crate::pipeline::context::{NamingPolicy, OutputLayout};
use crate::pipeline::report::{BatchReport, ItemOutcome, SampleRecord};

/// Filters every item of `dataset` and writes it to `layout.dataset_dir/<class>/`.
///
/// A failing item is recorded in the report and the run moves on. Once all
/// items are done, the first successfully filtered item of each class is
/// copied to `layout.samples_dir` (when set) as an original/filtered pair.
///
/// `filters` is only read, so items are spread over a pool of `workers`
/// threads. Outcomes come back in dataset order.
pub fn process_dataset(
    dataset: &Dataset,
    filters: &FilterSet,
    layout: &OutputLayout,
    naming: &NamingPolicy,
    workers: usize,
) -> BatchReport {
    let filter_one = |item: &DatasetItem| process_item(dataset, filters, layout, naming, item);
    let workers = workers.clamp(1, dataset.len().max(1));

    let outcomes: Vec<ItemOutcome> = if workers == 1 {
        dataset.items.iter().map(filter_one).collect()
    } else {
        match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
            Ok(pool) => pool.install(|| dataset.items.par_iter().map(filter_one).collect()),
            Err(e) => {
                warn!(workers, error = %e, "cannot build worker pool, filtering on the calling thread");
                dataset.items.iter().map(filter_one).collect()
            }
        }
    };

    let mut report = BatchReport { outcomes, samples: Vec::new() };
    if let Some(samples_dir) = &layout.samples_dir {
        report.samples = write_samples(dataset, &report, samples_dir, naming);
    }
    report
}

fn process_item(
    dataset: &Dataset,
    filters: &FilterSet,
    layout: &OutputLayout,
    naming: &NamingPolicy,
    item: &DatasetItem,
) -> ItemOutcome {
    let result = filter_item(dataset, filters, layout, naming, item);
    match &result {
        Ok(path) => debug!(index = item.index, out = %path.display(), "filtered item"),
        Err(e) => warn!(index = item.index, file = %item.path.display(), error = %e, "item failed"),
    }
    ItemOutcome { index: item.index, label: item.label, source: item.path.clone(), result }
}

fn filter_item(
    dataset: &Dataset,
    filters: &FilterSet,
    layout: &OutputLayout,
    naming: &NamingPolicy,
    item: &DatasetItem,
) -> Result<PathBuf, ItemError> {
    let image = open_image(&item.path)
        .map_err(|source| ItemError::UnreadableImage { path: item.path.clone(), source })?;
    let filtered = filters.apply(&image, item.label)?;
    let bytes = encode_image(&filtered, naming.format).map_err(ItemError::Encode)?;

    let class_dir = match dataset.class(item.label) {
        Some(class) => layout.dataset_dir.join(&class.name),
        None => layout.dataset_dir.join(item.label.to_string()),
    };
    std::fs::create_dir_all(&class_dir)
        .map_err(|source| ItemError::Write { path: class_dir.clone(), source })?;

    let target = class_dir.join(naming.filtered_name(item.index));
    std::fs::write(&target, bytes)
        .map_err(|source| ItemError::Write { path: target.clone(), source })?;
    Ok(target)
}

fn write_samples(
    dataset: &Dataset,
    report: &BatchReport,
    samples_dir: &Path,
    naming: &NamingPolicy,
) -> Vec<SampleRecord> {
    if let Err(e) = std::fs::create_dir_all(samples_dir) {
        warn!(dir = %samples_dir.display(), error = %e, "cannot create samples directory");
        return Vec::new();
    }

    let mut samples = Vec::new();
    for class in &dataset.classes {
        let first = report.outcomes.iter()
            .filter(|o| o.label == class.label)
            .find_map(|o| o.result.as_ref().ok().map(|filtered| (o, filtered)));
        let (outcome, filtered_path) = match first {
            Some(found) => found,
            None => continue,
        };

        let original_file = naming.sample_original_name(class.label, &class.name);
        let filtered_file = naming.sample_filtered_name(class.label, &class.name);

        let written = open_image(&outcome.source)
            .map_err(|e| e.to_string())
            .and_then(|img| encode_image(&img, naming.format).map_err(|e| e.to_string()))
            .and_then(|bytes| std::fs::write(samples_dir.join(&original_file), bytes).map_err(|e| e.to_string()))
            .and_then(|_| {
                std::fs::copy(filtered_path, samples_dir.join(&filtered_file))
                    .map(|_| ())
                    .map_err(|e| e.to_string())
            });

        match written {
            Ok(()) => samples.push(SampleRecord {
                label: class.label,
                class_name: class.name.clone(),
                original_file,
                filtered_file,
            }),
            Err(e) => warn!(class = %class.name, error = %e, "failed to write sample pair"),
        }
    }
    samples
}
