use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::ItemError;

/// Result of filtering one dataset item.
#[derive(Debug)]
pub struct ItemOutcome {
    pub index: usize,
    pub label: usize,
    pub source: PathBuf,
    /// Path of the written filtered image, or why the item failed.
    pub result: Result<PathBuf, ItemError>,
}

impl ItemOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// One original/filtered preview pair. File names are relative to the samples directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SampleRecord {
    pub label: usize,
    pub class_name: String,
    pub original_file: String,
    pub filtered_file: String,
}

/// Serializable view of a failed item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureSummary {
    pub file: String,
    pub error: String,
}

/// Per-item outcomes of a dataset run, in dataset order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<ItemOutcome>,
    pub samples: Vec<SampleRecord>,
}

impl BatchReport {
    pub fn processed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_ok()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ItemOutcome> {
        self.outcomes.iter().filter(|o| !o.is_ok())
    }

    /// Failed items with paths shown relative to `root` where possible.
    pub fn failure_summaries(&self, root: &Path) -> Vec<FailureSummary> {
        self.failures()
            .filter_map(|o| {
                let err = o.result.as_ref().err()?;
                let file = o.source.strip_prefix(root).unwrap_or(&o.source);
                Some(FailureSummary {
                    file: file.to_string_lossy().replace('\\', "/"),
                    error: err.to_string(),
                })
            })
            .collect()
    }
}
