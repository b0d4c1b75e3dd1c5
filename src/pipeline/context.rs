use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::imaging::OutputFormat;
use crate::kernel::FilterParams;

/// How output files are named and encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NamingPolicy {
    pub format: OutputFormat,
}

impl NamingPolicy {
    pub fn new(format: OutputFormat) -> Self {
        NamingPolicy { format }
    }

    /// File name of a filtered dataset item, placed under its class directory.
    pub fn filtered_name(&self, index: usize) -> String {
        format!("filtered_{}.{}", index, self.format.extension())
    }

    pub fn sample_original_name(&self, label: usize, class_name: &str) -> String {
        format!("original_{}_{}.{}", label, safe_file_component(class_name), self.format.extension())
    }

    pub fn sample_filtered_name(&self, label: usize, class_name: &str) -> String {
        format!("filtered_{}_{}.{}", label, safe_file_component(class_name), self.format.extension())
    }
}

/// Keeps `[A-Za-z0-9._-]`, maps everything else to `_`.
pub fn safe_file_component(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' })
        .collect();
    cleaned.trim_start_matches('.').to_owned()
}

/// Where one job writes its output.
///
/// - `dataset_dir` : root of the filtered dataset, one sub-directory per class
/// - `samples_dir` : optional directory receiving one original/filtered pair per class
#[derive(Debug, Clone)]
pub struct OutputLayout {
    pub dataset_dir: PathBuf,
    pub samples_dir: Option<PathBuf>,
}

/// Everything a dataset job needs besides its input and random source.
#[derive(Debug, Clone)]
pub struct JobSpec {
    pub params: FilterParams,
    /// Worker threads used for per-image filtering.
    pub workers: usize,
    pub naming: NamingPolicy,
    pub samples_dir: Option<PathBuf>,
    pub max_extracted_bytes: u64,
}

impl JobSpec {
    pub fn new(params: FilterParams) -> Self {
        JobSpec { params, ..JobSpec::default() }
    }
}

impl Default for JobSpec {
    fn default() -> Self {
        JobSpec {
            params: FilterParams::default(),
            workers: 1,
            naming: NamingPolicy::default(),
            samples_dir: None,
            max_extracted_bytes: 1 << 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_follow_the_output_format() {
        let jpeg = NamingPolicy::default();
        assert_eq!(jpeg.filtered_name(12), "filtered_12.jpg");
        let png = NamingPolicy::new(OutputFormat::Png);
        assert_eq!(png.sample_original_name(1, "dogs"), "original_1_dogs.png");
        assert_eq!(png.sample_filtered_name(1, "dogs"), "filtered_1_dogs.png");
    }

    #[test]
    fn unsafe_characters_are_replaced() {
        assert_eq!(safe_file_component("sea lions/../x"), "sea_lions_.._x");
        assert_eq!(safe_file_component("..hidden"), "hidden");
        assert_eq!(safe_file_component("кот"), "___");
    }
}
