use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::error::DatasetError;

/// File extensions (lower-case) treated as images.
pub const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "gif"];

/// A class directory and the label assigned to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassInfo {
    pub label: usize,
    pub name: String,
}

/// One image file of the dataset. Pixels are decoded on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetItem {
    /// Position in dataset order; used for output file names.
    pub index: usize,
    pub label: usize,
    pub path: PathBuf,
}

/// A labeled image dataset laid out as `root/<class_name>/<image files>`.
///
/// Classes are the sorted sub-directory names of `root` and get labels
/// `0..n` in that order. Items are listed class by class, files sorted by
/// name within each class.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub root: PathBuf,
    pub classes: Vec<ClassInfo>,
    pub items: Vec<DatasetItem>,
}

impl Dataset {
    pub fn load(root: &Path) -> Result<Dataset, DatasetError> {
        let class_dirs: Vec<(String, PathBuf)> = sorted_entries(root)?
            .into_iter()
            .filter(|(name, path)| path.is_dir() && !is_hidden(name))
            .collect();

        if class_dirs.is_empty() {
            return Err(DatasetError::NoClasses(root.to_path_buf()));
        }

        let mut classes = Vec::with_capacity(class_dirs.len());
        let mut items = Vec::new();

        for (label, (name, dir)) in class_dirs.into_iter().enumerate() {
            let before = items.len();
            for (file_name, path) in sorted_entries(&dir)? {
                if is_hidden(&file_name) || !path.is_file() || !has_image_extension(&path) {
                    continue;
                }
                items.push(DatasetItem { index: items.len(), label, path });
            }
            debug!(class = %name, label, images = items.len() - before, "loaded class");
            classes.push(ClassInfo { label, name });
        }

        Ok(Dataset { root: root.to_path_buf(), classes, items })
    }

    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn class(&self, label: usize) -> Option<&ClassInfo> {
        self.classes.get(label)
    }

    /// Items of one class, in dataset order.
    pub fn items_of(&self, label: usize) -> impl Iterator<Item = &DatasetItem> {
        self.items.iter().filter(move |item| item.label == label)
    }
}

fn sorted_entries(dir: &Path) -> Result<Vec<(String, PathBuf)>, DatasetError> {
    let read = std::fs::read_dir(dir).map_err(|e| DatasetError::io(dir, e))?;
    let mut entries = Vec::new();
    for entry in read {
        let entry = entry.map_err(|e| DatasetError::io(dir, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        entries.push((name, entry.path()));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries)
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.') || name == "__MACOSX"
}

pub fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| IMAGE_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
        .unwrap_or(false)
}
