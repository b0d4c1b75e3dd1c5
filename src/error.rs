use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while generating or applying class filters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    /// Parameters that would yield a malformed or degenerate kernel.
    #[error("invalid filter parameter: {0}")]
    InvalidParameter(String),
    /// A label with no kernel in the filter set.
    #[error("unknown class label {label} (filter set holds {num_classes} classes)")]
    UnknownLabel { label: usize, num_classes: usize },
}

/// Errors raised while loading, unpacking or packing a dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("malformed archive: {0}")]
    MalformedArchive(#[source] zip::result::ZipError),
    #[error("archive expands past the {limit} byte limit")]
    ArchiveTooLarge { limit: u64 },
    #[error("no class directories found under {}", .0.display())]
    NoClasses(PathBuf),
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to walk dataset tree: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("failed to write archive: {0}")]
    Pack(#[source] zip::result::ZipError),
}

impl DatasetError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DatasetError::Io { path: path.into(), source }
    }
}

/// Failure of a single dataset item. Never aborts the batch.
#[derive(Debug, Error)]
pub enum ItemError {
    #[error("unreadable image {}: {source}", path.display())]
    UnreadableImage {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error(transparent)]
    Filter(#[from] FilterError),
    #[error("failed to encode image: {0}")]
    Encode(#[source] image::ImageError),
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Job-level failures. Any of these discards the whole job.
#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Filter(#[from] FilterError),
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error("failed to prepare working directory: {0}")]
    WorkDir(#[source] std::io::Error),
}

impl JobError {
    /// Whether the failure was caused by the caller's input rather than the host.
    pub fn is_client_error(&self) -> bool {
        match self {
            JobError::Filter(FilterError::InvalidParameter(_)) => true,
            JobError::Dataset(DatasetError::MalformedArchive(_))
            | JobError::Dataset(DatasetError::ArchiveTooLarge { .. })
            | JobError::Dataset(DatasetError::NoClasses(_)) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter directive: {0}")]
    Directive(#[from] tracing_subscriber::filter::ParseError),
    #[error("global subscriber already installed: {0}")]
    AlreadyInitialised(#[from] tracing_subscriber::util::TryInitError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_archive_is_a_client_error() {
        let err = JobError::from(DatasetError::MalformedArchive(
            zip::result::ZipError::InvalidArchive("bad"),
        ));
        assert!(err.is_client_error());
    }

    #[test]
    fn io_failures_are_server_errors() {
        let err = JobError::from(DatasetError::io(
            "/tmp/x",
            std::io::Error::new(std::io::ErrorKind::Other, "disk"),
        ));
        assert!(!err.is_client_error());
    }
}
