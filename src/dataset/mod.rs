pub mod loader;
pub mod archive;

pub use loader::{ClassInfo, Dataset, DatasetItem};
pub use archive::{archive_file_names, extract_archive, pack_directory};
