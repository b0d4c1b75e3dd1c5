pub mod root;
pub mod preview;
pub mod dataset;
pub mod static_files;
