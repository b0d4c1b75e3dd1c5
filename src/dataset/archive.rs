use std::fs::File;
use std::io::{Cursor, Read, Write};
use std::path::Path;

use tracing::{debug, warn};
use walkdir::WalkDir;
use zip::result::ZipError;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::DatasetError;

/// Unpacks a zip held in memory into `dest`.
///
/// Entries whose path would land outside `dest` are skipped. Extraction stops
/// with `ArchiveTooLarge` once more than `max_total_bytes` have been written.
/// Returns the number of files written.
pub fn extract_archive(bytes: &[u8], dest: &Path, max_total_bytes: u64) -> Result<usize, DatasetError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(DatasetError::MalformedArchive)?;
    let mut written: u64 = 0;
    let mut files = 0;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(DatasetError::MalformedArchive)?;
        let rel = match entry.enclosed_name() {
            Some(p) => p.to_path_buf(),
            None => {
                warn!(entry = entry.name(), "skipping archive entry outside the extraction root");
                continue;
            }
        };
        let target = dest.join(&rel);

        if entry.is_dir() {
            std::fs::create_dir_all(&target).map_err(|e| DatasetError::io(&target, e))?;
            continue;
        }
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DatasetError::io(parent, e))?;
        }

        let mut out = File::create(&target).map_err(|e| DatasetError::io(&target, e))?;
        written += copy_bounded(&mut entry, &mut out, &target, max_total_bytes - written, max_total_bytes)?;
        files += 1;
    }

    debug!(files, bytes = written, "extracted archive");
    Ok(files)
}

/// Copies at most `budget` bytes. Read failures mean a corrupt entry.
fn copy_bounded<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    target: &Path,
    budget: u64,
    limit: u64,
) -> Result<u64, DatasetError> {
    let mut buf = [0u8; 64 * 1024];
    let mut copied: u64 = 0;
    loop {
        let n = reader
            .read(&mut buf)
            .map_err(|e| DatasetError::MalformedArchive(ZipError::Io(e)))?;
        if n == 0 {
            return Ok(copied);
        }
        copied += n as u64;
        if copied > budget {
            return Err(DatasetError::ArchiveTooLarge { limit });
        }
        writer.write_all(&buf[..n]).map_err(|e| DatasetError::io(target, e))?;
    }
}

/// Zips every file and directory below `dir` into an in-memory archive.
///
/// Entry names are relative to `dir` and always use `/` separators.
pub fn pack_directory(dir: &Path) -> Result<Vec<u8>, DatasetError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in WalkDir::new(dir).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        let rel = match entry.path().strip_prefix(dir) {
            Ok(rel) => rel,
            Err(_) => continue,
        };
        let name = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");

        if entry.file_type().is_dir() {
            writer.add_directory(name, options).map_err(DatasetError::Pack)?;
        } else if entry.file_type().is_file() {
            writer.start_file(name, options).map_err(DatasetError::Pack)?;
            let mut file = File::open(entry.path()).map_err(|e| DatasetError::io(entry.path(), e))?;
            std::io::copy(&mut file, &mut writer).map_err(|e| DatasetError::io(entry.path(), e))?;
        }
    }

    let cursor = writer.finish().map_err(DatasetError::Pack)?;
    Ok(cursor.into_inner())
}

/// Names of the file entries in a zip, in archive order.
pub fn archive_file_names(bytes: &[u8]) -> Result<Vec<String>, DatasetError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(DatasetError::MalformedArchive)?;
    let mut names = Vec::new();
    for i in 0..archive.len() {
        let entry = archive.by_index(i).map_err(DatasetError::MalformedArchive)?;
        if !entry.is_dir() {
            names.push(entry.name().to_owned());
        }
    }
    Ok(names)
}
