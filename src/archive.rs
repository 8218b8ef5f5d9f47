// Report archive builder
//
// Packs a rendered report directory into a single zip next to it. File contents are
// streamed into the compressor one at a time.

use crate::utils::FileUtils;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter, result::ZipError};

/// Extension appended to the source directory name
pub const ARCHIVE_EXTENSION: &str = "zip";

/// Deflate level used for every entry
const COMPRESSION_LEVEL: i64 = 9;

/// Entries at or above this size need zip64 headers
const LARGE_FILE_THRESHOLD: u64 = u32::MAX as u64;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("report directory does not exist: {}", .0.display())]
    SourceMissing(PathBuf),

    #[error("cannot derive an archive name from {}", .0.display())]
    InvalidSource(PathBuf),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to walk report directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("compression stream failed: {0}")]
    Zip(#[from] ZipError),

    #[error("archive task did not complete: {0}")]
    Task(String),
}

impl ArchiveError {
    fn io(path: &Path) -> impl FnOnce(io::Error) -> Self + '_ {
        move |source| Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Archive location for `source`: a sibling file named `<dir>.zip`
pub fn archive_path_for(source: &Path) -> Result<PathBuf, ArchiveError> {
    let name = source
        .file_name()
        .ok_or_else(|| ArchiveError::InvalidSource(source.to_path_buf()))?;
    let mut file_name = name.to_os_string();
    file_name.push(".");
    file_name.push(ARCHIVE_EXTENSION);
    Ok(source.with_file_name(file_name))
}

/// Build a compressed archive of everything under `source`.
///
/// Entries are stored relative to `source` with no wrapping directory. Any file
/// already at the archive path is overwritten. The caller owns the returned file.
pub fn build_archive(source: &Path) -> Result<PathBuf, ArchiveError> {
    if !source.is_dir() {
        return Err(ArchiveError::SourceMissing(source.to_path_buf()));
    }

    // "." and ".." have no name of their own
    let source = if source.file_name().is_none() {
        std::fs::canonicalize(source).map_err(ArchiveError::io(source))?
    } else {
        source.to_path_buf()
    };

    let dest = archive_path_for(&source)?;
    match write_archive(&source, &dest) {
        Ok(entries) => {
            debug!(
                source = %source.display(),
                archive = %dest.display(),
                entries,
                "report archive written"
            );
            Ok(dest)
        }
        Err(e) => {
            // Never leave a truncated archive behind
            let _ = std::fs::remove_file(&dest);
            Err(e)
        }
    }
}

fn write_archive(source: &Path, dest: &Path) -> Result<usize, ArchiveError> {
    let file = File::create(dest).map_err(ArchiveError::io(dest))?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(COMPRESSION_LEVEL));

    let mut entries = 0;
    for entry in FileUtils::walk_tree(source) {
        let entry = entry?;
        if entry.is_dir {
            zip.add_directory(entry.relative, options)?;
        } else {
            let mut input = File::open(&entry.path).map_err(ArchiveError::io(&entry.path))?;
            let large = FileUtils::file_size(&entry.path)
                .is_some_and(|len| len >= LARGE_FILE_THRESHOLD);
            zip.start_file(entry.relative, options.large_file(large))?;
            io::copy(&mut input, &mut zip).map_err(ArchiveError::io(&entry.path))?;
        }
        entries += 1;
    }

    let mut writer = zip.finish()?;
    writer.flush().map_err(ArchiveError::io(dest))?;
    Ok(entries)
}
