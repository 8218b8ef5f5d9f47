// Report directory file utilities

use std::path::{Path, PathBuf};

/// Entry page of an HTML test report
pub const REPORT_ENTRY_FILE: &str = "index.html";

/// One filesystem entry below a report root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    /// Absolute (or caller-relative) path on disk
    pub path: PathBuf,
    /// Path relative to the walked root, always `/`-separated
    pub relative: String,
    pub is_dir: bool,
}

/// File utilities for report directories
pub struct FileUtils;

impl FileUtils {
    /// Path of the report's entry page inside `report_dir`
    pub fn report_entry(report_dir: &Path) -> PathBuf {
        report_dir.join(REPORT_ENTRY_FILE)
    }

    /// Walk every file and subdirectory under `root`, excluding the root itself.
    ///
    /// Entries are yielded in sorted order so archives are reproducible.
    pub fn walk_tree(
        root: &Path,
    ) -> impl Iterator<Item = Result<TreeEntry, walkdir::Error>> + '_ {
        walkdir::WalkDir::new(root)
            .min_depth(1)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .map(move |entry| {
                let entry = entry?;
                let relative = Self::relative_name(root, entry.path());
                Ok(TreeEntry {
                    path: entry.path().to_path_buf(),
                    relative,
                    is_dir: entry.file_type().is_dir(),
                })
            })
    }

    /// Total size in bytes of all regular files under `root`
    pub fn tree_size(root: &Path) -> u64 {
        walkdir::WalkDir::new(root)
            .into_iter()
            .flatten()
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| e.metadata().ok())
            .map(|m| m.len())
            .sum()
    }

    /// Size of a single file, if it can be read
    pub fn file_size(path: &Path) -> Option<u64> {
        std::fs::metadata(path).ok().map(|m| m.len())
    }

    fn relative_name(root: &Path, path: &Path) -> String {
        let rel = path.strip_prefix(root).unwrap_or(path);
        rel.components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}
