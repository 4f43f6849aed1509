//! Collecting pack entries from a directory tree

use std::path::Path;

use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::pack::PackedFile;

/// One entry per regular file below `root`, named by its relative path
/// with backslash separators. Symlinks and `.DS_Store` files are skipped.
///
/// # Errors
/// Returns an error if the tree cannot be walked or a file cannot be read.
pub fn files_from_dir<P: AsRef<Path>>(root: P) -> Result<Vec<PackedFile>> {
    let root = root.as_ref();
    let mut files = Vec::new();

    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() || entry.file_name() == ".DS_Store" {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|_| Error::InvalidPath(entry.path().display().to_string()))?;
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("\\");

        let data = std::fs::read(entry.path())?;
        files.push(PackedFile::from_bytes(name, data));
    }

    tracing::info!("Collected {} files from {}", files.len(), root.display());
    Ok(files)
}
