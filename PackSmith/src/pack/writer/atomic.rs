//! Stage-then-replace for pack output

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{Error, Result};

/// Write a new file through `write` and move it over `target` only after
/// `write` succeeds.
///
/// An existing target is copied to a backup first and restored if the
/// final move fails. The staged file lives next to the target so the move
/// is a rename on the same filesystem.
///
/// # Errors
/// Propagates any error from `write`; returns
/// [`Error::AtomicReplaceFailed`] if the staged file cannot be moved.
pub fn write_atomically<T, F>(target: &Path, write: F) -> Result<T>
where
    F: FnOnce(&mut BufWriter<&File>) -> Result<T>,
{
    let parent = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent)?;

    let staged = tempfile::Builder::new()
        .prefix(".packsmith-")
        .suffix(".tmp")
        .tempfile_in(&parent)?;

    let value = {
        let mut out = BufWriter::new(staged.as_file());
        let value = write(&mut out)?;
        out.into_inner().map_err(std::io::IntoInnerError::into_error)?;
        value
    };
    staged.as_file().sync_all()?;

    let backup = backup_target(target, &parent)?;
    match staged.persist(target) {
        Ok(_) => {
            tracing::debug!("Replaced {}", target.display());
            Ok(value)
        }
        Err(e) => {
            let message = e.error.to_string();
            if let Some(backup) = &backup {
                match std::fs::copy(backup.path(), target) {
                    Ok(_) => tracing::warn!("Restored {} from backup", target.display()),
                    Err(restore) => tracing::warn!("Failed to restore {}: {restore}", target.display()),
                }
            }
            Err(Error::AtomicReplaceFailed {
                target: target.to_path_buf(),
                message,
            })
        }
    }
}

/// Copy an existing target aside; the copy is deleted when dropped
fn backup_target(target: &Path, parent: &Path) -> Result<Option<NamedTempFile>> {
    if !target.is_file() {
        return Ok(None);
    }
    let backup = tempfile::Builder::new()
        .prefix(".packsmith-")
        .suffix(".bak")
        .tempfile_in(parent)?;
    std::fs::copy(target, backup.path())?;
    Ok(Some(backup))
}
