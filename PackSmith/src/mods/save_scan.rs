//! Finding pack names embedded in save games
//!
//! A save records the packs it was made with as plain ASCII, each name
//! preceded by a NUL byte. Scanning for `.pack` and walking back to that
//! NUL recovers them without parsing the save format.

use std::path::{Path, PathBuf};

use indexmap::IndexSet;

use crate::error::{Error, Result};
use crate::profile::GameProfile;

const PACK_SUFFIX: &[u8] = b".pack";

/// Distinct `\0<name>.pack` strings in `bytes`, in order of first appearance
#[must_use]
pub fn scan_save_bytes(bytes: &[u8]) -> Vec<String> {
    let mut found = IndexSet::new();

    for end in bytes
        .windows(PACK_SUFFIX.len())
        .enumerate()
        .filter(|(_, w)| w.eq_ignore_ascii_case(PACK_SUFFIX))
        .map(|(i, _)| i)
    {
        let mut start = end;
        while start > 0 && is_name_byte(bytes[start - 1]) {
            start -= 1;
        }
        if start == end || start == 0 || bytes[start - 1] != 0 {
            continue;
        }
        let name = &bytes[start..end + PACK_SUFFIX.len()];
        found.insert(String::from_utf8_lossy(name).into_owned());
    }

    found.into_iter().collect()
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_graphic() || b == b' '
}

/// Pack names referenced by a save.
///
/// `save` is a path, or a file name resolved against the profile's save
/// directory.
///
/// # Errors
/// Returns [`Error::InvalidPath`] if the save cannot be located, or an IO
/// error if it cannot be read.
pub fn get_packs_in_save(save: &str, profile: &GameProfile) -> Result<Vec<String>> {
    let path = resolve_save(save, profile)?;
    let bytes = std::fs::read(&path)?;
    let packs = scan_save_bytes(&bytes);
    tracing::info!("{} references {} packs", path.display(), packs.len());
    Ok(packs)
}

fn resolve_save(save: &str, profile: &GameProfile) -> Result<PathBuf> {
    let direct = Path::new(save);
    if direct.is_file() {
        return Ok(direct.to_path_buf());
    }
    profile
        .save_dir
        .as_ref()
        .map(|dir| dir.join(save))
        .filter(|p| p.is_file())
        .ok_or_else(|| Error::InvalidPath(format!("save game not found: {save}")))
}
