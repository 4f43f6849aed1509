//! Merging mod packs
//!
//! SPDX-FileCopyrightText: 2025 `PackSmith` contributors
//!
//! SPDX-License-Identifier: MIT

use std::path::{Path, PathBuf};

use indexmap::{IndexMap, IndexSet};

use crate::error::{Error, Result};
use crate::pack::writer::{SortedOptions, WriteRequest, execute};
use crate::pack::{PackedFile, ReadOptions, read_pack};
use crate::profile::GameProfile;

/// Merge `sources` into one new pack at `output`.
///
/// Sources are listed lowest priority first: when two packs hold the same
/// entry (ignoring case), the later pack's entry is kept. Dependencies are
/// the union of every source's list in first-seen order, without the
/// merged packs themselves.
///
/// # Errors
/// Returns [`Error::NothingToMerge`] for an empty source list, or the first
/// error from reading a source or writing the output.
pub fn merge_mods<P: AsRef<Path>>(sources: &[P], output: &Path, profile: &GameProfile) -> Result<PathBuf> {
    if sources.is_empty() {
        return Err(Error::NothingToMerge);
    }

    let mut entries: IndexMap<String, PackedFile> = IndexMap::new();
    let mut dependencies: IndexSet<String> = IndexSet::new();
    let mut merged_names: IndexSet<String> = IndexSet::new();

    for source in sources {
        let pack = read_pack(source.as_ref(), &ReadOptions::with_buffers(), profile)?;
        merged_names.insert(pack.name.to_ascii_lowercase());
        dependencies.extend(pack.dependency_packs.iter().cloned());

        for file in pack.packed_files {
            let key = file.name.to_ascii_lowercase();
            if let Some(previous) = entries.get(&key) {
                tracing::info!("{}: {} overrides the earlier copy of {}", pack.name, file.name, previous.name);
            }
            entries.insert(key, file);
        }
    }

    let dependencies: Vec<String> = dependencies
        .into_iter()
        .filter(|d| !merged_names.contains(&d.to_ascii_lowercase()))
        .collect();

    tracing::info!(
        "Merging {} packs into {} ({} entries)",
        sources.len(),
        output.display(),
        entries.len()
    );

    let summary = execute(
        WriteRequest::NewPack {
            files: entries.into_values().collect(),
            dependencies,
            options: SortedOptions::default(),
        },
        output,
        profile,
    )?;
    Ok(summary.path)
}
