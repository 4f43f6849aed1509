//! Fast-Append: copy an existing pack and add entries after it

use std::borrow::Cow;
use std::collections::HashSet;

use super::header::{EntrySource, PlannedEntry};
use crate::error::Result;
use crate::pack::{Pack, PackedFile};

/// Entries of `existing` copied verbatim, followed by `files`.
///
/// With `replace_duplicates`, existing entries whose name matches an
/// incoming file (ignoring case) are left out so the new version wins.
pub(crate) fn plan_append<'a>(
    existing: &'a Pack,
    files: &'a [PackedFile],
    replace_duplicates: bool,
) -> Result<Vec<PlannedEntry<'a>>> {
    let incoming: HashSet<String> = if replace_duplicates {
        files.iter().map(|f| f.name.to_ascii_lowercase()).collect()
    } else {
        HashSet::new()
    };

    let mut entries = Vec::with_capacity(existing.packed_files.len() + files.len());
    let mut replaced = 0usize;
    for file in &existing.packed_files {
        if replace_duplicates && incoming.contains(&file.name.to_ascii_lowercase()) {
            replaced += 1;
            continue;
        }
        entries.push(PlannedEntry {
            name: Cow::Borrowed(file.name.as_str()),
            size: file.file_size,
            is_compressed: file.is_compressed,
            source: EntrySource::Copy {
                start_pos: file.start_pos,
            },
        });
    }

    for file in files {
        let (bytes, is_compressed) = file.serialize_body()?;
        entries.push(PlannedEntry::from_bytes(file.name.as_str(), bytes, is_compressed)?);
    }

    tracing::debug!(
        "Appending {} entries to {} ({} replaced)",
        files.len(),
        existing.name,
        replaced
    );
    Ok(entries)
}
