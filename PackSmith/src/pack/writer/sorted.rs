//! Fresh packs: every entry serialized, index in collator order

use std::borrow::Cow;

use indexmap::IndexMap;

use super::header::PlannedEntry;
use crate::compression::compress_entry;
use crate::error::Result;
use crate::pack::{PackedFile, compare_names};

/// Options for the Sorted strategy
#[derive(Debug, Clone, Copy, Default)]
pub struct SortedOptions {
    /// Place `db\` entries before everything else
    pub db_first: bool,
    /// Zstd level for entries that are not already compressed
    pub compression_level: Option<i32>,
}

/// Order and serialize `files` for a new pack.
///
/// Entries whose names differ only by case are duplicates; the last one
/// given wins.
pub(crate) fn plan_sorted<'a>(files: &'a [PackedFile], options: &SortedOptions) -> Result<Vec<PlannedEntry<'a>>> {
    let mut unique: IndexMap<String, &PackedFile> = IndexMap::with_capacity(files.len());
    for file in files {
        if let Some(previous) = unique.insert(file.name.to_ascii_lowercase(), file) {
            tracing::debug!("{} replaces earlier {}", file.name, previous.name);
        }
    }

    let mut ordered: Vec<&PackedFile> = unique.into_values().collect();
    ordered.sort_by(|a, b| compare_names(&a.name, &b.name));
    if options.db_first {
        ordered.sort_by_key(|f| !f.is_db());
    }

    ordered
        .into_iter()
        .map(|file| {
            let (bytes, is_compressed) = file.serialize_body()?;
            match options.compression_level {
                Some(level) if !is_compressed && !bytes.is_empty() => {
                    let framed = compress_entry(&bytes, level)?;
                    PlannedEntry::from_bytes(file.name.as_str(), Cow::Owned(framed), true)
                }
                _ => PlannedEntry::from_bytes(file.name.as_str(), bytes, is_compressed),
            }
        })
        .collect()
}
