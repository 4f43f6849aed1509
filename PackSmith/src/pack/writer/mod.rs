//! SPDX-FileCopyrightText: 2025 `PackSmith` contributors
//!
//! SPDX-License-Identifier: MIT
//!
//! Pack writers
//!
//! Three strategies share one header contract and one output path:
//!
//! - **Sorted**: a brand-new pack, every entry serialized, collator order
//! - **Fast-Append**: an existing pack copied verbatim with entries added
//! - **Row-Overwrite**: an existing pack with row edits applied to tables
//!
//! All output is staged next to the target and moved into place only
//! after the whole pack was written.

mod append;
mod atomic;
pub mod buffer_pool;
mod folder;
mod header;
mod overwrite;
mod sorted;
pub mod stream;

use std::fs::File;
use std::io::{BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

pub use atomic::write_atomically;
pub use buffer_pool::{BufferPool, BufferPoolStats};
pub use folder::files_from_dir;
pub use overwrite::{Overwrite, OverwriteOperation, OverwriteStats, apply_overwrites};
pub use sorted::SortedOptions;
pub use stream::StreamingWriter;

use header::{EntrySource, PlannedEntry, build_header, write_preamble};

use crate::error::{Error, Result};
use crate::pack::{Pack, PackedFile, ReadOptions, read_pack};
use crate::profile::GameProfile;

/// Which writer to run, with its inputs
#[derive(Debug)]
pub enum WriteRequest<'a> {
    NewPack {
        files: Vec<PackedFile>,
        dependencies: Vec<String>,
        options: SortedOptions,
    },
    AppendTo {
        existing: &'a Pack,
        files: Vec<PackedFile>,
        replace_duplicates: bool,
        /// Defaults to the existing pack's dependencies
        dependencies: Option<Vec<String>>,
    },
    OverwriteRows {
        existing: &'a Pack,
        overwrites: Vec<Overwrite>,
    },
}

impl WriteRequest<'_> {
    #[must_use]
    pub fn strategy(&self) -> &'static str {
        match self {
            WriteRequest::NewPack { .. } => "sorted",
            WriteRequest::AppendTo { .. } => "fast-append",
            WriteRequest::OverwriteRows { .. } => "row-overwrite",
        }
    }
}

/// What a write produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteSummary {
    pub path: PathBuf,
    pub strategy: &'static str,
    pub file_count: usize,
    pub bytes_written: u64,
}

/// Run one write request against `target`
///
/// # Errors
/// Returns an error if an entry cannot be serialized, the source pack
/// cannot be read, or the output cannot be written or moved into place.
pub fn execute(request: WriteRequest<'_>, target: &Path, profile: &GameProfile) -> Result<WriteSummary> {
    let strategy = request.strategy();
    tracing::info!("Writing {} ({strategy})", target.display());

    let with_flag = profile.index_has_compression_flag;
    let summary = match request {
        WriteRequest::NewPack {
            files,
            dependencies,
            options,
        } => {
            let entries = sorted::plan_sorted(&files, &options)?;
            emit(target, &dependencies, &entries, None, with_flag)?
        }
        WriteRequest::AppendTo {
            existing,
            files,
            replace_duplicates,
            dependencies,
        } => {
            let dependencies = dependencies.unwrap_or_else(|| existing.dependency_packs.clone());
            let entries = append::plan_append(existing, &files, replace_duplicates)?;
            emit(target, &dependencies, &entries, Some(&existing.path), with_flag)?
        }
        WriteRequest::OverwriteRows { existing, overwrites } => {
            let tables = overwrite::build_overwritten_tables(existing, &overwrites, profile)?;
            let entries = append::plan_append(existing, &tables, true)?;
            emit(
                target,
                &existing.dependency_packs,
                &entries,
                Some(&existing.path),
                with_flag,
            )?
        }
    };

    tracing::info!(
        "Wrote {} entries, {} bytes to {}",
        summary.0,
        summary.1,
        target.display()
    );
    Ok(WriteSummary {
        path: target.to_path_buf(),
        strategy,
        file_count: summary.0,
        bytes_written: summary.1,
    })
}

/// Write `files` to `target`: Sorted for a new pack, Fast-Append when an
/// existing pack is given.
///
/// # Errors
/// See [`execute`].
pub fn write_pack(
    files: Vec<PackedFile>,
    target: &Path,
    existing: Option<&Pack>,
    replace_duplicates: bool,
    dependencies: Option<Vec<String>>,
    profile: &GameProfile,
) -> Result<WriteSummary> {
    let request = match existing {
        Some(existing) => WriteRequest::AppendTo {
            existing,
            files,
            replace_duplicates,
            dependencies,
        },
        None => WriteRequest::NewPack {
            files,
            dependencies: dependencies.unwrap_or_default(),
            options: SortedOptions::default(),
        },
    };
    execute(request, target, profile)
}

/// Copy `src` to `dst` with `overwrites` applied to its tables
///
/// # Errors
/// See [`execute`].
pub fn create_overwrite_pack(
    src: &Path,
    dst: &Path,
    overwrites: &[Overwrite],
    profile: &GameProfile,
) -> Result<WriteSummary> {
    let existing = read_pack(src, &ReadOptions::index_only(), profile)?;
    execute(
        WriteRequest::OverwriteRows {
            existing: &existing,
            overwrites: overwrites.to_vec(),
        },
        dst,
        profile,
    )
}

/// Stage and move the finished pack; returns (entry count, bytes)
fn emit(
    target: &Path,
    dependencies: &[String],
    entries: &[PlannedEntry<'_>],
    source: Option<&Path>,
    with_flag: bool,
) -> Result<(usize, u64)> {
    let header = build_header(dependencies, entries, with_flag)?;

    let needs_source = entries
        .iter()
        .any(|e| matches!(e.source, EntrySource::Copy { .. }));
    let mut source_reader = match source {
        Some(path) if needs_source => Some(BufReader::new(File::open(path)?)),
        _ => None,
    };

    let bytes = write_atomically(target, |out| {
        write_preamble(out, &header, dependencies, entries, with_flag)?;

        let mut stream = StreamingWriter::new(&mut *out);
        for entry in entries {
            match &entry.source {
                EntrySource::Bytes(bytes) => stream.write_file(bytes)?,
                EntrySource::Copy { start_pos } => {
                    let reader = source_reader
                        .as_mut()
                        .ok_or_else(|| Error::MissingFileContent(entry.name.to_string()))?;
                    reader.seek(SeekFrom::Start(*start_pos))?;
                    stream.copy_from(reader, u64::from(entry.size))?;
                }
            }
        }
        let body = stream.bytes_written();
        stream.finish()?.flush()?;
        Ok(header.data_start() + body)
    })?;

    Ok((entries.len(), bytes))
}
