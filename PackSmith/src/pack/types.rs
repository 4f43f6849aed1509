//! Types for PFH5 pack handling
//!
//! SPDX-FileCopyrightText: 2025 `PackSmith` contributors
//!
//! SPDX-License-Identifier: MIT

use std::borrow::Cow;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::collation::compare_names;
use super::{HEADER_BUFFER_LEN, HEADER_SIZE};
use crate::codec::{SchemaField, TableHeader, encode_db, encode_loc};
use crate::error::{Error, Result};
use crate::schema::DbVersion;

/// Extensions read as text when [`ReadOptions::read_text`] is set
pub const TEXT_EXTENSIONS: &[&str] = &["lua", "xml", "json", "txt", "csv", "tsv"];

/// Fixed header of a pack archive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PackHeader {
    pub magic: [u8; 4],
    pub byte_mask: u32,
    /// Written as 0
    pub ref_file_count: u32,
    /// Byte length of the dependency name list
    pub pack_file_index_size: u32,
    /// Number of entries in the file index
    pub pack_file_count: u32,
    /// Byte length of the file index
    pub packed_file_index_size: u32,
    pub header_buffer: [u8; 4],
}

impl PackHeader {
    /// Offset of the first entry body
    #[must_use]
    pub fn data_start(&self) -> u64 {
        HEADER_SIZE
            + HEADER_BUFFER_LEN
            + u64::from(self.pack_file_index_size)
            + u64::from(self.packed_file_index_size)
    }
}

/// What kind of content an entry holds, judged from its path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Db,
    Loc,
    Text,
    Binary,
}

/// One entry of a pack.
///
/// Bodies are loaded lazily: after an index-only read only the name, size,
/// offset and compression flag are set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PackedFile {
    /// Backslash-separated virtual path
    pub name: String,
    /// Stored size in bytes
    pub file_size: u32,
    /// Absolute offset of the stored bytes in the source archive
    pub start_pos: u64,
    pub is_compressed: bool,
    /// Version frame of a DB file
    pub version: Option<i32>,
    /// GUID frame of a DB file
    pub guid: Option<String>,
    /// Schema used to decode `schema_fields`
    pub schema: Option<DbVersion>,
    /// Decoded cells, row-major
    pub schema_fields: Option<Vec<SchemaField>>,
    /// Stored bytes, exactly as they appear in the archive
    pub buffer: Option<Vec<u8>>,
    /// Decoded body of a text-like file
    pub text: Option<String>,
    /// Why decoding this entry failed or stopped early
    pub decode_error: Option<String>,
}

impl PackedFile {
    /// A new uncompressed entry with raw contents
    pub fn from_bytes(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            file_size: u32::try_from(data.len()).unwrap_or(u32::MAX),
            buffer: Some(data),
            ..Self::default()
        }
    }

    /// A new table entry that is serialized from its rows when written
    pub fn from_rows(
        name: impl Into<String>,
        header: &TableHeader,
        schema: DbVersion,
        fields: Vec<SchemaField>,
    ) -> Self {
        Self {
            name: name.into(),
            version: header.version,
            guid: header.guid.clone(),
            schema: Some(schema),
            schema_fields: Some(fields),
            ..Self::default()
        }
    }

    /// Table name for `db\<table>\<file>` paths
    #[must_use]
    pub fn table_name(&self) -> Option<&str> {
        let mut parts = self.name.split('\\');
        let root = parts.next()?;
        if !root.eq_ignore_ascii_case("db") {
            return None;
        }
        parts.next().filter(|table| !table.is_empty())
    }

    #[must_use]
    pub fn is_db(&self) -> bool {
        self.table_name().is_some()
    }

    #[must_use]
    pub fn is_loc(&self) -> bool {
        self.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("loc"))
    }

    #[must_use]
    pub fn is_text(&self) -> bool {
        self.extension()
            .is_some_and(|ext| TEXT_EXTENSIONS.iter().any(|t| ext.eq_ignore_ascii_case(t)))
    }

    #[must_use]
    pub fn kind(&self) -> FileKind {
        if self.is_db() {
            FileKind::Db
        } else if self.is_loc() {
            FileKind::Loc
        } else if self.is_text() {
            FileKind::Text
        } else {
            FileKind::Binary
        }
    }

    fn extension(&self) -> Option<&str> {
        let file_name = self.name.rsplit('\\').next()?;
        file_name.rsplit_once('.').map(|(_, ext)| ext)
    }

    /// Preamble to write in front of re-encoded rows
    #[must_use]
    pub fn table_header(&self) -> TableHeader {
        TableHeader {
            guid: self.guid.clone(),
            version: self.version,
            entry_count: 0,
        }
    }

    /// Bytes to store for this entry and whether they are compressed.
    ///
    /// Decoded rows take precedence over the buffer and are always
    /// written uncompressed. A table whose decoding stopped early is only
    /// written from its stored bytes.
    ///
    /// # Errors
    /// Returns [`Error::TableNotDecoded`] for a partly decoded table without
    /// a buffer and [`Error::MissingFileContent`] if the entry has neither
    /// rows nor a buffer.
    pub fn serialize_body(&self) -> Result<(Cow<'_, [u8]>, bool)> {
        if let Some(message) = &self.decode_error {
            return match &self.buffer {
                Some(buffer) => Ok((Cow::Borrowed(buffer.as_slice()), self.is_compressed)),
                None => Err(Error::TableNotDecoded {
                    file: self.name.clone(),
                    message: message.clone(),
                }),
            };
        }
        if let (Some(fields), Some(schema)) = (&self.schema_fields, &self.schema) {
            let bytes = if self.is_loc() {
                encode_loc(&self.table_header(), fields)?
            } else {
                encode_db(&self.table_header(), schema, fields)?
            };
            return Ok((Cow::Owned(bytes), false));
        }
        match &self.buffer {
            Some(buffer) => Ok((Cow::Borrowed(buffer.as_slice()), self.is_compressed)),
            None => Err(Error::MissingFileContent(self.name.clone())),
        }
    }

    /// Exclusive end offset in the source archive
    #[must_use]
    pub fn end_pos(&self) -> u64 {
        self.start_pos + u64::from(self.file_size)
    }
}

/// A parsed pack archive
#[derive(Debug, Clone)]
pub struct Pack {
    /// File name of the archive
    pub name: String,
    pub path: PathBuf,
    pub header: PackHeader,
    /// Referenced archive names, in index order
    pub dependency_packs: Vec<String>,
    pub packed_files: Vec<PackedFile>,
    /// Size of the archive on disk
    pub size: u64,
    pub last_changed: Option<DateTime<Utc>>,
    /// Whether `packed_files` is in collator order
    pub is_sorted: bool,
}

impl Pack {
    /// Find an entry by exact name. Sorted packs use binary search.
    #[must_use]
    pub fn find_file(&self, name: &str) -> Option<&PackedFile> {
        self.position(name).map(|i| &self.packed_files[i])
    }

    pub fn find_file_mut(&mut self, name: &str) -> Option<&mut PackedFile> {
        self.position(name).map(|i| &mut self.packed_files[i])
    }

    fn position(&self, name: &str) -> Option<usize> {
        if self.is_sorted {
            self.packed_files
                .binary_search_by(|f| compare_names(&f.name, name))
                .ok()
        } else {
            self.packed_files.iter().position(|f| f.name == name)
        }
    }

    /// DB and Loc entries
    pub fn tables(&self) -> impl Iterator<Item = &PackedFile> {
        self.packed_files.iter().filter(|f| f.is_db() || f.is_loc())
    }

    #[must_use]
    pub fn file_count(&self) -> usize {
        self.packed_files.len()
    }
}

/// Controls how much of each entry [`read_pack`](super::read_pack) loads
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    /// Read the index only; no entry bodies are touched
    pub skip_table_parsing: bool,
    /// Only load bodies for these entries, kept in collator order
    files_to_read: Option<Vec<String>>,
    /// Decode text-like files and Loc tables
    pub read_text: bool,
    /// Decode DB tables into rows
    pub decode_tables: bool,
    /// Keep stored bytes in [`PackedFile::buffer`]
    pub load_buffers: bool,
    /// Keep entries in on-disk index order
    pub skip_sorting: bool,
}

impl ReadOptions {
    /// Index only
    #[must_use]
    pub fn index_only() -> Self {
        Self {
            skip_table_parsing: true,
            ..Self::default()
        }
    }

    /// Index plus stored bytes, no decoding
    #[must_use]
    pub fn with_buffers() -> Self {
        Self {
            skip_table_parsing: true,
            load_buffers: true,
            ..Self::default()
        }
    }

    /// Decode tables and text
    #[must_use]
    pub fn full() -> Self {
        Self {
            read_text: true,
            decode_tables: true,
            ..Self::default()
        }
    }

    /// Only load the bodies of `names`
    #[must_use]
    pub fn files(mut self, mut names: Vec<String>) -> Self {
        names.sort_by(|a, b| compare_names(a, b));
        names.dedup();
        self.files_to_read = Some(names);
        self
    }

    /// Entries selected by [`files`](Self::files), in collator order
    #[must_use]
    pub fn files_to_read(&self) -> Option<&[String]> {
        self.files_to_read.as_deref()
    }

    /// Whether the entry body is needed at all
    pub(crate) fn wants_body(&self, file: &PackedFile) -> bool {
        if self.skip_table_parsing && !self.load_buffers {
            return false;
        }
        match &self.files_to_read {
            Some(names) => names
                .binary_search_by(|n| compare_names(n, &file.name))
                .is_ok(),
            None => true,
        }
    }
}
