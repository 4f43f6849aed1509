//! Error types for `PackSmith`
//!
//! SPDX-FileCopyrightText: 2025 `PackSmith` contributors
//!
//! SPDX-License-Identifier: MIT

use std::path::PathBuf;

use thiserror::Error;

/// The error type for `PackSmith` operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== IO Errors ====================
    /// IO error from file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ==================== Pack Archive Errors ====================
    /// The file is not a valid Pack archive (missing PFH5 magic).
    #[error("invalid Pack magic: expected PFH5, found {0:?}")]
    InvalidPackMagic([u8; 4]),

    /// The archive ended before a section that the header promised.
    #[error("truncated pack: {context} (needed {needed} bytes, {available} available)")]
    Truncated {
        /// Which section was being read.
        context: String,
        /// Bytes required to finish the section.
        needed: u64,
        /// Bytes actually left in the source.
        available: u64,
    },

    /// An index entry points outside the data section.
    #[error("entry {name} at {start_pos}+{file_size} lies outside the {pack_size}-byte archive")]
    EntryOutOfBounds {
        /// Virtual path of the entry.
        name: String,
        /// Start offset computed from the index.
        start_pos: u64,
        /// Declared size of the entry.
        file_size: u32,
        /// Total size of the archive on disk.
        pack_size: u64,
    },

    /// An index entry name is not NUL-terminated within the index.
    #[error("unterminated entry name in pack index at byte {offset}")]
    UnterminatedName {
        /// Byte offset into the packed-file index.
        offset: usize,
    },

    /// The requested file was not found in the Pack.
    #[error("file not found in pack: {0}")]
    FileNotFoundInPack(String),

    /// The packed file carries neither raw bytes nor decoded rows to write.
    #[error("packed file {0} has no buffer or decoded rows to serialize")]
    MissingFileContent(String),

    /// Pack contains more entries or bytes than the index fields can express.
    #[error("pack too large: {0}")]
    PackTooLarge(String),

    // ==================== Field Codec Errors ====================
    /// A marker frame in a DB file could not be parsed.
    #[error("bad frame in {file}: {message}")]
    BadFrame {
        /// Virtual path of the DB file.
        file: String,
        /// What went wrong.
        message: String,
    },

    /// Decoding ran out of bytes in the middle of a field.
    #[error("unexpected end of data decoding {field_type} at byte {offset}")]
    UnexpectedEof {
        /// Field type being decoded.
        field_type: String,
        /// Position in the file body.
        offset: u64,
    },

    /// A string field declared a negative length.
    #[error("negative string length {length} at byte {offset}")]
    NegativeLength {
        /// Length read from the data.
        length: i16,
        /// Position in the file body.
        offset: u64,
    },

    /// A value does not fit the column it is written to.
    #[error("cannot store {value} in a {field_type} column")]
    ValueTypeMismatch {
        /// Field type of the column.
        field_type: String,
        /// Rendered value that was rejected.
        value: String,
    },

    /// A string is too long for its int16 length prefix.
    #[error("string of {len} units exceeds the int16 length prefix")]
    StringTooLong {
        /// Length in code units.
        len: usize,
    },

    /// The Loc header is missing its BOM or `LOC` tag.
    #[error("invalid Loc header in {0}")]
    InvalidLocHeader(String),

    /// Decoded field count is not a whole number of rows.
    #[error("{fields} fields do not divide into rows of {width}")]
    PartialRow {
        /// Number of decoded fields.
        fields: usize,
        /// Schema width.
        width: usize,
    },

    // ==================== Schema Errors ====================
    /// No schema is registered for the table.
    #[error("no schema for table {0}")]
    SchemaNotFound(String),

    /// A field type name in a schema file is unknown.
    #[error("unknown field type: {0}")]
    UnknownFieldType(String),

    // ==================== Compression Errors ====================
    /// Zstd decompression failed.
    #[error("zstd decompression failed: {message}")]
    DecompressionFailed {
        /// The error message.
        message: String,
    },

    /// Zstd compression failed.
    #[error("zstd compression failed: {message}")]
    CompressionFailed {
        /// The error message.
        message: String,
    },

    // ==================== Overwrite Errors ====================
    /// An overwrite refers to a column past the end of the schema.
    #[error("overwrite on {file} references column {index} but rows have {width} columns")]
    OverwriteColumnOutOfRange {
        /// Target table file.
        file: String,
        /// Offending column index.
        index: usize,
        /// Schema width.
        width: usize,
    },

    /// `column_indices` and `column_values` have different lengths.
    #[error("overwrite on {file} has {indices} column indices but {values} values")]
    OverwriteKeyMismatch {
        /// Target table file.
        file: String,
        /// Number of column indices.
        indices: usize,
        /// Number of column values.
        values: usize,
    },

    /// An EDIT overwrite is missing its target column or value.
    #[error("EDIT overwrite on {0} needs both overwrite_index and overwrite_data")]
    IncompleteEdit(String),

    /// The target table could not be decoded completely.
    #[error("table {file} could not be fully decoded: {message}")]
    TableNotDecoded {
        /// Target table file.
        file: String,
        /// Underlying decode error.
        message: String,
    },

    // ==================== Write Path Errors ====================
    /// Moving a staged file over the target failed.
    #[error("failed to replace {target}: {message}")]
    AtomicReplaceFailed {
        /// Path that was meant to be replaced.
        target: PathBuf,
        /// Error message from the move.
        message: String,
    },

    /// Merge was called without any source packs.
    #[error("no packs to merge")]
    NothingToMerge,

    // ==================== Config Errors ====================
    /// The game profile could not be parsed.
    #[error("invalid game profile {path}: {message}")]
    InvalidProfile {
        /// Profile path.
        path: PathBuf,
        /// Parse error message.
        message: String,
    },

    /// JSON parsing or serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    // ==================== File System Errors ====================
    /// Invalid file path.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Directory traversal error.
    #[error("directory walk error: {0}")]
    WalkDirError(String),
}

impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Self {
        Error::WalkDirError(err.to_string())
    }
}

impl Error {
    /// True for errors that mean the archive itself is structurally unusable.
    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Error::InvalidPackMagic(_)
                | Error::Truncated { .. }
                | Error::EntryOutOfBounds { .. }
                | Error::UnterminatedName { .. }
        )
    }
}

/// A specialized Result type for `PackSmith` operations.
pub type Result<T> = std::result::Result<T, Error>;
