//! Schema registry for DB and Loc tables
//!
//! SPDX-FileCopyrightText: 2025 `PackSmith` contributors
//!
//! SPDX-License-Identifier: MIT
//!
//! Maps a table name and an embedded version marker to the ordered list of
//! typed columns that make up one row. Loc files use a fixed schema that is
//! not versioned.

mod loader;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub use loader::{load_schema_dir, parse_schema_json};

/// Wire type of a single table cell.
///
/// Schema files name types through [`FromStr`], so `Bool` and `ColourRgb`
/// are accepted alongside the canonical names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum FieldType {
    Boolean,
    I16,
    I32,
    I64,
    F32,
    F64,
    StringU8,
    StringU16,
    OptionalStringU8,
    ColourRGB,
    Buffer,
}

impl FieldType {
    /// Name used in schema files and error messages
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Boolean => "Boolean",
            FieldType::I16 => "I16",
            FieldType::I32 => "I32",
            FieldType::I64 => "I64",
            FieldType::F32 => "F32",
            FieldType::F64 => "F64",
            FieldType::StringU8 => "StringU8",
            FieldType::StringU16 => "StringU16",
            FieldType::OptionalStringU8 => "OptionalStringU8",
            FieldType::ColourRGB => "ColourRGB",
            FieldType::Buffer => "Buffer",
        }
    }

    /// Encoded width in bytes, or `None` for variable-length types
    #[must_use]
    pub fn fixed_width(self) -> Option<usize> {
        match self {
            FieldType::Boolean => Some(1),
            FieldType::I16 => Some(2),
            FieldType::I32 | FieldType::F32 | FieldType::ColourRGB => Some(4),
            FieldType::I64 | FieldType::F64 => Some(8),
            FieldType::StringU8
            | FieldType::StringU16
            | FieldType::OptionalStringU8
            | FieldType::Buffer => None,
        }
    }

    #[must_use]
    pub fn is_string(self) -> bool {
        matches!(
            self,
            FieldType::StringU8 | FieldType::StringU16 | FieldType::OptionalStringU8
        )
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let field_type = match s {
            "Boolean" | "Bool" => FieldType::Boolean,
            "I16" => FieldType::I16,
            "I32" => FieldType::I32,
            "I64" => FieldType::I64,
            "F32" => FieldType::F32,
            "F64" => FieldType::F64,
            "StringU8" => FieldType::StringU8,
            "StringU16" => FieldType::StringU16,
            "OptionalStringU8" => FieldType::OptionalStringU8,
            "ColourRGB" | "ColourRgb" => FieldType::ColourRGB,
            "Buffer" => FieldType::Buffer,
            other => return Err(Error::UnknownFieldType(other.to_string())),
        };
        Ok(field_type)
    }
}

impl TryFrom<String> for FieldType {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

/// One column of a table schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaColumn {
    pub name: String,
    pub field_type: FieldType,
    #[serde(default)]
    pub is_key: bool,
}

impl SchemaColumn {
    pub fn new(name: impl Into<String>, field_type: FieldType, is_key: bool) -> Self {
        Self {
            name: name.into(),
            field_type,
            is_key,
        }
    }
}

/// Row layout of one table at one version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbVersion {
    pub version: i32,
    pub fields: Vec<SchemaColumn>,
}

impl DbVersion {
    #[must_use]
    pub fn new(version: i32, fields: Vec<SchemaColumn>) -> Self {
        Self { version, fields }
    }

    /// Number of cells per row
    #[must_use]
    pub fn width(&self) -> usize {
        self.fields.len()
    }

    /// Indices of the key columns, in column order
    #[must_use]
    pub fn key_indices(&self) -> Vec<usize> {
        self.fields
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_key)
            .map(|(i, _)| i)
            .collect()
    }
}

/// Version written into Loc headers.
pub const LOC_VERSION: i32 = 1;

/// The fixed Loc-table layout: key and text, plus the tooltip flag every
/// Loc row carries on disk.
#[must_use]
pub fn loc_schema() -> DbVersion {
    DbVersion::new(
        LOC_VERSION,
        vec![
            SchemaColumn::new("key", FieldType::StringU16, true),
            SchemaColumn::new("text", FieldType::StringU16, false),
            SchemaColumn::new("tooltip", FieldType::Boolean, false),
        ],
    )
}

/// Static mapping of table name to its declared versions.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    tables: HashMap<String, Vec<DbVersion>>,
}

impl SchemaRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table version. Declaration order is preserved; a second
    /// declaration of the same version replaces the first.
    pub fn insert(&mut self, table: impl Into<String>, version: DbVersion) {
        let versions = self.tables.entry(table.into()).or_default();
        if let Some(existing) = versions.iter_mut().find(|v| v.version == version.version) {
            *existing = version;
        } else {
            versions.push(version);
        }
    }

    /// Merge another registry into this one
    pub fn extend(&mut self, other: SchemaRegistry) {
        for (table, versions) in other.tables {
            for version in versions {
                self.insert(table.clone(), version);
            }
        }
    }

    /// All declared versions of a table, in declaration order
    #[must_use]
    pub fn versions(&self, table: &str) -> Option<&[DbVersion]> {
        self.tables.get(table).map(Vec::as_slice)
    }

    #[must_use]
    pub fn contains_table(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    /// Number of registered tables
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Pick the schema for a file of `table` carrying `file_version`.
    ///
    /// With a version marker the result is the exact version if declared,
    /// otherwise the highest declared version below it. A declared version
    /// above the marker is never selected. Without a marker the generic
    /// version 0 is used, else the first declared version.
    #[must_use]
    pub fn resolve(&self, table: &str, file_version: Option<i32>) -> Option<&DbVersion> {
        let versions = self.tables.get(table)?;
        match file_version {
            Some(marker) => versions
                .iter()
                .filter(|v| v.version <= marker)
                .max_by_key(|v| v.version),
            None => versions
                .iter()
                .find(|v| v.version == 0)
                .or_else(|| versions.first()),
        }
    }

    /// Like [`resolve`](Self::resolve) but reports a missing schema as an error
    pub fn require(&self, table: &str, file_version: Option<i32>) -> Result<&DbVersion> {
        self.resolve(table, file_version).ok_or_else(|| match file_version {
            Some(v) => Error::SchemaNotFound(format!("{table} (version {v})")),
            None => Error::SchemaNotFound(table.to_string()),
        })
    }
}
