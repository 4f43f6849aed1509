//! Row-level edits applied at write time
//!
//! SPDX-FileCopyrightText: 2025 `PackSmith` contributors
//!
//! SPDX-License-Identifier: MIT
//!
//! An [`Overwrite`] selects rows of one table by comparing a set of columns
//! against expected values, then either replaces one cell of every
//! matching row or drops those rows. Overwrites are applied in the order
//! given; the source pack is only read.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::codec::{SchemaField, into_rows};
use crate::error::{Error, Result};
use crate::pack::{Pack, PackedFile, ReadOptions, read_pack};
use crate::profile::GameProfile;
use crate::schema::DbVersion;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OverwriteOperation {
    Edit,
    Remove,
}

/// A pending edit of one table.
///
/// Serialized with camelCase keys:
///
/// ```json
/// { "packFile": "db\\foo_tables\\data", "operation": "EDIT",
///   "columnIndices": [0], "columnValues": ["rowA"],
///   "overwriteIndex": 1, "overwriteData": false }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Overwrite {
    /// Virtual path of the target table
    pub pack_file: String,
    pub operation: OverwriteOperation,
    pub column_indices: Vec<usize>,
    pub column_values: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overwrite_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overwrite_data: Option<Value>,
}

impl Overwrite {
    pub fn edit(
        pack_file: impl Into<String>,
        column_indices: Vec<usize>,
        column_values: Vec<Value>,
        overwrite_index: usize,
        overwrite_data: Value,
    ) -> Self {
        Self {
            pack_file: pack_file.into(),
            operation: OverwriteOperation::Edit,
            column_indices,
            column_values,
            overwrite_index: Some(overwrite_index),
            overwrite_data: Some(overwrite_data),
        }
    }

    pub fn remove(pack_file: impl Into<String>, column_indices: Vec<usize>, column_values: Vec<Value>) -> Self {
        Self {
            pack_file: pack_file.into(),
            operation: OverwriteOperation::Remove,
            column_indices,
            column_values,
            overwrite_index: None,
            overwrite_data: None,
        }
    }

    /// Check indices against the table width before touching any row
    fn validate(&self, width: usize) -> Result<()> {
        if self.column_indices.len() != self.column_values.len() {
            return Err(Error::OverwriteKeyMismatch {
                file: self.pack_file.clone(),
                indices: self.column_indices.len(),
                values: self.column_values.len(),
            });
        }
        let out_of_range = self
            .column_indices
            .iter()
            .chain(self.overwrite_index.iter())
            .find(|&&i| i >= width);
        if let Some(&index) = out_of_range {
            return Err(Error::OverwriteColumnOutOfRange {
                file: self.pack_file.clone(),
                index,
                width,
            });
        }
        if self.operation == OverwriteOperation::Edit
            && (self.overwrite_index.is_none() || self.overwrite_data.is_none())
        {
            return Err(Error::IncompleteEdit(self.pack_file.clone()));
        }
        Ok(())
    }

    /// True when every selected column resolves to its expected value
    #[must_use]
    pub fn matches_row(&self, row: &[SchemaField]) -> bool {
        self.column_indices
            .iter()
            .zip(&self.column_values)
            .all(|(&i, expected)| row.get(i).is_some_and(|cell| cell.matches(expected)))
    }
}

/// Counts of rows touched by [`apply_overwrites`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverwriteStats {
    pub edited: usize,
    pub removed: usize,
}

/// Apply `overwrites` to `rows` in order
///
/// # Errors
/// Returns an error if an overwrite is malformed or its new value does
/// not fit the target column. `rows` may be partly edited on error.
pub fn apply_overwrites(
    rows: &mut Vec<Vec<SchemaField>>,
    schema: &DbVersion,
    overwrites: &[&Overwrite],
) -> Result<OverwriteStats> {
    let mut stats = OverwriteStats::default();

    for overwrite in overwrites {
        overwrite.validate(schema.width())?;
        match overwrite.operation {
            OverwriteOperation::Remove => {
                let before = rows.len();
                rows.retain(|row| !overwrite.matches_row(row));
                stats.removed += before - rows.len();
            }
            OverwriteOperation::Edit => {
                let (Some(index), Some(data)) = (overwrite.overwrite_index, &overwrite.overwrite_data) else {
                    return Err(Error::IncompleteEdit(overwrite.pack_file.clone()));
                };
                let cell = SchemaField::from_json(schema.fields[index].field_type, data)?;
                for row in rows.iter_mut().filter(|row| overwrite.matches_row(row)) {
                    row[index] = cell.clone();
                    stats.edited += 1;
                }
            }
        }
    }
    Ok(stats)
}

/// Decode every targeted table of `source`, apply its overwrites and
/// return replacement entries, one per table, in first-mention order.
///
/// # Errors
/// Returns an error if a target table is missing, could not be fully
/// decoded, or an overwrite fails.
pub(crate) fn build_overwritten_tables(
    source: &Pack,
    overwrites: &[Overwrite],
    profile: &GameProfile,
) -> Result<Vec<PackedFile>> {
    let mut grouped: IndexMap<&str, Vec<&Overwrite>> = IndexMap::new();
    for overwrite in overwrites {
        grouped.entry(overwrite.pack_file.as_str()).or_default().push(overwrite);
    }
    if grouped.is_empty() {
        return Ok(Vec::new());
    }

    let names = grouped.keys().map(|k| (*k).to_string()).collect();
    let decoded = read_pack(&source.path, &ReadOptions::full().files(names), profile)?;

    let mut replacements = Vec::with_capacity(grouped.len());
    for (name, edits) in grouped {
        let file = decoded
            .find_file(name)
            .ok_or_else(|| Error::FileNotFoundInPack(name.to_string()))?;
        if let Some(message) = &file.decode_error {
            return Err(Error::TableNotDecoded {
                file: name.to_string(),
                message: message.clone(),
            });
        }
        let (Some(schema), Some(fields)) = (&file.schema, &file.schema_fields) else {
            return Err(Error::TableNotDecoded {
                file: name.to_string(),
                message: "not a DB or Loc table".to_string(),
            });
        };

        let mut rows = into_rows(fields.clone(), schema.width())?;
        let stats = apply_overwrites(&mut rows, schema, &edits)?;
        tracing::info!(
            "{name}: {} edits, {} cells edited, {} rows removed",
            edits.len(),
            stats.edited,
            stats.removed
        );

        let fields = rows.into_iter().flatten().collect();
        replacements.push(PackedFile::from_rows(
            file.name.clone(),
            &file.table_header(),
            schema.clone(),
            fields,
        ));
    }
    Ok(replacements)
}
