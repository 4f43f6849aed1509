//! Decoded pack contents shaped for display
//!
//! Everything here is `Serialize` so a front end can take it as JSON.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Serialize;

use crate::codec::{AmendedSchemaField, amend_rows};
use crate::error::Result;
use crate::pack::{FileKind, Pack, PackedFile, ReadOptions, read_pack, read_packs};
use crate::profile::GameProfile;
use crate::schema::SchemaColumn;

/// Index entry summary
#[derive(Debug, Clone, Serialize)]
pub struct FileSummary {
    pub name: String,
    pub file_size: u32,
    pub is_compressed: bool,
    pub kind: FileKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<i32>,
}

/// One decoded table
#[derive(Debug, Clone, Serialize)]
pub struct TableView {
    pub file: String,
    /// Table name for DB files, the file path for Loc files
    pub table: String,
    pub version: Option<i32>,
    pub columns: Vec<SchemaColumn>,
    pub rows: Vec<Vec<AmendedSchemaField>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decode_error: Option<String>,
}

/// A whole pack for browsing
#[derive(Debug, Clone, Serialize)]
pub struct PackViewData {
    pub name: String,
    pub path: PathBuf,
    pub dependency_packs: Vec<String>,
    pub files: Vec<FileSummary>,
    /// Decoded tables keyed by file path, in index order
    pub tables: IndexMap<String, TableView>,
}

/// Selected tables of one pack
#[derive(Debug, Clone, Serialize)]
pub struct PackTableData {
    pub pack: String,
    pub path: PathBuf,
    pub tables: Vec<TableView>,
}

/// True when `filter` names the file's table or a prefix of its path
fn table_matches(file: &PackedFile, filter: &str) -> bool {
    file.table_name().is_some_and(|t| t.eq_ignore_ascii_case(filter))
        || file
            .name
            .get(..filter.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(filter))
}

fn table_view(file: &PackedFile) -> Option<TableView> {
    let (schema, fields) = (file.schema.as_ref()?, file.schema_fields.as_ref()?);
    let mut decode_error = file.decode_error.clone();
    let rows = match amend_rows(fields, schema) {
        Ok(rows) => rows,
        Err(e) => {
            decode_error.get_or_insert_with(|| e.to_string());
            Vec::new()
        }
    };
    Some(TableView {
        file: file.name.clone(),
        table: file.table_name().unwrap_or(&file.name).to_string(),
        version: file.version,
        columns: schema.fields.clone(),
        rows,
        decode_error,
    })
}

/// Failed tables still show up, with no rows and their error
fn table_view_or_error(file: &PackedFile) -> Option<TableView> {
    table_view(file).or_else(|| {
        file.decode_error.as_ref().map(|error| TableView {
            file: file.name.clone(),
            table: file.table_name().unwrap_or(&file.name).to_string(),
            version: file.version,
            columns: Vec::new(),
            rows: Vec::new(),
            decode_error: Some(error.clone()),
        })
    })
}

fn collect_tables<'a>(pack: &'a Pack, filters: &'a [String]) -> impl Iterator<Item = TableView> + 'a {
    pack.tables()
        .filter(move |f| filters.is_empty() || filters.iter().any(|t| table_matches(f, t)))
        .filter_map(table_view_or_error)
}

/// Index and decoded tables of one pack.
///
/// `table_filter` limits decoding to one table name or path prefix.
///
/// # Errors
/// Returns an error if the pack is structurally unreadable.
pub fn get_pack_view_data<P: AsRef<Path>>(
    path: P,
    table_filter: Option<&str>,
    profile: &GameProfile,
) -> Result<PackViewData> {
    let path = path.as_ref();
    let mut options = ReadOptions::full();
    if let Some(filter) = table_filter {
        let index = read_pack(path, &ReadOptions::index_only(), profile)?;
        let names = index
            .tables()
            .filter(|f| table_matches(f, filter))
            .map(|f| f.name.clone())
            .collect();
        options = options.files(names);
    }
    let pack = read_pack(path, &options, profile)?;

    let files = pack
        .packed_files
        .iter()
        .map(|f| FileSummary {
            name: f.name.clone(),
            file_size: f.file_size,
            is_compressed: f.is_compressed,
            kind: f.kind(),
            version: f.version,
        })
        .collect();

    let filters: Vec<String> = table_filter.map(str::to_string).into_iter().collect();
    let tables = collect_tables(&pack, &filters)
        .map(|view| (view.file.clone(), view))
        .collect();

    Ok(PackViewData {
        name: pack.name.clone(),
        path: pack.path.clone(),
        dependency_packs: pack.dependency_packs.clone(),
        files,
        tables,
    })
}

/// The named tables of several packs, read in parallel.
///
/// An empty `tables` list selects every table. Packs that fail to load are
/// logged and left out.
#[must_use]
pub fn get_packs_table_data<P>(paths: &[P], tables: &[String], profile: &GameProfile) -> Vec<PackTableData>
where
    P: AsRef<Path> + Sync,
{
    let (packs, failures) = read_packs(paths, &ReadOptions::full(), profile);
    for (path, error) in &failures {
        tracing::warn!("Skipping {}: {error}", path.display());
    }

    packs
        .iter()
        .map(|pack| PackTableData {
            pack: pack.name.clone(),
            path: pack.path.clone(),
            tables: collect_tables(pack, tables).collect(),
        })
        .collect()
}
