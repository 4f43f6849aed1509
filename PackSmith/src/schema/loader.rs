//! Loading schema definitions from JSON
//!
//! A schema file maps table names to their declared versions:
//!
//! ```json
//! { "units_tables": [ { "version": 1, "fields": [
//!     { "name": "key", "field_type": "StringU8", "is_key": true }
//! ] } ] }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use walkdir::WalkDir;

use super::{DbVersion, SchemaRegistry};
use crate::error::Result;

/// Parse one schema JSON document
pub fn parse_schema_json(json: &str) -> Result<SchemaRegistry> {
    // BTreeMap keeps registration order stable across runs
    let tables: BTreeMap<String, Vec<DbVersion>> = serde_json::from_str(json)?;

    let mut registry = SchemaRegistry::new();
    for (table, versions) in tables {
        for version in versions {
            registry.insert(table.clone(), version);
        }
    }
    Ok(registry)
}

/// Load every `*.json` schema file below `dir` into one registry.
///
/// Files are read in path order, so a later file overrides an earlier
/// declaration of the same table version.
pub fn load_schema_dir<P: AsRef<Path>>(dir: P) -> Result<SchemaRegistry> {
    let mut paths: Vec<_> = WalkDir::new(dir.as_ref())
        .into_iter()
        .collect::<std::result::Result<Vec<_>, _>>()?
        .into_iter()
        .filter(|e| {
            e.file_type().is_file()
                && e.path()
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
        })
        .map(walkdir::DirEntry::into_path)
        .collect();
    paths.sort();

    let mut registry = SchemaRegistry::new();
    for path in &paths {
        let json = std::fs::read_to_string(path)?;
        registry.extend(parse_schema_json(&json)?);
        tracing::debug!("Loaded schema file {}", path.display());
    }

    tracing::info!(
        "Loaded {} tables from {} schema files",
        registry.len(),
        paths.len()
    );
    Ok(registry)
}
