//! Read-only pack commands

use std::path::Path;

use anyhow::Context;

use crate::cli::progress::format_size;
use crate::pack::{ReadOptions, read_pack};
use crate::profile::GameProfile;
use crate::view::get_pack_view_data;

pub fn list(pack: &Path, filter: Option<&str>, detailed: bool, profile: &GameProfile) -> anyhow::Result<()> {
    let options = if detailed {
        ReadOptions::full()
    } else {
        ReadOptions::index_only()
    };
    let pack = read_pack(pack, &options, profile).with_context(|| format!("Failed to read {}", pack.display()))?;

    let needle = filter.map(str::to_lowercase);
    let mut shown = 0;
    for file in &pack.packed_files {
        if let Some(needle) = &needle
            && !file.name.to_lowercase().contains(needle.as_str())
        {
            continue;
        }
        shown += 1;

        if detailed {
            let version = file.version.map(|v| format!("v{v}")).unwrap_or_default();
            let compressed = if file.is_compressed { "zstd" } else { "" };
            println!(
                "{:>8}  {:<4}  {:<4}  {}",
                format_size(u64::from(file.file_size)),
                compressed,
                version,
                file.name
            );
        } else {
            println!("{}", file.name);
        }
    }

    println!("\n{shown} of {} entries", pack.file_count());
    Ok(())
}

pub fn info(pack: &Path, profile: &GameProfile) -> anyhow::Result<()> {
    let pack = read_pack(pack, &ReadOptions::index_only(), profile)
        .with_context(|| format!("Failed to read {}", pack.display()))?;
    let header = &pack.header;

    println!("Pack:          {}", pack.name);
    println!("Size:          {}", format_size(pack.size));
    if let Some(changed) = pack.last_changed {
        println!("Last changed:  {}", changed.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    println!("Magic:         {}", String::from_utf8_lossy(&header.magic));
    println!("Byte mask:     {}", header.byte_mask);
    println!("Entries:       {}", header.pack_file_count);
    println!("Tables:        {}", pack.tables().count());
    println!("Data offset:   {}", header.data_start());

    if pack.dependency_packs.is_empty() {
        println!("Dependencies:  (none)");
    } else {
        println!("Dependencies:");
        for dep in &pack.dependency_packs {
            println!("  {dep}");
        }
    }
    Ok(())
}

pub fn rows(pack: &Path, table: &str, json: bool, limit: usize, profile: &GameProfile) -> anyhow::Result<()> {
    let view = get_pack_view_data(pack, Some(table), profile)
        .with_context(|| format!("Failed to read {}", pack.display()))?;

    if json {
        let tables: Vec<_> = view.tables.values().collect();
        println!("{}", serde_json::to_string_pretty(&tables)?);
        return Ok(());
    }

    if view.tables.is_empty() {
        anyhow::bail!("No table matching '{table}' in {}", pack.display());
    }

    for table in view.tables.values() {
        let version = table.version.map(|v| format!(" v{v}")).unwrap_or_default();
        println!("== {}{version} ({} rows)", table.file, table.rows.len());
        if let Some(error) = &table.decode_error {
            println!("   decode error: {error}");
        }

        let header: Vec<_> = table
            .columns
            .iter()
            .map(|c| if c.is_key { format!("*{}", c.name) } else { c.name.clone() })
            .collect();
        println!("{}", header.join(" | "));

        let take = if limit == 0 { table.rows.len() } else { limit };
        for row in table.rows.iter().take(take) {
            let cells: Vec<_> = row.iter().map(|cell| cell.resolved.as_str()).collect();
            println!("{}", cells.join(" | "));
        }
        if table.rows.len() > take {
            println!("... {} more", table.rows.len() - take);
        }
        println!();
    }
    Ok(())
}
