//! Commands that write packs

use std::path::Path;
use std::time::Instant;

use anyhow::Context;

use crate::cli::progress::{DISK, GEAR, LOOKING_GLASS, PACKAGE, format_size, print_done, print_step, simple_spinner};
use crate::pack::writer::{
    Overwrite, SortedOptions, WriteRequest, WriteSummary, create_overwrite_pack, execute, files_from_dir,
};
use crate::pack::{ReadOptions, read_pack};
use crate::profile::GameProfile;

pub fn create(
    source: &Path,
    destination: &Path,
    dependencies: Vec<String>,
    db_first: bool,
    compress: Option<i32>,
    profile: &GameProfile,
) -> anyhow::Result<()> {
    let started = Instant::now();

    print_step(1, 2, LOOKING_GLASS, &format!("Collecting files from {}...", source.display()));
    let files = files_from_dir(source).with_context(|| format!("Failed to collect {}", source.display()))?;

    print_step(2, 2, PACKAGE, &format!("Writing {} entries...", files.len()));
    let pb = simple_spinner("Writing pack");
    let summary = execute(
        WriteRequest::NewPack {
            files,
            dependencies,
            options: SortedOptions {
                db_first,
                compression_level: compress,
            },
        },
        destination,
        profile,
    );
    pb.finish_and_clear();

    report(&summary?);
    print_done(started.elapsed());
    Ok(())
}

pub fn append(
    pack: &Path,
    source: &Path,
    output: Option<&Path>,
    replace: bool,
    profile: &GameProfile,
) -> anyhow::Result<()> {
    let started = Instant::now();

    print_step(1, 3, LOOKING_GLASS, &format!("Reading {}...", pack.display()));
    let existing = read_pack(pack, &ReadOptions::index_only(), profile)
        .with_context(|| format!("Failed to read {}", pack.display()))?;

    print_step(2, 3, LOOKING_GLASS, &format!("Collecting files from {}...", source.display()));
    let files = files_from_dir(source).with_context(|| format!("Failed to collect {}", source.display()))?;

    print_step(3, 3, DISK, &format!("Appending {} entries...", files.len()));
    let target = output.unwrap_or(pack);
    let summary = execute(
        WriteRequest::AppendTo {
            existing: &existing,
            files,
            replace_duplicates: replace,
            dependencies: None,
        },
        target,
        profile,
    )?;

    report(&summary);
    print_done(started.elapsed());
    Ok(())
}

pub fn overwrite(source: &Path, destination: &Path, edits: &Path, profile: &GameProfile) -> anyhow::Result<()> {
    let started = Instant::now();

    let json = std::fs::read_to_string(edits).with_context(|| format!("Failed to read {}", edits.display()))?;
    let overwrites: Vec<Overwrite> =
        serde_json::from_str(&json).with_context(|| format!("Invalid edit list in {}", edits.display()))?;

    print_step(1, 1, GEAR, &format!("Applying {} edits...", overwrites.len()));
    let summary = create_overwrite_pack(source, destination, &overwrites, profile)?;

    report(&summary);
    print_done(started.elapsed());
    Ok(())
}

fn report(summary: &WriteSummary) {
    println!(
        "Wrote {} ({} entries, {}, {})",
        summary.path.display(),
        summary.file_count,
        format_size(summary.bytes_written),
        summary.strategy
    );
}
