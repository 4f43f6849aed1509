//! Mod management commands

use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::cli::progress::{LINK, PACKAGE, print_done, print_step};
use crate::mods::{create_skip_intros_pack, get_packs_in_save, merge_mods};
use crate::profile::GameProfile;

pub fn merge(sources: &[PathBuf], output: &Path, profile: &GameProfile) -> anyhow::Result<()> {
    let started = Instant::now();

    print_step(1, 1, LINK, &format!("Merging {} packs...", sources.len()));
    let path = merge_mods(sources, output, profile)?;

    println!("Wrote {}", path.display());
    print_done(started.elapsed());
    Ok(())
}

pub fn save_packs(save: &str, profile: &GameProfile) -> anyhow::Result<()> {
    let packs = get_packs_in_save(save, profile)?;
    if packs.is_empty() {
        println!("No packs referenced by {save}");
        return Ok(());
    }
    for pack in &packs {
        println!("{pack}");
    }
    Ok(())
}

pub fn skip_intros(output: &Path, profile: &GameProfile) -> anyhow::Result<()> {
    let started = Instant::now();

    print_step(
        1,
        1,
        PACKAGE,
        &format!("Blanking {} intro movies...", profile.intro_movies.len()),
    );
    let summary = create_skip_intros_pack(profile, output)?;

    println!("Wrote {} ({} entries)", summary.path.display(), summary.file_count);
    print_done(started.elapsed());
    Ok(())
}
