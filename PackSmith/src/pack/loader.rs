//! Reading many packs at once

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use super::{Pack, ReadOptions, read_pack};
use crate::error::Error;
use crate::profile::GameProfile;

/// Read every pack as an independent job on the rayon pool.
///
/// A pack that fails to load is reported in the second list and never
/// affects the others. Loaded packs keep the order of `paths`.
pub fn read_packs<P>(paths: &[P], options: &ReadOptions, profile: &GameProfile) -> (Vec<Pack>, Vec<(PathBuf, Error)>)
where
    P: AsRef<Path> + Sync,
{
    let results: Vec<_> = paths
        .par_iter()
        .map(|path| {
            let path = path.as_ref();
            (path.to_path_buf(), read_pack(path, options, profile))
        })
        .collect();

    let mut packs = Vec::with_capacity(results.len());
    let mut failures = Vec::new();
    for (path, result) in results {
        match result {
            Ok(pack) => packs.push(pack),
            Err(e) if e.is_structural() => {
                tracing::warn!("{} is not a valid pack: {e}", path.display());
                failures.push((path, e));
            }
            Err(e) => {
                tracing::warn!("Failed to load {}: {e}", path.display());
                failures.push((path, e));
            }
        }
    }

    tracing::info!("Loaded {} packs, {} failed", packs.len(), failures.len());
    (packs, failures)
}
