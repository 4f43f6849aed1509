//! Pack that replaces the intro movies with empty entries

use std::path::Path;

use crate::error::Result;
use crate::pack::PackedFile;
use crate::pack::writer::{SortedOptions, WriteRequest, WriteSummary, execute};
use crate::profile::GameProfile;

/// Write a pack with one empty entry per intro movie of the profile
///
/// # Errors
/// Returns an error if the pack cannot be written.
pub fn create_skip_intros_pack(profile: &GameProfile, output: &Path) -> Result<WriteSummary> {
    if profile.intro_movies.is_empty() {
        tracing::warn!("Profile {} lists no intro movies", profile.current_game);
    }

    let files = profile
        .intro_movies
        .iter()
        .map(|movie| PackedFile::from_bytes(movie.as_str(), Vec::new()))
        .collect();

    execute(
        WriteRequest::NewPack {
            files,
            dependencies: Vec::new(),
            options: SortedOptions::default(),
        },
        output,
        profile,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pack::{ReadOptions, read_pack};
    use crate::schema::SchemaRegistry;
    use tempfile::TempDir;

    #[test]
    fn test_skip_intros_pack() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("!skip_intros.pack");
        let profile = GameProfile::new("wh3", SchemaRegistry::new()).with_intro_movies(vec![
            "movies\\startup_movie_02.ca_vp8".into(),
            "movies\\startup_movie_01.ca_vp8".into(),
        ]);

        let summary = create_skip_intros_pack(&profile, &output).unwrap();
        assert_eq!(summary.file_count, 2);

        let pack = read_pack(&output, &ReadOptions::index_only(), &profile).unwrap();
        let names: Vec<_> = pack.packed_files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["movies\\startup_movie_01.ca_vp8", "movies\\startup_movie_02.ca_vp8"]
        );
        assert!(pack.packed_files.iter().all(|f| f.file_size == 0));
    }
}
