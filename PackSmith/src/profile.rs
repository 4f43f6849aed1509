//! Per-game configuration passed into every read and write
//!
//! A profile is a small TOML file:
//!
//! ```toml
//! game = "warhammer3"
//! schema_dir = "~/.config/packsmith/schemas/warhammer3"
//! save_dir = "~/AppData/Roaming/The Creative Assembly/Warhammer3/save_games"
//! index_has_compression_flag = true
//! intro_movies = ["movies\\epilepsy_warning\\epilepsy_warning_en.ca_vp8"]
//! ```
//!
//! Relative paths resolve against the profile's own directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::schema::{SchemaRegistry, load_schema_dir};

/// On-disk form of a [`GameProfile`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    pub game: String,
    #[serde(default)]
    pub schema_dir: Option<String>,
    #[serde(default)]
    pub intro_movies: Vec<String>,
    #[serde(default = "default_true")]
    pub index_has_compression_flag: bool,
    #[serde(default)]
    pub save_dir: Option<String>,
}

fn default_true() -> bool {
    true
}

/// Schema tables and game-specific settings for one game.
#[derive(Debug, Clone)]
pub struct GameProfile {
    pub current_game: String,
    pub schema: SchemaRegistry,
    /// Virtual paths of the intro videos a skip-intros pack blanks out
    pub intro_movies: Vec<String>,
    /// Whether index entries carry the one-byte compression flag
    pub index_has_compression_flag: bool,
    /// Directory holding save games, used to resolve bare save names
    pub save_dir: Option<PathBuf>,
}

impl GameProfile {
    pub fn new(game: impl Into<String>, schema: SchemaRegistry) -> Self {
        Self {
            current_game: game.into(),
            schema,
            intro_movies: Vec::new(),
            index_has_compression_flag: true,
            save_dir: None,
        }
    }

    #[must_use]
    pub fn with_intro_movies(mut self, movies: Vec<String>) -> Self {
        self.intro_movies = movies;
        self
    }

    #[must_use]
    pub fn with_save_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.save_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn with_compression_flag(mut self, present: bool) -> Self {
        self.index_has_compression_flag = present;
        self
    }

    /// Load a profile and its schema directory
    ///
    /// # Errors
    /// Returns [`Error::InvalidProfile`] if the TOML does not parse, or an
    /// IO/JSON error if the schema directory cannot be loaded.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config: ProfileConfig = toml::from_str(&text).map_err(|e| Error::InvalidProfile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_config(config, base)
    }

    /// Build a profile from an already parsed config
    ///
    /// # Errors
    /// Returns an error if the schema directory cannot be loaded.
    pub fn from_config(config: ProfileConfig, base: &Path) -> Result<Self> {
        let schema = match &config.schema_dir {
            Some(dir) => load_schema_dir(expand_path(dir, base))?,
            None => {
                tracing::warn!("Profile {} has no schema_dir; DB tables will not decode", config.game);
                SchemaRegistry::new()
            }
        };

        tracing::info!("Loaded game profile {} ({} tables)", config.game, schema.len());

        Ok(Self {
            current_game: config.game,
            schema,
            intro_movies: config.intro_movies,
            index_has_compression_flag: config.index_has_compression_flag,
            save_dir: config.save_dir.as_deref().map(|dir| expand_path(dir, base)),
        })
    }

    /// `<config dir>/packsmith/profile.toml`
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("packsmith").join("profile.toml"))
    }
}

/// Expand `~` and resolve relative paths against `base`
fn expand_path(raw: &str, base: &Path) -> PathBuf {
    let expanded = PathBuf::from(shellexpand::tilde(raw).as_ref());
    if expanded.is_absolute() {
        expanded
    } else {
        base.join(expanded)
    }
}
