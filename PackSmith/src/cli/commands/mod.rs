//! CLI subcommands

mod mods;
mod pack;
mod write;

use std::path::PathBuf;

use clap::Subcommand;

use crate::profile::GameProfile;

#[derive(Subcommand)]
pub enum Commands {
    /// List the entries of a pack
    List {
        /// Pack file
        pack: PathBuf,

        /// Only show entries whose path contains this text
        #[arg(short, long)]
        filter: Option<String>,

        /// Show size, compression and table version per entry
        #[arg(short, long)]
        detailed: bool,
    },

    /// Show header and dependency information
    Info {
        /// Pack file
        pack: PathBuf,
    },

    /// Decode and print table rows
    Rows {
        /// Pack file
        pack: PathBuf,

        /// Table name (e.g. `units_tables`) or path prefix
        table: String,

        /// Print as JSON instead of a text grid
        #[arg(long)]
        json: bool,

        /// Maximum rows to print per table (0 for all)
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Create a new pack from a directory
    Create {
        /// Source directory
        source: PathBuf,

        /// Output pack file
        destination: PathBuf,

        /// Dependency pack name (repeatable)
        #[arg(short = 'D', long = "dependency")]
        dependencies: Vec<String>,

        /// Place DB tables before all other entries
        #[arg(long)]
        db_first: bool,

        /// Compress entries with this zstd level
        #[arg(short, long)]
        compress: Option<i32>,
    },

    /// Add the files of a directory to an existing pack
    Append {
        /// Existing pack file
        pack: PathBuf,

        /// Directory of files to add
        source: PathBuf,

        /// Write to this path instead of replacing the pack
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Replace entries that already exist in the pack
        #[arg(short, long)]
        replace: bool,
    },

    /// Apply row edits from a JSON file
    Overwrite {
        /// Source pack file
        source: PathBuf,

        /// Output pack file
        destination: PathBuf,

        /// JSON array of edits
        #[arg(short, long)]
        edits: PathBuf,
    },

    /// Merge several packs into one (later packs win)
    Merge {
        /// Packs to merge, lowest priority first
        #[arg(required = true)]
        sources: Vec<PathBuf>,

        /// Output pack file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// List the packs referenced by a save game
    SavePacks {
        /// Save path, or a save name inside the profile's save directory
        save: String,
    },

    /// Write a pack that blanks the game's intro movies
    SkipIntros {
        /// Output pack file
        output: PathBuf,
    },
}

impl Commands {
    pub fn execute(self, profile: &GameProfile) -> anyhow::Result<()> {
        match self {
            Commands::List {
                pack,
                filter,
                detailed,
            } => pack::list(&pack, filter.as_deref(), detailed, profile),
            Commands::Info { pack } => pack::info(&pack, profile),
            Commands::Rows {
                pack,
                table,
                json,
                limit,
            } => pack::rows(&pack, &table, json, limit, profile),
            Commands::Create {
                source,
                destination,
                dependencies,
                db_first,
                compress,
            } => write::create(&source, &destination, dependencies, db_first, compress, profile),
            Commands::Append {
                pack,
                source,
                output,
                replace,
            } => write::append(&pack, &source, output.as_deref(), replace, profile),
            Commands::Overwrite {
                source,
                destination,
                edits,
            } => write::overwrite(&source, &destination, &edits, profile),
            Commands::Merge { sources, output } => mods::merge(&sources, &output, profile),
            Commands::SavePacks { save } => mods::save_packs(&save, profile),
            Commands::SkipIntros { output } => mods::skip_intros(&output, profile),
        }
    }
}
