//! # PackSmith
//!
//! A pure-Rust library for reading, editing and writing Total War PFH5
//! `.pack` archives.
//!
//! ## Supported Content
//!
//! - **Pack archives** - Read the index, dependencies and entry bodies
//! - **DB tables** - Schema-versioned rows with GUID and version frames
//! - **Loc tables** - Localisation key/text rows
//! - **zstd entries** - Compressed bodies with a 4-byte size prefix
//!
//! ## Quick Start
//!
//! ### Reading a Pack
//!
//! ```no_run
//! use packsmith::prelude::*;
//!
//! let profile = GameProfile::load("profile.toml")?;
//! let pack = read_pack("my_mod.pack", &ReadOptions::full(), &profile)?;
//! for file in pack.tables() {
//!     println!("{} ({:?})", file.name, file.version);
//! }
//! # Ok::<(), packsmith::Error>(())
//! ```
//!
//! ### Editing Rows
//!
//! ```no_run
//! use packsmith::prelude::*;
//! use serde_json::json;
//!
//! let profile = GameProfile::load("profile.toml")?;
//! let edit = Overwrite::edit("db\\foo_tables\\data", vec![0], vec![json!("rowA")], 1, json!(false));
//! create_overwrite_pack("my_mod.pack".as_ref(), "my_mod_edited.pack".as_ref(), &[edit], &profile)?;
//! # Ok::<(), packsmith::Error>(())
//! ```
//!
//! ### Merging Mods
//!
//! ```no_run
//! use packsmith::prelude::*;
//!
//! let profile = GameProfile::load("profile.toml")?;
//! let merged = merge_mods(&["a.pack", "b.pack"], "merged.pack".as_ref(), &profile)?;
//! println!("Wrote {}", merged.display());
//! # Ok::<(), packsmith::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` - Enables the `packsmith` command-line binary

pub mod codec;
pub mod compression;
pub mod error;
pub mod mods;
pub mod pack;
pub mod profile;
pub mod schema;
pub mod view;

// Re-exports for convenience
pub use error::{Error, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::profile::GameProfile;
    pub use crate::schema::{DbVersion, FieldType, SchemaColumn, SchemaRegistry};

    pub use crate::codec::{AmendedSchemaField, SchemaField, TableHeader};

    // Pack reading
    pub use crate::pack::{Pack, PackedFile, ReadOptions, read_pack, read_packs};

    // Pack writing
    pub use crate::pack::writer::{
        Overwrite, OverwriteOperation, SortedOptions, WriteRequest, WriteSummary,
        create_overwrite_pack, execute, files_from_dir, write_pack,
    };

    // Mod operations
    pub use crate::mods::{create_skip_intros_pack, get_packs_in_save, merge_mods};

    // View data
    pub use crate::view::{PackViewData, TableView, get_pack_view_data, get_packs_table_data};
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// CLI module (feature-gated)
#[cfg(feature = "cli")]
pub mod cli;
