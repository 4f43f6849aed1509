//! Mod-level operations built on the pack reader and writers
//!
//! - Merge several mod packs into one
//! - Find the packs a save game was made with
//! - Build a pack that skips the game's intro movies

pub mod merge;
pub mod save_scan;
pub mod skip_intros;

pub use merge::merge_mods;
pub use save_scan::{get_packs_in_save, scan_save_bytes};
pub use skip_intros::create_skip_intros_pack;
