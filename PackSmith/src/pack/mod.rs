//! SPDX-FileCopyrightText: 2025 `PackSmith` contributors
//!
//! SPDX-License-Identifier: MIT
//!
//! PFH5 pack archive reader and writers
//!
//! ```text
//! header        24 bytes: magic, byte mask, ref file count,
//!               pack index size, packed file count, packed index size
//! header buffer 4 bytes
//! pack index    NUL-terminated dependency pack names
//! file index    per entry: i32 size, [i8 compressed], NUL-terminated name
//! data          entry bodies, contiguous, in index order
//! ```

mod collation;
mod loader;
mod reader;
mod types;
pub mod writer;

pub use collation::{compare_names, sort_packed_files};
pub use loader::read_packs;
pub use reader::{PackReader, read_pack};
pub use types::*;

/// Pack magic bytes
pub const MAGIC: [u8; 4] = *b"PFH5";

/// Size of the fixed header, before the header buffer
pub const HEADER_SIZE: u64 = 24;

/// Length of the header buffer that follows the fixed header
pub const HEADER_BUFFER_LEN: u64 = 4;

/// Value written into the header buffer
pub const HEADER_BUFFER_SENTINEL: u32 = 0x7fff_ffff;

/// Byte mask written by every writer
pub const BYTE_MASK: u32 = 3;
