//! Header and index emission shared by every write strategy

use std::borrow::Cow;
use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::error::{Error, Result};
use crate::pack::{BYTE_MASK, HEADER_BUFFER_SENTINEL, MAGIC, PackHeader};

/// Where an entry's stored bytes come from
#[derive(Debug)]
pub(crate) enum EntrySource<'a> {
    /// Bytes already in memory
    Bytes(Cow<'a, [u8]>),
    /// Verbatim copy from the source archive
    Copy { start_pos: u64 },
}

/// One entry in final write order
#[derive(Debug)]
pub(crate) struct PlannedEntry<'a> {
    pub name: Cow<'a, str>,
    pub size: u32,
    pub is_compressed: bool,
    pub source: EntrySource<'a>,
}

impl<'a> PlannedEntry<'a> {
    pub fn from_bytes(name: impl Into<Cow<'a, str>>, bytes: Cow<'a, [u8]>, is_compressed: bool) -> Result<Self> {
        let name = name.into();
        let size = u32::try_from(bytes.len())
            .map_err(|_| Error::PackTooLarge(format!("{name} is {} bytes", bytes.len())))?;
        Ok(Self {
            name,
            size,
            is_compressed,
            source: EntrySource::Bytes(bytes),
        })
    }
}

fn to_u32(value: usize, what: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::PackTooLarge(format!("{what} is {value}")))
}

/// Byte length of the NUL-terminated dependency list
pub(crate) fn dependency_index_size(dependencies: &[String]) -> usize {
    dependencies.iter().map(|d| d.len() + 1).sum()
}

/// Byte length of the file index: size, optional flag, name and NUL per entry
pub(crate) fn file_index_size(entries: &[PlannedEntry<'_>], with_flag: bool) -> usize {
    let fixed = if with_flag { 5 } else { 4 };
    entries.iter().map(|e| e.name.len() + 1 + fixed).sum()
}

/// Build the header for `entries` in their final order
pub(crate) fn build_header(
    dependencies: &[String],
    entries: &[PlannedEntry<'_>],
    with_flag: bool,
) -> Result<PackHeader> {
    Ok(PackHeader {
        magic: MAGIC,
        byte_mask: BYTE_MASK,
        ref_file_count: 0,
        pack_file_index_size: to_u32(dependency_index_size(dependencies), "dependency index")?,
        pack_file_count: to_u32(entries.len(), "entry count")?,
        packed_file_index_size: to_u32(file_index_size(entries, with_flag), "file index")?,
        header_buffer: HEADER_BUFFER_SENTINEL.to_le_bytes(),
    })
}

/// Write header, header buffer, dependency list and file index
pub(crate) fn write_preamble<W: Write>(
    out: &mut W,
    header: &PackHeader,
    dependencies: &[String],
    entries: &[PlannedEntry<'_>],
    with_flag: bool,
) -> Result<()> {
    out.write_all(&header.magic)?;
    out.write_u32::<LittleEndian>(header.byte_mask)?;
    out.write_u32::<LittleEndian>(header.ref_file_count)?;
    out.write_u32::<LittleEndian>(header.pack_file_index_size)?;
    out.write_u32::<LittleEndian>(header.pack_file_count)?;
    out.write_u32::<LittleEndian>(header.packed_file_index_size)?;
    out.write_all(&header.header_buffer)?;

    for dependency in dependencies {
        out.write_all(dependency.as_bytes())?;
        out.write_u8(0)?;
    }

    for entry in entries {
        let size = i32::try_from(entry.size)
            .map_err(|_| Error::PackTooLarge(format!("{} is {} bytes", entry.name, entry.size)))?;
        out.write_i32::<LittleEndian>(size)?;
        if with_flag {
            out.write_i8(i8::from(entry.is_compressed))?;
        }
        out.write_all(entry.name.as_bytes())?;
        out.write_u8(0)?;
    }
    Ok(())
}
