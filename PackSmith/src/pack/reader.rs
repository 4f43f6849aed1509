//! SPDX-FileCopyrightText: 2025 `PackSmith` contributors
//!
//! SPDX-License-Identifier: MIT
//!
//! PFH5 pack reader with bounds checking and per-entry error isolation

use std::borrow::Cow;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use chrono::{DateTime, Utc};

use super::collation::{compare_names, sort_packed_files};
use super::{HEADER_BUFFER_LEN, HEADER_SIZE, MAGIC, Pack, PackHeader, PackedFile, ReadOptions};
use crate::codec::{FieldDecoder, decode_db, decode_loc, frame::read_table_header};
use crate::compression::decompress_entry;
use crate::error::{Error, Result};
use crate::profile::GameProfile;

/// Low-level PFH5 reader over any `Read + Seek` source
pub struct PackReader<R: Read + Seek> {
    reader: BufReader<R>,
    len: u64,
    has_compression_flag: bool,
    header: Option<PackHeader>,
}

impl<R: Read + Seek> PackReader<R> {
    /// Create a reader; `has_compression_flag` selects the index variant
    ///
    /// # Errors
    /// Returns an error if the source length cannot be determined.
    pub fn new(mut reader: R, has_compression_flag: bool) -> Result<Self> {
        let len = reader.seek(SeekFrom::End(0))?;
        Ok(Self {
            reader: BufReader::new(reader),
            len,
            has_compression_flag,
            header: None,
        })
    }

    /// Total length of the source
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn ensure_available(&self, context: &str, offset: u64, needed: u64) -> Result<()> {
        let available = self.len.saturating_sub(offset);
        if available < needed {
            return Err(Error::Truncated {
                context: context.to_string(),
                needed,
                available,
            });
        }
        Ok(())
    }

    /// Read and validate the fixed header and header buffer
    ///
    /// # Errors
    /// Returns [`Error::InvalidPackMagic`] for a non-PFH5 source and
    /// [`Error::Truncated`] if the source is shorter than the header.
    pub fn read_header(&mut self) -> Result<PackHeader> {
        if self.len >= 4 {
            self.reader.seek(SeekFrom::Start(0))?;
            let mut magic = [0u8; 4];
            self.reader.read_exact(&mut magic)?;
            if magic != MAGIC {
                return Err(Error::InvalidPackMagic(magic));
            }
        }
        self.ensure_available("header", 0, HEADER_SIZE + HEADER_BUFFER_LEN)?;
        self.reader.seek(SeekFrom::Start(4))?;

        let byte_mask = self.reader.read_u32::<LittleEndian>()?;
        let ref_file_count = self.reader.read_u32::<LittleEndian>()?;
        let pack_file_index_size = self.reader.read_u32::<LittleEndian>()?;
        let pack_file_count = self.reader.read_u32::<LittleEndian>()?;
        let packed_file_index_size = self.reader.read_u32::<LittleEndian>()?;
        let mut header_buffer = [0u8; 4];
        self.reader.read_exact(&mut header_buffer)?;

        let header = PackHeader {
            magic: MAGIC,
            byte_mask,
            ref_file_count,
            pack_file_index_size,
            pack_file_count,
            packed_file_index_size,
            header_buffer,
        };
        self.header = Some(header);
        Ok(header)
    }

    fn header(&mut self) -> Result<PackHeader> {
        match self.header {
            Some(header) => Ok(header),
            None => self.read_header(),
        }
    }

    /// Read the dependency pack names
    ///
    /// # Errors
    /// Returns [`Error::Truncated`] if the name list runs past the source.
    pub fn read_dependencies(&mut self) -> Result<Vec<String>> {
        let header = self.header()?;
        let offset = HEADER_SIZE + HEADER_BUFFER_LEN;
        let size = u64::from(header.pack_file_index_size);
        self.ensure_available("dependency index", offset, size)?;

        self.reader.seek(SeekFrom::Start(offset))?;
        let mut bytes = vec![0u8; header.pack_file_index_size as usize];
        self.reader.read_exact(&mut bytes)?;

        Ok(bytes
            .split(|&b| b == 0)
            .filter(|name| !name.is_empty())
            .map(|name| String::from_utf8_lossy(name).into_owned())
            .collect())
    }

    /// Read the file index in on-disk order.
    ///
    /// # Errors
    /// Returns [`Error::Truncated`] if the index is cut short and
    /// [`Error::EntryOutOfBounds`] if an entry lies past the end of the source.
    pub fn read_index(&mut self) -> Result<Vec<PackedFile>> {
        let header = self.header()?;
        let offset = HEADER_SIZE + HEADER_BUFFER_LEN + u64::from(header.pack_file_index_size);
        let size = u64::from(header.packed_file_index_size);
        self.ensure_available("file index", offset, size)?;

        self.reader.seek(SeekFrom::Start(offset))?;
        let mut index = vec![0u8; header.packed_file_index_size as usize];
        self.reader.read_exact(&mut index)?;

        let count = header.pack_file_count as usize;
        let fixed = if self.has_compression_flag { 5 } else { 4 };
        let mut files = Vec::with_capacity(count.min(index.len() / (fixed + 1)));
        let mut cursor = Cursor::new(index.as_slice());
        let mut start_pos = header.data_start();

        for i in 0..count {
            let entry_offset = cursor.position() as usize;
            let truncated = || Error::Truncated {
                context: format!("file index entry {i}"),
                needed: fixed as u64 + 1,
                available: (index.len() - entry_offset) as u64,
            };

            let raw_size = cursor.read_i32::<LittleEndian>().map_err(|_| truncated())?;
            let file_size = u32::try_from(raw_size).map_err(|_| truncated())?;
            let is_compressed = if self.has_compression_flag {
                cursor.read_i8().map_err(|_| truncated())? != 0
            } else {
                false
            };

            let name_start = cursor.position() as usize;
            let Some(name_len) = index[name_start..].iter().position(|&b| b == 0) else {
                return Err(Error::UnterminatedName { offset: name_start });
            };
            let name = String::from_utf8_lossy(&index[name_start..name_start + name_len]).into_owned();
            cursor.set_position((name_start + name_len + 1) as u64);

            let file = PackedFile {
                name,
                file_size,
                start_pos,
                is_compressed,
                ..PackedFile::default()
            };
            if file.end_pos() > self.len {
                return Err(Error::EntryOutOfBounds {
                    name: file.name,
                    start_pos,
                    file_size,
                    pack_size: self.len,
                });
            }
            start_pos = file.end_pos();
            files.push(file);
        }

        if (cursor.position() as usize) < index.len() {
            tracing::debug!(
                "{} unused bytes at the end of the file index",
                index.len() - cursor.position() as usize
            );
        }
        Ok(files)
    }

    /// Read the stored bytes of one entry
    ///
    /// # Errors
    /// Returns an error if the entry cannot be read in full.
    pub fn read_stored(&mut self, file: &PackedFile) -> Result<Vec<u8>> {
        self.ensure_available(&file.name, file.start_pos, u64::from(file.file_size))?;
        self.reader.seek(SeekFrom::Start(file.start_pos))?;
        let mut data = vec![0u8; file.file_size as usize];
        self.reader.read_exact(&mut data)?;
        Ok(data)
    }
}

/// Read a pack from disk.
///
/// Structural problems fail the whole pack. A failure inside one entry is
/// logged and recorded in that entry's `decode_error`; the other entries
/// are unaffected.
///
/// # Errors
/// Returns [`Error::InvalidPackMagic`], [`Error::Truncated`],
/// [`Error::EntryOutOfBounds`] or [`Error::UnterminatedName`] for a
/// structurally broken archive, or an IO error.
pub fn read_pack<P: AsRef<Path>>(path: P, options: &ReadOptions, profile: &GameProfile) -> Result<Pack> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let metadata = file.metadata()?;
    let last_changed = metadata.modified().ok().map(DateTime::<Utc>::from);

    let mut reader = PackReader::new(file, profile.index_has_compression_flag)?;
    let header = reader.read_header()?;
    let dependency_packs = reader.read_dependencies()?;
    let mut packed_files = reader.read_index()?;

    if !options.skip_sorting {
        sort_packed_files(&mut packed_files);
    }

    let mut failed = 0usize;
    for file in &mut packed_files {
        if !options.wants_body(file) {
            continue;
        }
        let stored = match reader.read_stored(file) {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!("Failed to read {} in {}: {e}", file.name, path.display());
                file.decode_error = Some(e.to_string());
                failed += 1;
                continue;
            }
        };
        if !options.skip_table_parsing {
            populate(file, &stored, options, profile);
            if file.decode_error.is_some() {
                failed += 1;
            }
        }
        if options.load_buffers {
            file.buffer = Some(stored);
        }
    }

    if let Some(names) = options.files_to_read() {
        for name in names {
            let found = if options.skip_sorting {
                packed_files.iter().any(|f| &f.name == name)
            } else {
                packed_files
                    .binary_search_by(|f| compare_names(&f.name, name))
                    .is_ok()
            };
            if !found {
                tracing::warn!("{name} is not in {}", path.display());
            }
        }
    }

    let name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
    tracing::info!(
        "Read {name}: {} entries, {} dependencies{}",
        packed_files.len(),
        dependency_packs.len(),
        if failed > 0 { format!(", {failed} failed to decode") } else { String::new() }
    );

    Ok(Pack {
        name,
        path: path.to_path_buf(),
        header,
        dependency_packs,
        packed_files,
        size: reader.len(),
        last_changed,
        is_sorted: !options.skip_sorting,
    })
}

/// Decode an entry body according to its kind and the read options
fn populate(file: &mut PackedFile, stored: &[u8], options: &ReadOptions, profile: &GameProfile) {
    if let Err(e) = try_populate(file, stored, options, profile) {
        tracing::warn!("Failed to decode {}: {e}", file.name);
        file.decode_error = Some(e.to_string());
    }
}

fn try_populate(file: &mut PackedFile, stored: &[u8], options: &ReadOptions, profile: &GameProfile) -> Result<()> {
    let wants_table = file.is_db() || (file.is_loc() && (options.read_text || options.decode_tables));
    let wants_text = file.is_text() && options.read_text;
    if !wants_table && !wants_text {
        return Ok(());
    }

    let body = if file.is_compressed {
        Cow::Owned(decompress_entry(stored)?)
    } else {
        Cow::Borrowed(stored)
    };

    if let Some(table) = file.table_name().map(str::to_string) {
        let mut decoder = FieldDecoder::new(&body);
        let header = read_table_header(&mut decoder, &file.name)?;
        file.version = header.version;
        file.guid = header.guid;
        if !options.decode_tables {
            return Ok(());
        }

        let decoded = decode_db(&file.name, &table, &body, &profile.schema)?;
        file.schema = Some(decoded.schema);
        file.schema_fields = Some(decoded.fields);
        if let Some(error) = decoded.error {
            tracing::warn!("{}: decoding stopped early: {error}", file.name);
            file.decode_error = Some(error);
        }
    } else if file.is_loc() {
        let decoded = decode_loc(&file.name, &body)?;
        file.version = decoded.header.version;
        file.schema = Some(decoded.schema);
        file.schema_fields = Some(decoded.fields);
        if let Some(error) = decoded.error {
            tracing::warn!("{}: decoding stopped early: {error}", file.name);
            file.decode_error = Some(error);
        }
    } else {
        file.text = Some(decode_text(&body));
    }
    Ok(())
}

/// UTF-16LE with a BOM, else UTF-8 with an optional BOM
fn decode_text(data: &[u8]) -> String {
    if let Some(rest) = data.strip_prefix(&[0xFF, 0xFE]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    let data = data.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(data);
    String::from_utf8_lossy(data).into_owned()
}
