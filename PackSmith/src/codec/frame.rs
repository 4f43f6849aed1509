//! DB table preamble frames
//!
//! SPDX-FileCopyrightText: 2025 `PackSmith` contributors
//!
//! SPDX-License-Identifier: MIT
//!
//! A DB file starts with zero or more marker-prefixed frames in any order,
//! then a one-byte table flag and the int32 row count:
//!
//! ```text
//! [FD FE FC FF][i16 len][utf-16 guid]    optional GUID frame
//! [FC FD FE FF][i32 version]             optional version frame
//! [u8 flag][i32 entry_count]             always present
//! ```

use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};

use super::FieldDecoder;
use super::encode::write_string_u16;
use crate::error::{Error, Result};

/// Marker bytes that open a GUID frame
pub const GUID_MARKER: [u8; 4] = [0xFD, 0xFE, 0xFC, 0xFF];

/// Marker bytes that open a version frame
pub const VERSION_MARKER: [u8; 4] = [0xFC, 0xFD, 0xFE, 0xFF];

/// Flag byte written before the row count
pub const TABLE_FLAG: u8 = 1;

/// One parsed preamble item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Guid(String),
    Version(i32),
    /// No more frames; carries the table flag byte that was consumed.
    End { flag: u8 },
}

/// Everything before the first row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableHeader {
    pub guid: Option<String>,
    pub version: Option<i32>,
    pub entry_count: u32,
}

impl TableHeader {
    /// Encoded size of the preamble, including flag and row count
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        let guid = self
            .guid
            .as_ref()
            .map_or(0, |g| 4 + 2 + 2 * g.encode_utf16().count());
        let version = if self.version.is_some() { 8 } else { 0 };
        guid + version + 1 + 4
    }
}

/// Parse the next frame at the decoder position
pub fn next_frame(decoder: &mut FieldDecoder<'_>, file: &str) -> Result<Frame> {
    let bad_frame = |message: String| Error::BadFrame {
        file: file.to_string(),
        message,
    };

    let sniff: [u8; 4] = decoder.peek().ok_or_else(|| {
        bad_frame(format!(
            "{} bytes left where a frame or table flag was expected",
            decoder.remaining()
        ))
    })?;

    match sniff {
        GUID_MARKER => {
            decoder.skip(4);
            let guid = decoder
                .read_string_u16()
                .map_err(|e| bad_frame(format!("GUID frame: {e}")))?;
            Ok(Frame::Guid(guid))
        }
        VERSION_MARKER => {
            decoder.skip(4);
            let version = decoder
                .read_i32()
                .map_err(|e| bad_frame(format!("version frame: {e}")))?;
            Ok(Frame::Version(version))
        }
        _ => {
            // Only the flag byte is consumed; the other three belong to the row count.
            let flag = decoder.read_u8()?;
            Ok(Frame::End { flag })
        }
    }
}

/// Parse the full preamble, leaving the decoder at the first row
pub fn read_table_header(decoder: &mut FieldDecoder<'_>, file: &str) -> Result<TableHeader> {
    let mut header = TableHeader::default();

    loop {
        match next_frame(decoder, file)? {
            Frame::Guid(guid) => header.guid = Some(guid),
            Frame::Version(version) => header.version = Some(version),
            Frame::End { flag } => {
                if flag != TABLE_FLAG {
                    tracing::debug!("{file}: unusual table flag {flag}");
                }
                break;
            }
        }
    }

    let count = decoder.read_i32().map_err(|_| Error::BadFrame {
        file: file.to_string(),
        message: "missing entry count".to_string(),
    })?;
    header.entry_count = u32::try_from(count).map_err(|_| Error::BadFrame {
        file: file.to_string(),
        message: format!("negative entry count {count}"),
    })?;

    Ok(header)
}

/// Write the preamble: GUID frame, version frame, flag, row count
pub fn write_table_header<W: Write>(writer: &mut W, header: &TableHeader) -> Result<()> {
    if let Some(guid) = &header.guid {
        writer.write_all(&GUID_MARKER)?;
        write_string_u16(writer, guid)?;
    }
    if let Some(version) = header.version {
        writer.write_all(&VERSION_MARKER)?;
        writer.write_i32::<LittleEndian>(version)?;
    }
    writer.write_u8(TABLE_FLAG)?;
    let count = i32::try_from(header.entry_count)
        .map_err(|_| Error::PackTooLarge(format!("{} rows in one table", header.entry_count)))?;
    writer.write_i32::<LittleEndian>(count)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guid_frame(guid: &str) -> Vec<u8> {
        let mut out = GUID_MARKER.to_vec();
        write_string_u16(&mut out, guid).unwrap();
        out
    }

    #[test]
    fn test_frames_in_any_order() {
        let mut data = Vec::new();
        data.extend_from_slice(&VERSION_MARKER);
        data.extend_from_slice(&4i32.to_le_bytes());
        data.extend(guid_frame("abc-123"));
        data.push(1);
        data.extend_from_slice(&2i32.to_le_bytes());

        let mut decoder = FieldDecoder::new(&data);
        let header = read_table_header(&mut decoder, "db\\t\\x").unwrap();
        assert_eq!(header.version, Some(4));
        assert_eq!(header.guid.as_deref(), Some("abc-123"));
        assert_eq!(header.entry_count, 2);
        assert!(decoder.is_empty());
    }

    #[test]
    fn test_no_frames() {
        let data = [1u8, 3, 0, 0, 0];
        let mut decoder = FieldDecoder::new(&data);
        assert_eq!(next_frame(&mut decoder, "f").unwrap(), Frame::End { flag: 1 });
        assert_eq!(decoder.position(), 1);
    }

    #[test]
    fn test_header_round_trip_and_len() {
        let header = TableHeader {
            guid: Some("7f1c".into()),
            version: Some(9),
            entry_count: 12,
        };
        let mut out = Vec::new();
        write_table_header(&mut out, &header).unwrap();
        assert_eq!(out.len(), header.encoded_len());

        let mut decoder = FieldDecoder::new(&out);
        assert_eq!(read_table_header(&mut decoder, "f").unwrap(), header);
    }

    #[test]
    fn test_truncated_guid_frame_is_bad_frame() {
        let mut data = GUID_MARKER.to_vec();
        data.extend_from_slice(&20i16.to_le_bytes());
        data.extend_from_slice(&[0x41, 0x00]);

        let mut decoder = FieldDecoder::new(&data);
        assert!(matches!(
            read_table_header(&mut decoder, "f"),
            Err(Error::BadFrame { .. })
        ));
    }

    #[test]
    fn test_too_short_for_preamble() {
        let data = [1u8, 0];
        let mut decoder = FieldDecoder::new(&data);
        assert!(matches!(
            read_table_header(&mut decoder, "f"),
            Err(Error::BadFrame { .. })
        ));
    }
}
