//! Field decoding
//!
//! SPDX-FileCopyrightText: 2025 `PackSmith` contributors
//!
//! SPDX-License-Identifier: MIT

use std::io::{Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt};

use super::{ByteString, SchemaField};
use crate::error::{Error, Result};
use crate::schema::FieldType;

/// Cursor over a file body that decodes one typed value at a time
pub struct FieldDecoder<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> FieldDecoder<'a> {
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(data),
        }
    }

    /// Start decoding at `offset`
    #[must_use]
    pub fn at(data: &'a [u8], offset: usize) -> Self {
        let mut cursor = Cursor::new(data);
        cursor.set_position(offset as u64);
        Self { cursor }
    }

    #[must_use]
    pub fn position(&self) -> u64 {
        self.cursor.position()
    }

    /// Bytes left after the cursor
    #[must_use]
    pub fn remaining(&self) -> usize {
        let data = self.cursor.get_ref();
        data.len().saturating_sub(self.cursor.position() as usize)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Decode one value of `field_type`.
    ///
    /// `Buffer` consumes every remaining byte.
    pub fn read_field(&mut self, field_type: FieldType) -> Result<SchemaField> {
        let start = self.cursor.position();
        let eof = |_| Error::UnexpectedEof {
            field_type: field_type.to_string(),
            offset: start,
        };

        let field = match field_type {
            FieldType::Boolean => SchemaField::Boolean(self.cursor.read_u8().map_err(eof)? != 0),
            FieldType::I16 => SchemaField::I16(self.cursor.read_i16::<LittleEndian>().map_err(eof)?),
            FieldType::I32 => SchemaField::I32(self.cursor.read_i32::<LittleEndian>().map_err(eof)?),
            FieldType::I64 => SchemaField::I64(self.cursor.read_i64::<LittleEndian>().map_err(eof)?),
            FieldType::F32 => SchemaField::F32(self.cursor.read_f32::<LittleEndian>().map_err(eof)?),
            FieldType::F64 => SchemaField::F64(self.cursor.read_f64::<LittleEndian>().map_err(eof)?),
            FieldType::ColourRGB => {
                SchemaField::ColourRGB(self.cursor.read_i32::<LittleEndian>().map_err(eof)?)
            }
            FieldType::StringU8 => SchemaField::StringU8(self.read_string_u8(field_type)?),
            FieldType::StringU16 => SchemaField::StringU16(self.read_string_u16()?),
            FieldType::OptionalStringU8 => {
                let present = self.cursor.read_u8().map_err(eof)? != 0;
                if present {
                    SchemaField::OptionalStringU8(Some(self.read_string_u8(field_type)?))
                } else {
                    SchemaField::OptionalStringU8(None)
                }
            }
            FieldType::Buffer => {
                let mut rest = Vec::with_capacity(self.remaining());
                self.cursor.read_to_end(&mut rest)?;
                SchemaField::Buffer(rest)
            }
        };
        Ok(field)
    }

    /// int16 length followed by that many 8-bit characters, kept as read
    fn read_string_u8(&mut self, field_type: FieldType) -> Result<ByteString> {
        let start = self.cursor.position();
        let len = self.read_length(field_type)?;
        let mut bytes = vec![0u8; len];
        self.cursor
            .read_exact(&mut bytes)
            .map_err(|_| Error::UnexpectedEof {
                field_type: field_type.to_string(),
                offset: start,
            })?;
        Ok(ByteString::new(bytes))
    }

    /// int16 length in UTF-16 code units followed by UTF-16LE data
    pub fn read_string_u16(&mut self) -> Result<String> {
        let start = self.cursor.position();
        let len = self.read_length(FieldType::StringU16)?;
        let mut units = Vec::with_capacity(len);
        for _ in 0..len {
            let unit = self
                .cursor
                .read_u16::<LittleEndian>()
                .map_err(|_| Error::UnexpectedEof {
                    field_type: FieldType::StringU16.to_string(),
                    offset: start,
                })?;
            units.push(unit);
        }
        Ok(String::from_utf16_lossy(&units))
    }

    fn read_length(&mut self, field_type: FieldType) -> Result<usize> {
        let offset = self.cursor.position();
        let length = self
            .cursor
            .read_i16::<LittleEndian>()
            .map_err(|_| Error::UnexpectedEof {
                field_type: field_type.to_string(),
                offset,
            })?;
        usize::try_from(length).map_err(|_| Error::NegativeLength { length, offset })
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let offset = self.cursor.position();
        self.cursor.read_u8().map_err(|_| Error::UnexpectedEof {
            field_type: "u8".to_string(),
            offset,
        })
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        let offset = self.cursor.position();
        self.cursor
            .read_i32::<LittleEndian>()
            .map_err(|_| Error::UnexpectedEof {
                field_type: "i32".to_string(),
                offset,
            })
    }

    /// Look at the next `N` bytes without consuming them
    #[must_use]
    pub fn peek<const N: usize>(&self) -> Option<[u8; N]> {
        let pos = self.cursor.position() as usize;
        let data = self.cursor.get_ref();
        data.get(pos..pos + N)?.try_into().ok()
    }

    pub fn skip(&mut self, n: usize) {
        let pos = self.cursor.position();
        self.cursor.set_position(pos + n as u64);
    }
}
