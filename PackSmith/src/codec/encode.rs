//! Field encoding, the inverse of [`FieldDecoder`](super::FieldDecoder)

use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};

use super::SchemaField;
use crate::error::{Error, Result};

/// Encode one cell
pub fn write_field<W: Write>(writer: &mut W, field: &SchemaField) -> Result<()> {
    match field {
        SchemaField::Boolean(b) => writer.write_u8(u8::from(*b))?,
        SchemaField::I16(v) => writer.write_i16::<LittleEndian>(*v)?,
        SchemaField::I32(v) | SchemaField::ColourRGB(v) => writer.write_i32::<LittleEndian>(*v)?,
        SchemaField::I64(v) => writer.write_i64::<LittleEndian>(*v)?,
        SchemaField::F32(v) => writer.write_f32::<LittleEndian>(*v)?,
        SchemaField::F64(v) => writer.write_f64::<LittleEndian>(*v)?,
        SchemaField::StringU8(s) => write_string_u8(writer, s.as_bytes())?,
        SchemaField::StringU16(s) => write_string_u16(writer, s)?,
        SchemaField::OptionalStringU8(None) => writer.write_u8(0)?,
        SchemaField::OptionalStringU8(Some(s)) => {
            writer.write_u8(1)?;
            write_string_u8(writer, s.as_bytes())?;
        }
        SchemaField::Buffer(bytes) => writer.write_all(bytes)?,
    }
    Ok(())
}

/// Encode a run of cells back to back
pub fn write_fields<W: Write>(writer: &mut W, fields: &[SchemaField]) -> Result<()> {
    for field in fields {
        write_field(writer, field)?;
    }
    Ok(())
}

pub fn write_string_u8<W: Write>(writer: &mut W, bytes: &[u8]) -> Result<()> {
    let len = i16::try_from(bytes.len()).map_err(|_| Error::StringTooLong { len: bytes.len() })?;
    writer.write_i16::<LittleEndian>(len)?;
    writer.write_all(bytes)?;
    Ok(())
}

pub fn write_string_u16<W: Write>(writer: &mut W, s: &str) -> Result<()> {
    let units: Vec<u16> = s.encode_utf16().collect();
    let len = i16::try_from(units.len()).map_err(|_| Error::StringTooLong { len: units.len() })?;
    writer.write_i16::<LittleEndian>(len)?;
    for unit in units {
        writer.write_u16::<LittleEndian>(unit)?;
    }
    Ok(())
}
