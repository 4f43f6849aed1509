//! Whole-file table decode and encode for DB and Loc files

use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};

use super::frame::{TableHeader, read_table_header, write_table_header};
use super::rows::chunk_rows;
use super::{FieldDecoder, SchemaField, write_fields};
use crate::error::{Error, Result};
use crate::schema::{DbVersion, SchemaRegistry, loc_schema};

/// Byte-order mark opening every Loc file
pub const LOC_BOM: [u8; 2] = [0xFF, 0xFE];

/// Tag following the BOM
pub const LOC_TAG: [u8; 4] = *b"LOC\0";

/// Result of decoding one table file.
///
/// When a field fails to decode, `fields` keeps every complete row read
/// before the failure and `error` describes what went wrong.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedTable {
    pub header: TableHeader,
    pub schema: DbVersion,
    pub fields: Vec<SchemaField>,
    pub error: Option<String>,
}

impl DecodedTable {
    /// Number of complete rows
    #[must_use]
    pub fn row_count(&self) -> usize {
        match self.schema.width() {
            0 => 0,
            width => self.fields.len() / width,
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

/// Decode a DB file body.
///
/// Framing errors and a missing schema fail the whole file. A field error
/// stops decoding at the last complete row.
pub fn decode_db(file: &str, table: &str, data: &[u8], registry: &SchemaRegistry) -> Result<DecodedTable> {
    let mut decoder = FieldDecoder::new(data);
    let header = read_table_header(&mut decoder, file)?;
    let schema = registry.require(table, header.version)?.clone();

    let (fields, error) = decode_rows(&mut decoder, &schema, header.entry_count);
    if error.is_none() && !decoder.is_empty() {
        tracing::debug!("{file}: {} trailing bytes after last row", decoder.remaining());
    }

    Ok(DecodedTable {
        header,
        schema,
        fields,
        error,
    })
}

/// Decode a Loc file body
pub fn decode_loc(file: &str, data: &[u8]) -> Result<DecodedTable> {
    let mut decoder = FieldDecoder::new(data);
    if decoder.peek::<2>() != Some(LOC_BOM) {
        return Err(Error::InvalidLocHeader(file.to_string()));
    }
    decoder.skip(LOC_BOM.len());
    if decoder.peek::<4>() != Some(LOC_TAG) {
        return Err(Error::InvalidLocHeader(file.to_string()));
    }
    decoder.skip(LOC_TAG.len());

    let version = decoder
        .read_i32()
        .map_err(|_| Error::InvalidLocHeader(file.to_string()))?;
    let count = decoder
        .read_i32()
        .map_err(|_| Error::InvalidLocHeader(file.to_string()))?;
    let entry_count = u32::try_from(count).map_err(|_| Error::InvalidLocHeader(file.to_string()))?;

    let schema = loc_schema();
    let header = TableHeader {
        guid: None,
        version: Some(version),
        entry_count,
    };
    let (fields, error) = decode_rows(&mut decoder, &schema, entry_count);

    Ok(DecodedTable {
        header,
        schema,
        fields,
        error,
    })
}

fn decode_rows(
    decoder: &mut FieldDecoder<'_>,
    schema: &DbVersion,
    entry_count: u32,
) -> (Vec<SchemaField>, Option<String>) {
    let width = schema.width();
    // Never trust the declared count for the allocation.
    let capacity = (entry_count as usize)
        .saturating_mul(width)
        .min(decoder.remaining());
    let mut fields = Vec::with_capacity(capacity);

    if width == 0 {
        return (fields, None);
    }

    let mut row = Vec::with_capacity(width);
    for row_index in 0..entry_count {
        row.clear();
        for column in &schema.fields {
            match decoder.read_field(column.field_type) {
                Ok(field) => row.push(field),
                Err(e) => {
                    let message = format!("row {row_index}, column {}: {e}", column.name);
                    return (fields, Some(message));
                }
            }
        }
        fields.append(&mut row);
    }
    (fields, None)
}

/// Encode a DB file body: preamble frames, flag, row count, then rows.
///
/// The row count in `header` is replaced by the number of rows in `fields`.
pub fn encode_db(header: &TableHeader, schema: &DbVersion, fields: &[SchemaField]) -> Result<Vec<u8>> {
    let rows = chunk_rows(fields, schema.width())?;
    let header = TableHeader {
        entry_count: u32::try_from(rows.len())
            .map_err(|_| Error::PackTooLarge(format!("{} rows in one table", rows.len())))?,
        ..header.clone()
    };

    let body: usize = fields.iter().map(SchemaField::encoded_len).sum();
    let mut out = Vec::with_capacity(header.encoded_len() + body);
    write_table_header(&mut out, &header)?;
    write_fields(&mut out, fields)?;
    Ok(out)
}

/// Encode a Loc file body. The version comes from `header` when present.
pub fn encode_loc(header: &TableHeader, fields: &[SchemaField]) -> Result<Vec<u8>> {
    let schema = loc_schema();
    let rows = chunk_rows(fields, schema.width())?;
    let count = i32::try_from(rows.len())
        .map_err(|_| Error::PackTooLarge(format!("{} rows in one table", rows.len())))?;

    let mut out = Vec::new();
    out.write_all(&LOC_BOM)?;
    out.write_all(&LOC_TAG)?;
    out.write_i32::<LittleEndian>(header.version.unwrap_or(schema.version))?;
    out.write_i32::<LittleEndian>(count)?;
    write_fields(&mut out, fields)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldType, SchemaColumn};
    use pretty_assertions::assert_eq;

    fn registry() -> SchemaRegistry {
        let mut registry = SchemaRegistry::new();
        registry.insert(
            "foo_tables",
            DbVersion::new(
                1,
                vec![
                    SchemaColumn::new("key", FieldType::StringU8, true),
                    SchemaColumn::new("enabled", FieldType::Boolean, false),
                ],
            ),
        );
        registry
    }

    fn rows() -> Vec<SchemaField> {
        vec![
            SchemaField::StringU8("rowA".into()),
            SchemaField::Boolean(true),
            SchemaField::StringU8("rowB".into()),
            SchemaField::Boolean(false),
        ]
    }

    #[test]
    fn test_db_round_trip() {
        let registry = registry();
        let schema = registry.resolve("foo_tables", Some(1)).unwrap();
        let header = TableHeader {
            guid: Some("a1b2".into()),
            version: Some(1),
            entry_count: 0,
        };
        let bytes = encode_db(&header, schema, &rows()).unwrap();

        let decoded = decode_db("db\\foo_tables\\data", "foo_tables", &bytes, &registry).unwrap();
        assert!(decoded.is_complete());
        assert_eq!(decoded.header.entry_count, 2);
        assert_eq!(decoded.header.guid.as_deref(), Some("a1b2"));
        assert_eq!(decoded.fields, rows());
        assert_eq!(decoded.row_count(), 2);
    }

    #[test]
    fn test_latin1_key_survives_reencode() {
        let registry = registry();
        let schema = registry.resolve("foo_tables", Some(1)).unwrap();
        // "café" as windows-1252, not valid UTF-8
        let fields = vec![
            SchemaField::StringU8(b"caf\xE9".to_vec().into()),
            SchemaField::Boolean(true),
        ];
        let bytes = encode_db(&TableHeader::default(), schema, &fields).unwrap();
        assert!(bytes.windows(4).any(|w| w == b"caf\xE9"));

        let decoded = decode_db("f", "foo_tables", &bytes, &registry).unwrap();
        assert!(decoded.is_complete());
        let SchemaField::StringU8(key) = &decoded.fields[0] else {
            panic!("expected StringU8, got {:?}", decoded.fields[0]);
        };
        assert_eq!(key.as_bytes(), b"caf\xE9");
        assert_eq!(decoded.fields[0].resolve(), "caf\u{FFFD}");

        let reencoded = encode_db(&decoded.header, &decoded.schema, &decoded.fields).unwrap();
        assert_eq!(reencoded, bytes);
    }

    #[test]
    fn test_truncated_body_keeps_complete_rows() {
        let registry = registry();
        let schema = registry.resolve("foo_tables", Some(1)).unwrap();
        let header = TableHeader {
            guid: None,
            version: Some(1),
            entry_count: 0,
        };
        let mut bytes = encode_db(&header, schema, &rows()).unwrap();
        bytes.truncate(bytes.len() - 3);

        let decoded = decode_db("f", "foo_tables", &bytes, &registry).unwrap();
        assert_eq!(decoded.row_count(), 1);
        assert_eq!(decoded.fields.len(), 2);
        assert!(decoded.error.is_some());
    }

    #[test]
    fn test_missing_schema_fails_file() {
        let data = [1u8, 0, 0, 0, 0];
        assert!(matches!(
            decode_db("f", "bar_tables", &data, &registry()),
            Err(Error::SchemaNotFound(_))
        ));
    }

    #[test]
    fn test_partial_row_refused_on_encode() {
        let schema = registry().resolve("foo_tables", Some(1)).unwrap().clone();
        let mut fields = rows();
        fields.pop();
        assert!(matches!(
            encode_db(&TableHeader::default(), &schema, &fields),
            Err(Error::PartialRow { .. })
        ));
    }

    #[test]
    fn test_loc_round_trip() {
        let fields = vec![
            SchemaField::StringU16("ui_title".into()),
            SchemaField::StringU16("Rome".into()),
            SchemaField::Boolean(false),
        ];
        let bytes = encode_loc(&TableHeader::default(), &fields).unwrap();
        assert_eq!(&bytes[..6], &[0xFF, 0xFE, b'L', b'O', b'C', 0]);

        let decoded = decode_loc("text\\ui.loc", &bytes).unwrap();
        assert_eq!(decoded.header.version, Some(1));
        assert_eq!(decoded.fields, fields);
    }

    #[test]
    fn test_loc_bad_header() {
        assert!(matches!(
            decode_loc("x.loc", b"LOC\0\x01\0\0\0"),
            Err(Error::InvalidLocHeader(_))
        ));
    }
}
