//! Grouping a flat cell stream into rows

use serde::Serialize;

use super::SchemaField;
use crate::error::{Error, Result};
use crate::schema::{DbVersion, FieldType};

/// A decoded cell with its column metadata and resolved display string
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AmendedSchemaField {
    pub name: String,
    pub field_type: FieldType,
    pub is_key: bool,
    pub value: SchemaField,
    pub resolved: String,
}

/// Split `fields` into rows of `width` cells. A trailing partial row is
/// corruption and is rejected.
pub fn chunk_rows<T>(fields: &[T], width: usize) -> Result<Vec<&[T]>> {
    if width == 0 {
        return if fields.is_empty() {
            Ok(Vec::new())
        } else {
            Err(Error::PartialRow {
                fields: fields.len(),
                width,
            })
        };
    }
    if fields.len() % width != 0 {
        return Err(Error::PartialRow {
            fields: fields.len(),
            width,
        });
    }
    Ok(fields.chunks_exact(width).collect())
}

/// Owned variant of [`chunk_rows`], used when rows are edited
pub fn into_rows(fields: Vec<SchemaField>, width: usize) -> Result<Vec<Vec<SchemaField>>> {
    chunk_rows(&fields, width)?;
    if width == 0 {
        return Ok(Vec::new());
    }

    let mut rows = Vec::with_capacity(fields.len() / width);
    let mut iter = fields.into_iter();
    loop {
        let row: Vec<SchemaField> = iter.by_ref().take(width).collect();
        if row.is_empty() {
            break;
        }
        rows.push(row);
    }
    Ok(rows)
}

/// Attach schema column metadata and display strings to each row
pub fn amend_rows(fields: &[SchemaField], schema: &DbVersion) -> Result<Vec<Vec<AmendedSchemaField>>> {
    let rows = chunk_rows(fields, schema.width())?;
    Ok(rows
        .into_iter()
        .map(|row| {
            row.iter()
                .zip(&schema.fields)
                .map(|(value, column)| AmendedSchemaField {
                    name: column.name.clone(),
                    field_type: column.field_type,
                    is_key: column.is_key,
                    resolved: value.resolve(),
                    value: value.clone(),
                })
                .collect()
        })
        .collect())
}

/// Composite key of a row: the resolved key columns joined by `|`
#[must_use]
pub fn row_key(row: &[AmendedSchemaField]) -> String {
    row.iter()
        .filter(|cell| cell.is_key)
        .map(|cell| cell.resolved.as_str())
        .collect::<Vec<_>>()
        .join("|")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaColumn;

    fn schema() -> DbVersion {
        DbVersion::new(
            1,
            vec![
                SchemaColumn::new("key", FieldType::StringU8, true),
                SchemaColumn::new("enabled", FieldType::Boolean, false),
            ],
        )
    }

    fn fields() -> Vec<SchemaField> {
        vec![
            SchemaField::StringU8("a".into()),
            SchemaField::Boolean(true),
            SchemaField::StringU8("b".into()),
            SchemaField::Boolean(false),
        ]
    }

    #[test]
    fn test_chunk_rows() {
        let fields = fields();
        let rows = chunk_rows(&fields, 2).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][0], SchemaField::StringU8("b".into()));
    }

    #[test]
    fn test_partial_row_is_rejected() {
        let mut fields = fields();
        fields.pop();
        assert!(matches!(
            chunk_rows(&fields, 2),
            Err(Error::PartialRow { fields: 3, width: 2 })
        ));
    }

    #[test]
    fn test_into_rows_keeps_order() {
        let rows = into_rows(fields(), 2).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][1], SchemaField::Boolean(true));
    }

    #[test]
    fn test_amend_rows_and_key() {
        let rows = amend_rows(&fields(), &schema()).unwrap();
        assert_eq!(rows[0][1].name, "enabled");
        assert_eq!(rows[0][1].resolved, "true");
        assert_eq!(row_key(&rows[1]), "b");
    }
}
