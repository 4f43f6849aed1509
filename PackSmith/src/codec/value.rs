//! Decoded table cells
//!
//! SPDX-FileCopyrightText: 2025 `PackSmith` contributors
//!
//! SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ByteString;
use crate::error::{Error, Result};
use crate::schema::FieldType;

/// One decoded cell. The variant is the wire type; string lengths are
/// derived from the payload when encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum SchemaField {
    Boolean(bool),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    StringU8(ByteString),
    StringU16(String),
    OptionalStringU8(Option<ByteString>),
    ColourRGB(i32),
    Buffer(Vec<u8>),
}

impl SchemaField {
    #[must_use]
    pub fn field_type(&self) -> FieldType {
        match self {
            SchemaField::Boolean(_) => FieldType::Boolean,
            SchemaField::I16(_) => FieldType::I16,
            SchemaField::I32(_) => FieldType::I32,
            SchemaField::I64(_) => FieldType::I64,
            SchemaField::F32(_) => FieldType::F32,
            SchemaField::F64(_) => FieldType::F64,
            SchemaField::StringU8(_) => FieldType::StringU8,
            SchemaField::StringU16(_) => FieldType::StringU16,
            SchemaField::OptionalStringU8(_) => FieldType::OptionalStringU8,
            SchemaField::ColourRGB(_) => FieldType::ColourRGB,
            SchemaField::Buffer(_) => FieldType::Buffer,
        }
    }

    /// Display/key string for the cell.
    ///
    /// Integers render as plain integers, floats with three decimals,
    /// strings as their payload. 8-bit strings that are not UTF-8 are
    /// converted lossily. Absent optional strings and raw buffers render
    /// as the empty string.
    #[must_use]
    pub fn resolve(&self) -> String {
        match self {
            SchemaField::Boolean(b) => b.to_string(),
            SchemaField::I16(v) => v.to_string(),
            SchemaField::I32(v) | SchemaField::ColourRGB(v) => v.to_string(),
            SchemaField::I64(v) => v.to_string(),
            SchemaField::F32(v) => format!("{v:.3}"),
            SchemaField::F64(v) => format!("{v:.3}"),
            SchemaField::StringU8(s) => s.to_string_lossy().into_owned(),
            SchemaField::StringU16(s) => s.clone(),
            SchemaField::OptionalStringU8(s) => s
                .as_ref()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
            SchemaField::Buffer(_) => String::new(),
        }
    }

    /// Number of bytes this cell occupies on the wire
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        match self {
            SchemaField::StringU8(s) => 2 + s.len(),
            SchemaField::StringU16(s) => 2 + 2 * s.encode_utf16().count(),
            SchemaField::OptionalStringU8(None) => 1,
            SchemaField::OptionalStringU8(Some(s)) => 1 + 2 + s.len(),
            SchemaField::Buffer(b) => b.len(),
            other => other.field_type().fixed_width().unwrap_or(0),
        }
    }

    /// Build a cell of `field_type` from a loosely typed JSON value.
    ///
    /// Strings are parsed into numeric and boolean columns, numbers and
    /// booleans are rendered into string columns.
    pub fn from_json(field_type: FieldType, value: &Value) -> Result<Self> {
        let mismatch = || Error::ValueTypeMismatch {
            field_type: field_type.to_string(),
            value: value.to_string(),
        };

        let field = match field_type {
            FieldType::Boolean => SchemaField::Boolean(json_to_bool(value).ok_or_else(mismatch)?),
            FieldType::I16 => SchemaField::I16(
                json_to_i64(value)
                    .and_then(|v| i16::try_from(v).ok())
                    .ok_or_else(mismatch)?,
            ),
            FieldType::I32 => SchemaField::I32(
                json_to_i64(value)
                    .and_then(|v| i32::try_from(v).ok())
                    .ok_or_else(mismatch)?,
            ),
            FieldType::ColourRGB => SchemaField::ColourRGB(
                json_to_i64(value)
                    .and_then(|v| i32::try_from(v).ok())
                    .ok_or_else(mismatch)?,
            ),
            FieldType::I64 => SchemaField::I64(json_to_i64(value).ok_or_else(mismatch)?),
            FieldType::F32 => SchemaField::F32(json_to_f64(value).ok_or_else(mismatch)? as f32),
            FieldType::F64 => SchemaField::F64(json_to_f64(value).ok_or_else(mismatch)?),
            FieldType::StringU8 => {
                SchemaField::StringU8(json_to_string(value).ok_or_else(mismatch)?.into())
            }
            FieldType::StringU16 => {
                SchemaField::StringU16(json_to_string(value).ok_or_else(mismatch)?)
            }
            FieldType::OptionalStringU8 => match value {
                Value::Null => SchemaField::OptionalStringU8(None),
                other => SchemaField::OptionalStringU8(Some(
                    json_to_string(other).ok_or_else(mismatch)?.into(),
                )),
            },
            FieldType::Buffer => match value {
                Value::String(s) => SchemaField::Buffer(s.as_bytes().to_vec()),
                Value::Array(items) => SchemaField::Buffer(
                    items
                        .iter()
                        .map(|v| v.as_u64().and_then(|b| u8::try_from(b).ok()))
                        .collect::<Option<Vec<u8>>>()
                        .ok_or_else(mismatch)?,
                ),
                _ => return Err(mismatch()),
            },
        };
        Ok(field)
    }

    /// True when `value`, read as this cell's type, resolves to the same
    /// display string.
    #[must_use]
    pub fn matches(&self, value: &Value) -> bool {
        SchemaField::from_json(self.field_type(), value)
            .is_ok_and(|other| other.resolve() == self.resolve())
    }
}

fn json_to_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64()? {
            0 => Some(false),
            1 => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn json_to_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

fn json_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn json_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_numeric_formats() {
        assert_eq!(SchemaField::I32(-42).resolve(), "-42");
        assert_eq!(SchemaField::F32(1.5).resolve(), "1.500");
        assert_eq!(SchemaField::F64(2.0 / 3.0).resolve(), "0.667");
        assert_eq!(SchemaField::Boolean(true).resolve(), "true");
    }

    #[test]
    fn test_resolve_degrades_to_empty() {
        assert_eq!(SchemaField::OptionalStringU8(None).resolve(), "");
        assert_eq!(SchemaField::Buffer(vec![1, 2, 3]).resolve(), "");
    }

    #[test]
    fn test_resolve_latin1_is_lossy() {
        let field = SchemaField::StringU8(b"caf\xE9".to_vec().into());
        assert_eq!(field.resolve(), "caf\u{FFFD}");
        assert_eq!(field.encoded_len(), 6);
    }

    #[test]
    fn test_encoded_len() {
        assert_eq!(SchemaField::StringU8("abc".into()).encoded_len(), 5);
        assert_eq!(SchemaField::StringU16("abc".into()).encoded_len(), 8);
        assert_eq!(SchemaField::OptionalStringU8(None).encoded_len(), 1);
        assert_eq!(SchemaField::OptionalStringU8(Some("ab".into())).encoded_len(), 5);
        assert_eq!(SchemaField::F64(0.0).encoded_len(), 8);
    }

    #[test]
    fn test_from_json_coercions() {
        assert_eq!(
            SchemaField::from_json(FieldType::Boolean, &json!(false)).unwrap(),
            SchemaField::Boolean(false)
        );
        assert_eq!(
            SchemaField::from_json(FieldType::Boolean, &json!("1")).unwrap(),
            SchemaField::Boolean(true)
        );
        assert_eq!(
            SchemaField::from_json(FieldType::I16, &json!("12")).unwrap(),
            SchemaField::I16(12)
        );
        assert!(SchemaField::from_json(FieldType::I16, &json!(70000)).is_err());
        assert_eq!(
            SchemaField::from_json(FieldType::StringU8, &json!(7)).unwrap(),
            SchemaField::StringU8("7".into())
        );
        assert_eq!(
            SchemaField::from_json(FieldType::OptionalStringU8, &Value::Null).unwrap(),
            SchemaField::OptionalStringU8(None)
        );
    }

    #[test]
    fn test_matches_by_resolved_value() {
        assert!(SchemaField::StringU8("rowA".into()).matches(&json!("rowA")));
        assert!(!SchemaField::StringU8("rowA".into()).matches(&json!("rowB")));
        assert!(SchemaField::F32(0.25).matches(&json!(0.25)));
        assert!(SchemaField::F32(0.25).matches(&json!("0.250")));
        assert!(SchemaField::Boolean(true).matches(&json!(true)));
        assert!(!SchemaField::I32(3).matches(&json!("three")));
    }
}
