//! Typed field codec for DB and Loc tables
//!
//! SPDX-FileCopyrightText: 2025 `PackSmith` contributors
//!
//! SPDX-License-Identifier: MIT
//!
//! All values are little-endian. Strings carry an int16 length prefix and
//! no terminator; `StringU16` lengths count UTF-16 code units.

mod bytes;
mod decode;
mod encode;
pub mod frame;
mod rows;
mod table;
mod value;

pub use bytes::ByteString;
pub use decode::FieldDecoder;
pub use encode::{write_field, write_fields, write_string_u16, write_string_u8};
pub use frame::{Frame, TableHeader};
pub use rows::{AmendedSchemaField, amend_rows, chunk_rows, into_rows, row_key};
pub use table::{DecodedTable, LOC_BOM, LOC_TAG, decode_db, decode_loc, encode_db, encode_loc};
pub use value::SchemaField;
