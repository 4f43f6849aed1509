//! Zstd framing for compressed pack entries
//!
//! SPDX-FileCopyrightText: 2025 `PackSmith` contributors
//!
//! SPDX-License-Identifier: MIT
//!
//! A compressed entry body is a 4-byte little-endian uncompressed size
//! followed by one zstd frame.

use std::io::{Read, Write};

use crate::error::{Error, Result};

/// Length of the uncompressed-size prefix
pub const SIZE_PREFIX_LEN: usize = 4;

/// Upper bound on the zstd expansion ratio used to size the output buffer
const MAX_RATIO: usize = 16;

/// Compression level used when the writer compresses an entry
pub const DEFAULT_LEVEL: i32 = 3;

/// Decompress one framed entry body
///
/// # Errors
/// Returns [`Error::DecompressionFailed`] if the prefix is missing, the
/// zstd frame is corrupt, or the output length disagrees with the prefix.
pub fn decompress_entry(framed: &[u8]) -> Result<Vec<u8>> {
    let Some((prefix, payload)) = framed.split_first_chunk::<SIZE_PREFIX_LEN>() else {
        return Err(Error::DecompressionFailed {
            message: format!("{} bytes is too short for the size prefix", framed.len()),
        });
    };
    let size = u32::from_le_bytes(*prefix);
    let expected = size as usize;

    let decoder = zstd::stream::Decoder::new(payload).map_err(|e| Error::DecompressionFailed {
        message: e.to_string(),
    })?;
    // The prefix is untrusted: cap the allocation and stop one byte past it.
    let mut out = Vec::with_capacity(expected.min(payload.len().saturating_mul(MAX_RATIO)));
    decoder
        .take(u64::from(size) + 1)
        .read_to_end(&mut out)
        .map_err(|e| Error::DecompressionFailed {
            message: e.to_string(),
        })?;

    if out.len() != expected {
        return Err(Error::DecompressionFailed {
            message: format!("expected {expected} bytes, got {}", out.len()),
        });
    }
    Ok(out)
}

/// Compress `data` into a framed entry body
///
/// # Errors
/// Returns [`Error::CompressionFailed`] if the encoder fails or `data` is
/// larger than the size prefix can express.
pub fn compress_entry(data: &[u8], level: i32) -> Result<Vec<u8>> {
    let size = u32::try_from(data.len()).map_err(|_| Error::CompressionFailed {
        message: format!("{} bytes exceeds the 4-byte size prefix", data.len()),
    })?;

    let mut out = Vec::with_capacity(SIZE_PREFIX_LEN + data.len() / 2);
    out.extend_from_slice(&size.to_le_bytes());

    let failed = |e: std::io::Error| Error::CompressionFailed {
        message: e.to_string(),
    };
    let mut encoder = zstd::stream::Encoder::new(&mut out, level.max(1)).map_err(failed)?;
    encoder.write_all(data).map_err(failed)?;
    encoder.finish().map_err(failed)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_framed_entry() {
        let data = b"db\\units_tables\\data".repeat(64);
        let framed = compress_entry(&data, DEFAULT_LEVEL).unwrap();
        assert_eq!(&framed[..4], &(data.len() as u32).to_le_bytes());
        assert!(framed.len() < data.len());
        assert_eq!(decompress_entry(&framed).unwrap(), data);
    }

    #[test]
    fn test_size_mismatch_is_rejected() {
        let mut framed = compress_entry(b"hello", DEFAULT_LEVEL).unwrap();
        framed[0] = 9;
        assert!(matches!(
            decompress_entry(&framed),
            Err(Error::DecompressionFailed { .. })
        ));
    }

    #[test]
    fn test_output_stops_past_declared_size() {
        let data = vec![7u8; 100];
        let mut framed = compress_entry(&data, DEFAULT_LEVEL).unwrap();
        framed[..4].copy_from_slice(&10u32.to_le_bytes());
        let err = decompress_entry(&framed).unwrap_err();
        let Error::DecompressionFailed { message } = &err else {
            panic!("expected DecompressionFailed, got {err:?}");
        };
        assert_eq!(message, "expected 10 bytes, got 11");
    }

    #[test]
    fn test_huge_prefix_on_small_payload() {
        let mut framed = compress_entry(b"hello", DEFAULT_LEVEL).unwrap();
        framed[..4].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(
            decompress_entry(&framed),
            Err(Error::DecompressionFailed { .. })
        ));
    }

    #[test]
    fn test_missing_prefix() {
        assert!(decompress_entry(&[1, 2]).is_err());
    }

    #[test]
    fn test_garbage_payload() {
        let framed = [5, 0, 0, 0, 0xde, 0xad, 0xbe, 0xef];
        assert!(decompress_entry(&framed).is_err());
    }
}
