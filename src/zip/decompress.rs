use flate2::Crc;
use flate2::read::DeflateDecoder;
use std::io::Read;

use crate::error::EntryDecodeError;

use super::structures::{CentralDirectoryEntry, CompressionMethod};

/// Turn an entry's raw bytes into its uncompressed content.
///
/// The result is checked against the sizes and CRC-32 recorded in the
/// central directory. Entries whose declared size exceeds `limit` are
/// refused before any inflation happens.
pub fn decompress(
    entry: &CentralDirectoryEntry,
    raw: &[u8],
    limit: u64,
) -> Result<Vec<u8>, EntryDecodeError> {
    if entry.is_encrypted() {
        return Err(EntryDecodeError::Encrypted);
    }
    if entry.uncompressed_size > limit {
        return Err(EntryDecodeError::TooLarge(entry.uncompressed_size));
    }

    let data = match entry.compression_method {
        CompressionMethod::Stored => raw.to_vec(),
        CompressionMethod::Deflate => {
            // The declared size is untrusted until the CRC matches.
            let capacity = entry
                .uncompressed_size
                .min(raw.len().saturating_mul(4) as u64);
            let mut out = Vec::with_capacity(capacity as usize);
            // One byte past the declared size is enough to detect a lying header.
            DeflateDecoder::new(raw)
                .take(entry.uncompressed_size.saturating_add(1))
                .read_to_end(&mut out)
                .map_err(EntryDecodeError::Inflate)?;
            out
        }
        CompressionMethod::Unknown(method) => {
            return Err(EntryDecodeError::UnsupportedCompression(method));
        }
    };

    if data.len() as u64 != entry.uncompressed_size {
        return Err(EntryDecodeError::SizeMismatch {
            expected: entry.uncompressed_size,
            actual: data.len() as u64,
        });
    }

    let mut crc = Crc::new();
    crc.update(&data);
    if crc.sum() != entry.crc32 {
        return Err(EntryDecodeError::CrcMismatch {
            expected: entry.crc32,
            actual: crc.sum(),
        });
    }

    Ok(data)
}
