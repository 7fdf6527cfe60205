//! CRC32 checksums for stored records
//!
//! Uses CRC32 (IEEE polynomial). The checksum covers the record identity
//! (u64 LE) followed by the encoded body, so a body moved under another
//! identity is detected too.

use crc32fast::Hasher;

/// Computes the checksum of a record.
///
/// Deterministic: the same identity and body always produce the same value.
pub(crate) fn record_checksum(id: u64, body: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(&id.to_le_bytes());
    hasher.update(body);
    hasher.finalize()
}
