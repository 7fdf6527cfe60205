//! Stored record format
//!
//! A document is kept in its encoded form:
//!
//! ```text
//! +------------------+
//! | Document ID      | (u64)
//! +------------------+
//! | Body             | (serde_json bytes of the field mapping)
//! +------------------+
//! | Checksum         | (u32, CRC32 over id LE bytes + body)
//! +------------------+
//! ```
//!
//! Records are immutable once built. Decoding always verifies the checksum.

use serde_json::{Map, Value};

use super::checksum::record_checksum;
use super::{Document, DocumentId};
use crate::errors::{StoreError, StoreResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StoredRecord {
    id: DocumentId,
    body: Vec<u8>,
    checksum: u32,
}

impl StoredRecord {
    /// Serializes `fields`, rejecting bodies larger than `max_bytes`.
    ///
    /// The body does not depend on the identity, so callers can encode
    /// before they know which id the record will get.
    pub(crate) fn encode_body(
        fields: &Map<String, Value>,
        max_bytes: usize,
    ) -> StoreResult<Vec<u8>> {
        let body = serde_json::to_vec(fields)?;

        if body.len() > max_bytes {
            return Err(StoreError::DocumentTooLarge {
                size: body.len(),
                max: max_bytes,
            });
        }

        Ok(body)
    }

    /// Binds an encoded body to `id` and checksums both.
    pub(crate) fn seal(id: DocumentId, body: Vec<u8>) -> Self {
        let checksum = record_checksum(id.as_u64(), &body);
        Self { id, body, checksum }
    }

    #[cfg(test)]
    pub(crate) fn encode(
        id: DocumentId,
        fields: &Map<String, Value>,
        max_bytes: usize,
    ) -> StoreResult<Self> {
        Ok(Self::seal(id, Self::encode_body(fields, max_bytes)?))
    }

    pub(crate) fn id(&self) -> DocumentId {
        self.id
    }

    /// Encoded body size in bytes
    pub(crate) fn size(&self) -> u64 {
        self.body.len() as u64
    }

    pub(crate) fn verify(&self) -> bool {
        record_checksum(self.id.as_u64(), &self.body) == self.checksum
    }

    /// Decodes the record, verifying its checksum first.
    ///
    /// # Errors
    ///
    /// Returns `DOCSTORE_DATA_CORRUPTION` if the checksum does not match or
    /// the body is not a mapping.
    pub(crate) fn decode(&self) -> StoreResult<Document> {
        if !self.verify() {
            return Err(StoreError::corruption(self.id, "checksum mismatch"));
        }

        let fields: Map<String, Value> = serde_json::from_slice(&self.body).map_err(|e| {
            StoreError::corruption(self.id, format!("body does not decode: {}", e))
        })?;

        Ok(Document::new(self.id, fields))
    }

    #[cfg(test)]
    pub(crate) fn flip_body_byte(&mut self, index: usize) {
        self.body[index] ^= 0x01;
    }
}
