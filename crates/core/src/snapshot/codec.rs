//! Binary snapshot codec.
//!
//! Encoded layout, all integers little-endian, no length prefixes:
//!
//! ```text
//! [schema version: u32][r0..r15, status, pc: 18 x u32][region 0]...[region k]
//! ```
//!
//! Region order and sizes come from the [`SnapshotLayout`], which is derived from the same
//! memory map on both ends. Decoding produces a complete value or an error; it never touches
//! live state.

use super::{MachineStateSnapshot, RegionPayload, SnapshotLayout};
use crate::common::constants::{
    REGISTER_WORDS, SNAPSHOT_HEADER_BYTES, SNAPSHOT_REGISTER_BYTES, SNAPSHOT_SCHEMA_VERSION,
};
use crate::common::error::{Error, Result};
use crate::core::regs::MachineRegisters;

/// Encoder/decoder bound to one layout.
#[derive(Debug, Clone)]
pub struct SnapshotCodec {
    layout: SnapshotLayout,
}

impl SnapshotCodec {
    /// Creates a codec for `layout`.
    pub const fn new(layout: SnapshotLayout) -> Self {
        Self { layout }
    }

    /// Returns the layout.
    pub const fn layout(&self) -> &SnapshotLayout {
        &self.layout
    }

    /// Serializes a snapshot.
    ///
    /// # Errors
    ///
    /// `SnapshotLayoutMismatch` if the payload ids or sizes differ from the layout.
    pub fn encode(&self, snapshot: &MachineStateSnapshot) -> Result<Vec<u8>> {
        let expected = self.layout.regions();
        if snapshot.regions.len() != expected.len() {
            return Err(Error::SnapshotLayoutMismatch {
                index: snapshot.regions.len().min(expected.len()),
                reason: format!(
                    "{} payloads for {} layout regions",
                    snapshot.regions.len(),
                    expected.len()
                ),
            });
        }
        for (index, (payload, &(id, size))) in snapshot.regions.iter().zip(expected).enumerate() {
            if payload.id != id || payload.bytes.len() != size {
                return Err(Error::SnapshotLayoutMismatch {
                    index,
                    reason: format!(
                        "payload {:?} has {} bytes, layout expects {:?} with {}",
                        payload.id,
                        payload.bytes.len(),
                        id,
                        size
                    ),
                });
            }
        }

        let mut out = Vec::with_capacity(self.layout.encoded_len());
        out.extend_from_slice(&SNAPSHOT_SCHEMA_VERSION.to_le_bytes());
        for word in snapshot.registers.to_words() {
            out.extend_from_slice(&word.to_le_bytes());
        }
        for payload in &snapshot.regions {
            out.extend_from_slice(&payload.bytes);
        }
        Ok(out)
    }

    /// Deserializes a snapshot.
    ///
    /// The version header is checked before the length, since a different version implies a
    /// different layout.
    ///
    /// # Errors
    ///
    /// * `SnapshotTooShort` - fewer bytes than the header, or than the full layout.
    /// * `SchemaVersionMismatch` - header differs from the supported version.
    /// * `SnapshotTrailingBytes` - more bytes than the layout describes.
    pub fn decode(&self, bytes: &[u8]) -> Result<MachineStateSnapshot> {
        let expected = self.layout.encoded_len();
        let Some(header) = bytes.first_chunk::<SNAPSHOT_HEADER_BYTES>() else {
            return Err(Error::SnapshotTooShort {
                expected,
                actual: bytes.len(),
            });
        };

        let version = u32::from_le_bytes(*header);
        if version != SNAPSHOT_SCHEMA_VERSION {
            return Err(Error::SchemaVersionMismatch {
                expected: SNAPSHOT_SCHEMA_VERSION,
                found: version,
            });
        }
        if bytes.len() < expected {
            return Err(Error::SnapshotTooShort {
                expected,
                actual: bytes.len(),
            });
        }
        if bytes.len() > expected {
            return Err(Error::SnapshotTrailingBytes {
                extra: bytes.len() - expected,
            });
        }

        let reg_block = &bytes[SNAPSHOT_HEADER_BYTES..SNAPSHOT_HEADER_BYTES + SNAPSHOT_REGISTER_BYTES];
        let mut words = [0u32; REGISTER_WORDS];
        for (word, chunk) in words.iter_mut().zip(reg_block.chunks_exact(4)) {
            *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }

        let mut offset = SNAPSHOT_HEADER_BYTES + SNAPSHOT_REGISTER_BYTES;
        let mut regions = Vec::with_capacity(self.layout.regions().len());
        for &(id, size) in self.layout.regions() {
            regions.push(RegionPayload {
                id,
                bytes: bytes[offset..offset + size].to_vec(),
            });
            offset += size;
        }

        Ok(MachineStateSnapshot {
            schema_version: version,
            registers: MachineRegisters::from_words(&words),
            regions,
        })
    }
}
