//! Savestate data model.
//!
//! This module defines what a savestate contains and how it is laid out. It provides:
//! 1. **Snapshot:** Schema version, register file and one payload per writable region.
//! 2. **Layout:** The fixed region order and sizes a codec encodes against, derived from the
//!    address space so that encoder and decoder always agree.
//! 3. **Codec:** The binary encoder/decoder (see [`codec`]).

/// Binary snapshot codec.
pub mod codec;

pub use codec::SnapshotCodec;

use crate::common::constants::{SNAPSHOT_HEADER_BYTES, SNAPSHOT_REGISTER_BYTES, SNAPSHOT_SCHEMA_VERSION};
use crate::core::regs::MachineRegisters;
use crate::soc::{AddressSpace, RegionId};

/// Contents of one region at snapshot time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionPayload {
    /// Region the bytes belong to.
    pub id: RegionId,
    /// Full region contents.
    pub bytes: Vec<u8>,
}

/// Complete machine state at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineStateSnapshot {
    /// Format version the snapshot was produced with.
    pub schema_version: u32,
    /// Register file.
    pub registers: MachineRegisters,
    /// Region payloads in layout order.
    pub regions: Vec<RegionPayload>,
}

impl MachineStateSnapshot {
    /// Captures registers and every writable region of `mem`.
    pub fn capture(registers: &MachineRegisters, mem: &AddressSpace) -> Self {
        Self {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            registers: registers.clone(),
            regions: mem
                .snapshot_regions()
                .map(|r| RegionPayload {
                    id: r.id(),
                    bytes: r.bytes().to_vec(),
                })
                .collect(),
        }
    }
}

/// Region order and sizes of the encoded format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotLayout {
    regions: Vec<(RegionId, usize)>,
}

impl SnapshotLayout {
    /// Creates a layout from explicit `(id, size)` pairs.
    pub const fn new(regions: Vec<(RegionId, usize)>) -> Self {
        Self { regions }
    }

    /// Derives the layout from the writable regions of an address space.
    pub fn for_address_space(mem: &AddressSpace) -> Self {
        Self::new(
            mem.snapshot_regions()
                .map(|r| (r.id(), r.size() as usize))
                .collect(),
        )
    }

    /// Returns the `(id, size)` pairs in encoding order.
    pub fn regions(&self) -> &[(RegionId, usize)] {
        &self.regions
    }

    /// Returns the exact encoded length of a snapshot with this layout.
    pub fn encoded_len(&self) -> usize {
        SNAPSHOT_HEADER_BYTES
            + SNAPSHOT_REGISTER_BYTES
            + self.regions.iter().map(|(_, size)| size).sum::<usize>()
    }
}
