//! Snapshot codec tests.
//!
//! Verifies the byte layout, the order in which malformed buffers are rejected and that
//! encode/decode are inverse for every well-formed snapshot.

use crate::common::harness::{SNAPSHOT_LEN, VRAM_SIZE, WRAM_BASE, WRAM_SIZE, small_memory_map};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use timeslip_core::Error;
use timeslip_core::core::MachineRegisters;
use timeslip_core::snapshot::{MachineStateSnapshot, RegionPayload, SnapshotCodec, SnapshotLayout};
use timeslip_core::soc::{AddressSpace, MemoryBus, RegionId};

fn space() -> AddressSpace {
    AddressSpace::from_config(&small_memory_map()).unwrap()
}

fn codec() -> SnapshotCodec {
    SnapshotCodec::new(SnapshotLayout::for_address_space(&space()))
}

fn encoded_blank() -> Vec<u8> {
    let mem = space();
    codec()
        .encode(&MachineStateSnapshot::capture(&MachineRegisters::default(), &mem))
        .unwrap()
}

// ══════════════════════════════════════════════════════════
// 1. Layout
// ══════════════════════════════════════════════════════════

#[test]
fn layout_lists_writable_regions_in_declared_order() {
    let layout = SnapshotLayout::for_address_space(&space());
    assert_eq!(
        layout.regions(),
        &[(RegionId(0), WRAM_SIZE as usize), (RegionId(1), VRAM_SIZE as usize)]
    );
    assert_eq!(layout.encoded_len(), SNAPSHOT_LEN);
}

#[test]
fn header_and_registers_are_little_endian() {
    let mut mem = space();
    mem.write_u32(WRAM_BASE, 0x4433_2211);
    let mut regs = MachineRegisters::with_pc(0x0800_0010);
    regs.write(0, 0xDDCC_BBAA);
    regs.status = 0x20;

    let bytes = codec()
        .encode(&MachineStateSnapshot::capture(&regs, &mem))
        .unwrap();

    assert_eq!(bytes.len(), SNAPSHOT_LEN);
    assert_eq!(&bytes[0..4], &[1, 0, 0, 0]);
    assert_eq!(&bytes[4..8], &[0xAA, 0xBB, 0xCC, 0xDD]);
    assert_eq!(&bytes[68..72], &[0x20, 0, 0, 0]);
    assert_eq!(&bytes[72..76], &[0x10, 0, 0, 0x08]);
    assert_eq!(&bytes[76..80], &[0x11, 0x22, 0x33, 0x44]);
}

#[test]
fn encode_rejects_payloads_that_disagree_with_layout() {
    let mem = space();
    let mut snapshot = MachineStateSnapshot::capture(&MachineRegisters::default(), &mem);
    snapshot.regions[1].bytes.pop();
    let err = codec().encode(&snapshot).unwrap_err();
    assert!(matches!(err, Error::SnapshotLayoutMismatch { index: 1, .. }), "{err:?}");

    snapshot.regions.truncate(1);
    assert!(matches!(
        codec().encode(&snapshot),
        Err(Error::SnapshotLayoutMismatch { .. })
    ));
}

#[test]
fn encode_rejects_swapped_region_ids() {
    let layout = SnapshotLayout::new(vec![(RegionId(0), 2), (RegionId(1), 2)]);
    let snapshot = MachineStateSnapshot {
        schema_version: 1,
        registers: MachineRegisters::default(),
        regions: vec![
            RegionPayload { id: RegionId(1), bytes: vec![0; 2] },
            RegionPayload { id: RegionId(0), bytes: vec![0; 2] },
        ],
    };
    assert!(matches!(
        SnapshotCodec::new(layout).encode(&snapshot),
        Err(Error::SnapshotLayoutMismatch { index: 0, .. })
    ));
}

// ══════════════════════════════════════════════════════════
// 2. Malformed input
// ══════════════════════════════════════════════════════════

#[test]
fn buffer_shorter_than_header_is_too_short() {
    let err = codec().decode(&[1, 0, 0]).unwrap_err();
    assert!(
        matches!(err, Error::SnapshotTooShort { expected: SNAPSHOT_LEN, actual: 3 }),
        "{err:?}"
    );
    assert!(matches!(codec().decode(&[]), Err(Error::SnapshotTooShort { .. })));
}

#[test]
fn version_is_checked_before_length() {
    let err = codec().decode(&[2, 0, 0, 0]).unwrap_err();
    assert!(
        matches!(err, Error::SchemaVersionMismatch { expected: 1, found: 2 }),
        "{err:?}"
    );
}

#[test]
fn truncated_buffer_is_too_short() {
    let bytes = encoded_blank();
    let err = codec().decode(&bytes[..bytes.len() - 1]).unwrap_err();
    assert!(
        matches!(err, Error::SnapshotTooShort { expected: SNAPSHOT_LEN, .. }),
        "{err:?}"
    );
}

#[test]
fn trailing_bytes_are_rejected() {
    let mut bytes = encoded_blank();
    bytes.push(0);
    let err = codec().decode(&bytes).unwrap_err();
    assert!(matches!(err, Error::SnapshotTrailingBytes { extra: 1 }), "{err:?}");
}

// ══════════════════════════════════════════════════════════
// 3. Round trip
// ══════════════════════════════════════════════════════════

#[test]
fn decode_recovers_captured_state() {
    let mut mem = space();
    mem.write_u32(WRAM_BASE + 0x10, 0xCAFE_F00D);
    let mut regs = MachineRegisters::with_pc(0x0800_0100);
    regs.write(7, 77);
    let captured = MachineStateSnapshot::capture(&regs, &mem);

    let decoded = codec().decode(&codec().encode(&captured).unwrap()).unwrap();
    assert_eq!(decoded, captured);
}

proptest! {
    #[test]
    fn encode_decode_is_identity(
        words in prop::array::uniform18(any::<u32>()),
        wram in prop::collection::vec(any::<u8>(), WRAM_SIZE as usize),
        vram in prop::collection::vec(any::<u8>(), VRAM_SIZE as usize),
    ) {
        let snapshot = MachineStateSnapshot {
            schema_version: 1,
            registers: MachineRegisters::from_words(&words),
            regions: vec![
                RegionPayload { id: RegionId(0), bytes: wram },
                RegionPayload { id: RegionId(1), bytes: vram },
            ],
        };
        let codec = codec();
        let bytes = codec.encode(&snapshot).unwrap();
        prop_assert_eq!(bytes.len(), SNAPSHOT_LEN);
        prop_assert_eq!(codec.decode(&bytes).unwrap(), snapshot);
    }
}
