//! Memory map validation tests.

use crate::common::harness::small_memory_map;
use timeslip_core::Error;
use timeslip_core::config::{MemoryMapConfig, RegionConfig};
use timeslip_core::soc::{AddressSpace, RegionId};

#[test]
fn default_map_builds() {
    let mem = AddressSpace::from_config(&MemoryMapConfig::default()).unwrap();
    assert_eq!(mem.regions().len(), 6);
    assert_eq!(mem.region(RegionId(4)).unwrap().name(), "VRAM");
    assert_eq!(mem.region(RegionId(4)).unwrap().size(), 96 * 1024);
}

#[test]
fn region_ids_follow_declared_order_not_address_order() {
    let mut map = small_memory_map();
    map.regions.reverse();
    let mem = AddressSpace::from_config(&map).unwrap();
    assert_eq!(mem.region(RegionId(0)).unwrap().name(), "BOOT");
    assert_eq!(mem.region(RegionId(2)).unwrap().name(), "WRAM");
}

#[test]
fn overlapping_regions_are_rejected() {
    let mut map = small_memory_map();
    map.regions.push(RegionConfig::rw("SHADOW", 0x0300_0080, 0x100));
    let err = AddressSpace::from_config(&map).unwrap_err();
    assert!(
        matches!(&err, Error::RegionOverlap { first, second } if first == "WRAM" && second == "SHADOW"),
        "{err:?}"
    );
}

#[test]
fn region_inside_cartridge_window_is_rejected() {
    let mut map = small_memory_map();
    map.regions.push(RegionConfig::rw("SRAM", 0x0800_8000, 0x100));
    let err = AddressSpace::from_config(&map).unwrap_err();
    assert!(matches!(err, Error::RegionOverlap { .. }), "{err:?}");
}

#[test]
fn region_past_end_of_address_space_is_rejected() {
    let mut map = small_memory_map();
    map.regions.push(RegionConfig::rw("HIGH", 0xFFFF_FF00, 0x200));
    let err = AddressSpace::from_config(&map).unwrap_err();
    assert!(matches!(err, Error::RegionOutOfRange { ref name, .. } if name == "HIGH"), "{err:?}");
}

#[test]
fn region_ending_exactly_at_top_is_accepted() {
    let mut map = small_memory_map();
    map.regions.push(RegionConfig::rw("HIGH", 0xFFFF_FF00, 0x100));
    let mem = AddressSpace::from_config(&map).unwrap();
    assert!(mem.is_mapped(0xFFFF_FFFF));
}

#[test]
fn empty_region_is_rejected() {
    let mut map = small_memory_map();
    map.regions.push(RegionConfig::rw("EMPTY", 0x0A00_0000, 0));
    assert!(matches!(
        AddressSpace::from_config(&map),
        Err(Error::RegionOutOfRange { .. })
    ));
}
