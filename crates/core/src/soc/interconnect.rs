//! Address space arbitration.
//!
//! This module implements the bus that routes accesses to regions. It provides:
//! 1. **Region lookup:** Regions are kept in declared order plus an index sorted by base
//!    address; lookups use a last-hit hint, then a binary search.
//! 2. **Access routing:** Byte, half and word accesses with a direct slice path when the access
//!    fits one region; everything else composes single-byte accesses.
//! 3. **Cartridge:** Loading and ejecting the read-only ROM image.
//! 4. **Snapshot support:** Enumeration of writable regions in declared order.
//!
//! Unmapped reads return the configured unmapped value for every byte; unmapped writes and
//! writes to read-only targets are dropped.

use super::memory::{Cartridge, MemoryRegion, RegionId};
use super::traits::MemoryBus;
use crate::common::error::{Error, Result};
use std::cell::Cell;

/// Where an address resolves to.
#[derive(Clone, Copy)]
enum Target {
    Region(usize),
    Cartridge,
}

/// The machine's memory map.
///
/// Holds the fixed regions (declared order is the snapshot order), the cartridge slot and the
/// unmapped value. Region bounds never change after construction.
pub struct AddressSpace {
    regions: Vec<MemoryRegion>,
    /// Indices into `regions`, sorted by base address.
    by_base: Vec<usize>,
    cartridge: Cartridge,
    unmapped: u8,
    last_hit: Cell<usize>,
}

impl AddressSpace {
    /// Assembles an address space from validated parts.
    ///
    /// Use [`AddressSpace::from_config`](crate::soc::AddressSpace::from_config) to build one
    /// from a memory map with overlap checks.
    pub(crate) fn from_parts(regions: Vec<MemoryRegion>, cartridge: Cartridge, unmapped: u8) -> Self {
        let mut by_base: Vec<usize> = (0..regions.len()).collect();
        by_base.sort_by_key(|&i| regions[i].base());
        Self {
            regions,
            by_base,
            cartridge,
            unmapped,
            last_hit: Cell::new(0),
        }
    }

    /// Returns the value read from unmapped addresses.
    pub const fn unmapped_value(&self) -> u8 {
        self.unmapped
    }

    /// Returns all regions in declared order.
    pub fn regions(&self) -> &[MemoryRegion] {
        &self.regions
    }

    /// Returns a region by id.
    pub fn region(&self, id: RegionId) -> Option<&MemoryRegion> {
        self.regions.get(id.0 as usize)
    }

    /// Returns a region by id, mutably.
    pub fn region_mut(&mut self, id: RegionId) -> Option<&mut MemoryRegion> {
        self.regions.get_mut(id.0 as usize)
    }

    /// Returns a region by name.
    pub fn region_by_name(&self, name: &str) -> Option<&MemoryRegion> {
        self.regions.iter().find(|r| r.name() == name)
    }

    /// Returns the backing bytes of a region.
    pub fn region_bytes(&self, id: RegionId) -> Option<&[u8]> {
        self.region(id).map(MemoryRegion::bytes)
    }

    /// Overwrites a region's contents from a snapshot payload.
    ///
    /// # Errors
    ///
    /// `SnapshotLayoutMismatch` if the region does not exist or the length differs.
    pub fn restore_region(&mut self, id: RegionId, bytes: &[u8]) -> Result<()> {
        match self.region_mut(id) {
            Some(region) => region.restore(bytes),
            None => Err(Error::SnapshotLayoutMismatch {
                index: id.0 as usize,
                reason: format!("no region with id {}", id.0),
            }),
        }
    }

    /// Returns the writable regions in declared order; these make up a snapshot.
    pub fn snapshot_regions(&self) -> impl Iterator<Item = &MemoryRegion> {
        self.regions.iter().filter(|r| r.writable())
    }

    /// Returns the cartridge slot.
    pub const fn cartridge(&self) -> &Cartridge {
        &self.cartridge
    }

    /// Replaces the cartridge image.
    ///
    /// # Errors
    ///
    /// `RegionTooLarge` if the image exceeds the reserved window; nothing changes.
    pub fn load_cartridge(&mut self, data: &[u8]) -> Result<()> {
        self.cartridge.load(data)?;
        tracing::debug!(
            size = data.len(),
            base = format_args!("{:#010x}", self.cartridge.base()),
            "cartridge mapped"
        );
        Ok(())
    }

    /// Ejects the cartridge; its window reads as unmapped again.
    pub fn unload_cartridge(&mut self) {
        self.cartridge.unload();
    }

    /// Zero-fills every region; the cartridge is kept.
    pub fn clear(&mut self) {
        for region in &mut self.regions {
            region.clear();
        }
    }

    /// Returns whether any region or the loaded cartridge claims `addr`.
    pub fn is_mapped(&self, addr: u32) -> bool {
        self.resolve(addr).is_some()
    }

    fn find_region(&self, addr: u32) -> Option<(usize, usize)> {
        let hint = self.last_hit.get();
        if let Some(offset) = self.regions.get(hint).and_then(|r| r.offset_of(addr)) {
            return Some((hint, offset));
        }

        let pos = self
            .by_base
            .partition_point(|&i| self.regions[i].base() <= addr);
        let idx = *self.by_base.get(pos.checked_sub(1)?)?;
        let offset = self.regions[idx].offset_of(addr)?;
        self.last_hit.set(idx);
        Some((idx, offset))
    }

    fn resolve(&self, addr: u32) -> Option<(Target, usize)> {
        if let Some(offset) = self.cartridge.offset_of(addr) {
            return Some((Target::Cartridge, offset));
        }
        self.find_region(addr)
            .map(|(idx, offset)| (Target::Region(idx), offset))
    }

    /// Returns the readable bytes `addr..addr+len` when they sit inside one target.
    fn readable_slice(&self, addr: u32, len: usize) -> Option<&[u8]> {
        let (target, offset) = self.resolve(addr)?;
        let bytes = match target {
            Target::Cartridge => self.cartridge.image()?,
            Target::Region(idx) => {
                let region = &self.regions[idx];
                if !region.readable() {
                    return None;
                }
                region.bytes()
            }
        };
        bytes.get(offset..offset + len)
    }

    /// Returns the writable bytes `addr..addr+len` when they sit inside one region.
    fn writable_slice(&mut self, addr: u32, len: usize) -> Option<&mut [u8]> {
        let (idx, offset) = self.find_region(addr)?;
        let region = &mut self.regions[idx];
        if !region.writable() {
            return None;
        }
        region.bytes_mut().get_mut(offset..offset + len)
    }
}

impl MemoryBus for AddressSpace {
    fn read_u8(&self, addr: u32) -> u8 {
        match self.resolve(addr) {
            Some((Target::Cartridge, offset)) => self
                .cartridge
                .image()
                .and_then(|img| img.get(offset).copied())
                .unwrap_or(self.unmapped),
            Some((Target::Region(idx), offset)) => {
                let region = &self.regions[idx];
                if region.readable() {
                    region.bytes()[offset]
                } else {
                    self.unmapped
                }
            }
            None => self.unmapped,
        }
    }

    fn write_u8(&mut self, addr: u32, val: u8) {
        // Only regions are write targets; the cartridge window never overlaps one.
        if let Some(slot) = self.writable_slice(addr, 1) {
            slot[0] = val;
        }
    }

    fn read_u16(&self, addr: u32) -> u16 {
        if let Some(bytes) = self.readable_slice(addr, 2) {
            return u16::from_le_bytes([bytes[0], bytes[1]]);
        }
        u16::from_le_bytes([self.read_u8(addr), self.read_u8(addr.wrapping_add(1))])
    }

    fn read_u32(&self, addr: u32) -> u32 {
        if let Some(bytes) = self.readable_slice(addr, 4) {
            return u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        }
        u32::from_le_bytes([
            self.read_u8(addr),
            self.read_u8(addr.wrapping_add(1)),
            self.read_u8(addr.wrapping_add(2)),
            self.read_u8(addr.wrapping_add(3)),
        ])
    }

    fn write_u16(&mut self, addr: u32, val: u16) {
        let bytes = val.to_le_bytes();
        if let Some(slot) = self.writable_slice(addr, 2) {
            slot.copy_from_slice(&bytes);
            return;
        }
        for (i, byte) in bytes.into_iter().enumerate() {
            self.write_u8(addr.wrapping_add(i as u32), byte);
        }
    }

    fn write_u32(&mut self, addr: u32, val: u32) {
        let bytes = val.to_le_bytes();
        if let Some(slot) = self.writable_slice(addr, 4) {
            slot.copy_from_slice(&bytes);
            return;
        }
        for (i, byte) in bytes.into_iter().enumerate() {
            self.write_u8(addr.wrapping_add(i as u32), byte);
        }
    }
}

impl std::fmt::Debug for AddressSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddressSpace")
            .field("regions", &self.regions)
            .field("cartridge", &self.cartridge)
            .field("unmapped", &self.unmapped)
            .finish_non_exhaustive()
    }
}
