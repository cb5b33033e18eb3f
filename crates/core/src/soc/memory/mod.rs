//! Memory regions.
//!
//! This module implements the backing storage of the address space. It provides:
//! 1. **Region:** A fixed-size byte buffer mapped at a base address with read/write permissions.
//! 2. **Cartridge:** The read-only, variable-size slot for the loaded ROM image.

/// Cartridge slot.
pub mod cartridge;

pub use cartridge::Cartridge;

use crate::common::error::{Error, Result};

/// Stable identifier of a region: its position in the declared memory map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionId(pub u16);

/// A fixed range of addressable memory with its own buffer and permissions.
pub struct MemoryRegion {
    id: RegionId,
    name: String,
    base: u32,
    bytes: Box<[u8]>,
    readable: bool,
    writable: bool,
}

impl MemoryRegion {
    /// Creates a zero-filled region.
    ///
    /// # Arguments
    ///
    /// * `id` - Position in the declared memory map.
    /// * `name` - Short name used in logs and errors.
    /// * `base` - First claimed address.
    /// * `size` - Size in bytes.
    /// * `readable` - Whether reads return stored bytes.
    /// * `writable` - Whether writes are stored.
    pub fn new(id: RegionId, name: &str, base: u32, size: u32, readable: bool, writable: bool) -> Self {
        Self {
            id,
            name: name.to_string(),
            base,
            bytes: vec![0u8; size as usize].into_boxed_slice(),
            readable,
            writable,
        }
    }

    /// Returns the region identifier.
    pub const fn id(&self) -> RegionId {
        self.id
    }

    /// Returns the region name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the first claimed address.
    pub const fn base(&self) -> u32 {
        self.base
    }

    /// Returns the size in bytes.
    pub fn size(&self) -> u32 {
        self.bytes.len() as u32
    }

    /// Returns one past the last claimed address, widened so `base + size == 2^32` fits.
    pub fn end(&self) -> u64 {
        self.base as u64 + self.bytes.len() as u64
    }

    /// Returns whether reads return stored bytes.
    pub const fn readable(&self) -> bool {
        self.readable
    }

    /// Returns whether writes are stored.
    pub const fn writable(&self) -> bool {
        self.writable
    }

    /// Returns the offset of `addr` inside the region, if claimed.
    #[inline]
    pub fn offset_of(&self, addr: u32) -> Option<usize> {
        (addr >= self.base && u64::from(addr) < self.end()).then(|| (addr - self.base) as usize)
    }

    /// Returns the backing bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the backing bytes mutably, bypassing the write permission.
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    /// Replaces the whole buffer contents; the length must match exactly.
    pub fn restore(&mut self, data: &[u8]) -> Result<()> {
        if data.len() != self.bytes.len() {
            return Err(Error::SnapshotLayoutMismatch {
                index: self.id.0 as usize,
                reason: format!(
                    "region {} holds {} bytes, payload has {}",
                    self.name,
                    self.bytes.len(),
                    data.len()
                ),
            });
        }
        self.bytes.copy_from_slice(data);
        Ok(())
    }

    /// Zero-fills the buffer.
    pub fn clear(&mut self) {
        self.bytes.fill(0);
    }
}

impl std::fmt::Debug for MemoryRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryRegion")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("base", &format_args!("{:#010x}", self.base))
            .field("size", &format_args!("{:#x}", self.bytes.len()))
            .field("readable", &self.readable)
            .field("writable", &self.writable)
            .finish()
    }
}
