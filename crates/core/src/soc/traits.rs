//! Bus access trait.
//!
//! This module defines the `MemoryBus` trait that execution engines fetch and store through.
//! It provides:
//! 1. **Byte access:** The two required primitives, `read_u8` and `write_u8`.
//! 2. **Wide access:** Half-word and word accesses defined as little-endian composition of
//!    successive byte accesses; implementors may override them with a faster path that must
//!    produce the same result.
//! 3. **Width dispatch:** `read`/`write` taking an `AccessWidth`.

/// Width of a bus access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessWidth {
    /// One byte.
    Byte,
    /// Two bytes, little-endian.
    Half,
    /// Four bytes, little-endian.
    Word,
}

impl AccessWidth {
    /// Returns the access size in bytes.
    pub const fn bytes(self) -> u32 {
        match self {
            Self::Byte => 1,
            Self::Half => 2,
            Self::Word => 4,
        }
    }
}

/// Byte-addressed 32-bit bus.
///
/// No alignment faults are modeled: a wide access at any address is the composition of the
/// byte accesses it covers, with addresses wrapping at 2^32.
pub trait MemoryBus {
    /// Reads one byte.
    fn read_u8(&self, addr: u32) -> u8;

    /// Writes one byte; dropped if the target is unmapped or read-only.
    fn write_u8(&mut self, addr: u32, val: u8);

    /// Reads two bytes (little-endian).
    fn read_u16(&self, addr: u32) -> u16 {
        u16::from_le_bytes([self.read_u8(addr), self.read_u8(addr.wrapping_add(1))])
    }

    /// Reads four bytes (little-endian).
    fn read_u32(&self, addr: u32) -> u32 {
        u32::from_le_bytes([
            self.read_u8(addr),
            self.read_u8(addr.wrapping_add(1)),
            self.read_u8(addr.wrapping_add(2)),
            self.read_u8(addr.wrapping_add(3)),
        ])
    }

    /// Writes two bytes (little-endian).
    fn write_u16(&mut self, addr: u32, val: u16) {
        for (i, byte) in val.to_le_bytes().into_iter().enumerate() {
            self.write_u8(addr.wrapping_add(i as u32), byte);
        }
    }

    /// Writes four bytes (little-endian).
    fn write_u32(&mut self, addr: u32, val: u32) {
        for (i, byte) in val.to_le_bytes().into_iter().enumerate() {
            self.write_u8(addr.wrapping_add(i as u32), byte);
        }
    }

    /// Reads `width` bytes at `addr`, zero-extended to 32 bits.
    fn read(&self, addr: u32, width: AccessWidth) -> u32 {
        match width {
            AccessWidth::Byte => u32::from(self.read_u8(addr)),
            AccessWidth::Half => u32::from(self.read_u16(addr)),
            AccessWidth::Word => self.read_u32(addr),
        }
    }

    /// Writes the low `width` bytes of `value` at `addr`.
    fn write(&mut self, addr: u32, value: u32, width: AccessWidth) {
        match width {
            AccessWidth::Byte => self.write_u8(addr, value as u8),
            AccessWidth::Half => self.write_u16(addr, value as u16),
            AccessWidth::Word => self.write_u32(addr, value),
        }
    }
}
