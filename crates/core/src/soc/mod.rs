//! Machine memory components.
//!
//! This module organizes the pieces that make up the addressable memory of the machine:
//! the fixed regions, the cartridge slot, the address space that arbitrates between them,
//! and the builder that assembles it from configuration.

/// Address space construction from the memory map configuration.
pub mod builder;

/// Address space arbitration and access routing.
pub mod interconnect;

/// Memory regions and the cartridge slot.
pub mod memory;

/// Bus access trait used by execution engines.
pub mod traits;

pub use interconnect::AddressSpace;
pub use memory::{MemoryRegion, RegionId};
pub use traits::{AccessWidth, MemoryBus};
