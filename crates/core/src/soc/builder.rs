//! Address space construction.
//!
//! This module builds the address space from the memory map configuration. It performs:
//! 1. **Range checks:** Every region and the cartridge window must be non-empty and end at or
//!    below 2^32.
//! 2. **Overlap checks:** No two ranges (cartridge window included) may share an address.
//! 3. **Allocation:** Zero-filled buffers for every region, an empty cartridge slot.

use super::interconnect::AddressSpace;
use super::memory::{Cartridge, MemoryRegion, RegionId};
use crate::common::error::{Error, Result};
use crate::config::MemoryMapConfig;

const CARTRIDGE_NAME: &str = "CARTRIDGE";

/// Half-open address range used for validation.
struct Span<'a> {
    name: &'a str,
    start: u64,
    end: u64,
}

fn checked_span(name: &str, base: u32, size: u32) -> Result<Span<'_>> {
    let start = u64::from(base);
    let end = start + u64::from(size);
    if size == 0 || end > 1u64 << 32 {
        return Err(Error::RegionOutOfRange {
            name: name.to_string(),
            base,
            size,
        });
    }
    Ok(Span { name, start, end })
}

impl AddressSpace {
    /// Builds an address space from a memory map.
    ///
    /// Region ids follow the declared order of `config.regions`.
    ///
    /// # Errors
    ///
    /// `RegionOutOfRange` for empty or overflowing ranges, `RegionOverlap` when two ranges
    /// (including the cartridge window) share an address.
    pub fn from_config(config: &MemoryMapConfig) -> Result<Self> {
        if config.regions.len() > usize::from(u16::MAX) {
            return Err(Error::Config(format!(
                "{} regions exceed the region id space",
                config.regions.len()
            )));
        }

        let mut spans = Vec::with_capacity(config.regions.len() + 1);
        for region in &config.regions {
            spans.push(checked_span(&region.name, region.base, region.size)?);
        }
        spans.push(checked_span(
            CARTRIDGE_NAME,
            config.cartridge_base,
            config.cartridge_max_size,
        )?);

        spans.sort_by_key(|s| s.start);
        for pair in spans.windows(2) {
            if pair[1].start < pair[0].end {
                return Err(Error::RegionOverlap {
                    first: pair[0].name.to_string(),
                    second: pair[1].name.to_string(),
                });
            }
        }

        let regions = config
            .regions
            .iter()
            .enumerate()
            .map(|(i, r)| {
                MemoryRegion::new(
                    RegionId(i as u16),
                    &r.name,
                    r.base,
                    r.size,
                    r.readable,
                    r.writable,
                )
            })
            .collect();
        let cartridge = Cartridge::new(config.cartridge_base, config.cartridge_max_size);

        tracing::debug!(
            regions = config.regions.len(),
            cartridge_base = format_args!("{:#010x}", config.cartridge_base),
            "address space built"
        );
        Ok(Self::from_parts(regions, cartridge, config.unmapped_value))
    }
}
