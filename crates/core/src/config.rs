//! Configuration system for the emulator core.
//!
//! This module defines the configuration structures used to parameterize the core. It provides:
//! 1. **Defaults:** Baseline memory map, entry point, frame budget and rewind depth.
//! 2. **Structures:** Hierarchical config for the memory map, engine, scheduler and rewind ring.
//!
//! Configuration is supplied as JSON (`Config::from_json`, `Config::from_file`) or built with
//! `Config::default()`.

use crate::common::constants;
use crate::common::error::{Error, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Default configuration constants.
///
/// These values define the baseline machine when not explicitly overridden in JSON.
mod defaults {
    use crate::common::constants;

    /// Base of the cartridge window.
    pub const CART_BASE: u32 = constants::CART_BASE;

    /// Largest cartridge image (32 MiB).
    pub const CART_MAX_SIZE: u32 = constants::CART_MAX_SIZE;

    /// Value read from unmapped addresses.
    pub const UNMAPPED_VALUE: u8 = constants::UNMAPPED_VALUE;

    /// Program counter after reset; execution starts at the cartridge header.
    pub const ENTRY_POINT: u32 = constants::CART_BASE;

    /// Cycles granted per tick at speed x1.
    pub const CYCLES_PER_TICK: u64 = constants::CYCLES_PER_FRAME;

    /// Host presentation rate used by the blocking run loop.
    pub const FRAME_RATE_HZ: u32 = 60;

    /// Interval between autosave snapshots.
    pub const AUTOSAVE_INTERVAL_MS: u64 = 5000;

    /// Snapshots kept in memory for rewind.
    pub const MAX_SLOTS: usize = 32;
}

/// Root configuration structure containing all core settings.
///
/// # Examples
///
/// ```
/// use timeslip_core::config::Config;
///
/// let config = Config::default();
/// assert_eq!(config.memory.regions.len(), 6);
/// assert_eq!(config.rewind.max_slots, 32);
/// ```
///
/// Deserializing from JSON; omitted sections keep their defaults:
///
/// ```
/// use timeslip_core::config::Config;
///
/// let json = r#"{
///     "memory": {
///         "regions": [
///             { "name": "WRAM", "base": 33554432, "size": 4096 }
///         ],
///         "cartridge_max_size": 65536
///     },
///     "rewind": { "max_slots": 4 }
/// }"#;
///
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.memory.regions[0].size, 4096);
/// assert!(config.memory.regions[0].writable);
/// assert_eq!(config.rewind.max_slots, 4);
/// assert_eq!(config.scheduler.cycles_per_tick, 280_896);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Memory map
    #[serde(default)]
    pub memory: MemoryMapConfig,
    /// Reference engine settings
    #[serde(default)]
    pub engine: EngineConfig,
    /// Frame scheduler and autosave settings
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Rewind ring settings
    #[serde(default)]
    pub rewind: RewindConfig,
}

impl Config {
    /// Parses a configuration from a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))
    }

    /// Reads and parses a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }
}

/// One fixed memory region.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegionConfig {
    /// Short name (e.g. `"EWRAM"`)
    pub name: String,
    /// First address claimed by the region
    pub base: u32,
    /// Size in bytes
    pub size: u32,
    /// Reads return stored bytes (otherwise the unmapped value)
    #[serde(default = "RegionConfig::default_access")]
    pub readable: bool,
    /// Writes are stored (otherwise dropped)
    #[serde(default = "RegionConfig::default_access")]
    pub writable: bool,
}

impl RegionConfig {
    /// Creates a readable and writable region.
    pub fn rw(name: &str, base: u32, size: u32) -> Self {
        Self {
            name: name.to_string(),
            base,
            size,
            readable: true,
            writable: true,
        }
    }

    fn default_access() -> bool {
        true
    }
}

/// Memory map: fixed regions plus the cartridge window.
#[derive(Debug, Clone, Deserialize)]
pub struct MemoryMapConfig {
    /// Regions in declared order; this order is also the snapshot order
    #[serde(default = "MemoryMapConfig::default_regions")]
    pub regions: Vec<RegionConfig>,

    /// Base of the cartridge window
    #[serde(default = "MemoryMapConfig::default_cartridge_base")]
    pub cartridge_base: u32,

    /// Reserved size of the cartridge window; larger images are rejected
    #[serde(default = "MemoryMapConfig::default_cartridge_max_size")]
    pub cartridge_max_size: u32,

    /// Byte value returned for unmapped or unreadable addresses
    #[serde(default = "MemoryMapConfig::default_unmapped_value")]
    pub unmapped_value: u8,
}

impl MemoryMapConfig {
    fn default_regions() -> Vec<RegionConfig> {
        vec![
            RegionConfig::rw("EWRAM", constants::EWRAM_BASE, constants::EWRAM_SIZE),
            RegionConfig::rw("IWRAM", constants::IWRAM_BASE, constants::IWRAM_SIZE),
            RegionConfig::rw("IO", constants::IO_BASE, constants::IO_SIZE),
            RegionConfig::rw("PALETTE", constants::PALETTE_BASE, constants::PALETTE_SIZE),
            RegionConfig::rw("VRAM", constants::VRAM_BASE, constants::VRAM_SIZE),
            RegionConfig::rw("OAM", constants::OAM_BASE, constants::OAM_SIZE),
        ]
    }

    fn default_cartridge_base() -> u32 {
        defaults::CART_BASE
    }

    fn default_cartridge_max_size() -> u32 {
        defaults::CART_MAX_SIZE
    }

    fn default_unmapped_value() -> u8 {
        defaults::UNMAPPED_VALUE
    }
}

impl Default for MemoryMapConfig {
    fn default() -> Self {
        Self {
            regions: Self::default_regions(),
            cartridge_base: defaults::CART_BASE,
            cartridge_max_size: defaults::CART_MAX_SIZE,
            unmapped_value: defaults::UNMAPPED_VALUE,
        }
    }
}

/// Reference engine settings.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Program counter after reset
    #[serde(default = "EngineConfig::default_entry_point")]
    pub entry_point: u32,
}

impl EngineConfig {
    fn default_entry_point() -> u32 {
        defaults::ENTRY_POINT
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            entry_point: defaults::ENTRY_POINT,
        }
    }
}

/// Frame scheduler settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Cycle budget per tick at speed x1
    #[serde(default = "SchedulerConfig::default_cycles_per_tick")]
    pub cycles_per_tick: u64,

    /// Tick cadence of the blocking run loop
    #[serde(default = "SchedulerConfig::default_frame_rate_hz")]
    pub frame_rate_hz: u32,

    /// Autosave period in milliseconds; 0 disables the autosave task
    #[serde(default = "SchedulerConfig::default_autosave_interval_ms")]
    pub autosave_interval_ms: u64,
}

impl SchedulerConfig {
    /// Returns the autosave period, or `None` when autosave is disabled.
    pub fn autosave_interval(&self) -> Option<Duration> {
        (self.autosave_interval_ms > 0).then(|| Duration::from_millis(self.autosave_interval_ms))
    }

    /// Returns the time between ticks of the blocking run loop.
    pub fn frame_period(&self) -> Duration {
        Duration::from_secs(1) / self.frame_rate_hz.max(1)
    }

    fn default_cycles_per_tick() -> u64 {
        defaults::CYCLES_PER_TICK
    }

    fn default_frame_rate_hz() -> u32 {
        defaults::FRAME_RATE_HZ
    }

    fn default_autosave_interval_ms() -> u64 {
        defaults::AUTOSAVE_INTERVAL_MS
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            cycles_per_tick: defaults::CYCLES_PER_TICK,
            frame_rate_hz: defaults::FRAME_RATE_HZ,
            autosave_interval_ms: defaults::AUTOSAVE_INTERVAL_MS,
        }
    }
}

/// Rewind ring settings.
#[derive(Debug, Clone, Deserialize)]
pub struct RewindConfig {
    /// Snapshots held in memory; each holds every writable region
    #[serde(default = "RewindConfig::default_max_slots")]
    pub max_slots: usize,
}

impl RewindConfig {
    fn default_max_slots() -> usize {
        defaults::MAX_SLOTS
    }
}

impl Default for RewindConfig {
    fn default() -> Self {
        Self {
            max_slots: defaults::MAX_SLOTS,
        }
    }
}
