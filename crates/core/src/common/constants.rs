//! Global System Constants.
//!
//! This module defines constants used across the core. It includes:
//! 1. **Memory Map:** Base addresses and sizes of the default regions and the cartridge window.
//! 2. **Register File:** Number of general purpose registers and the status mode bit.
//! 3. **Snapshot Format:** Schema version and fixed header sizes.
//! 4. **Persistence:** Collection and pointer key names in the persistent store.

/// Base address of on-board work RAM (256 KiB).
pub const EWRAM_BASE: u32 = 0x0200_0000;

/// Size of on-board work RAM.
pub const EWRAM_SIZE: u32 = 256 * 1024;

/// Base address of in-chip work RAM (32 KiB).
pub const IWRAM_BASE: u32 = 0x0300_0000;

/// Size of in-chip work RAM.
pub const IWRAM_SIZE: u32 = 32 * 1024;

/// Base address of the I/O register block.
pub const IO_BASE: u32 = 0x0400_0000;

/// Size of the I/O register block.
pub const IO_SIZE: u32 = 0x400;

/// Base address of palette RAM.
pub const PALETTE_BASE: u32 = 0x0500_0000;

/// Size of palette RAM.
pub const PALETTE_SIZE: u32 = 1024;

/// Base address of video RAM (96 KiB).
pub const VRAM_BASE: u32 = 0x0600_0000;

/// Size of video RAM.
pub const VRAM_SIZE: u32 = 96 * 1024;

/// Base address of object attribute memory.
pub const OAM_BASE: u32 = 0x0700_0000;

/// Size of object attribute memory.
pub const OAM_SIZE: u32 = 1024;

/// Base address of the cartridge ROM window.
pub const CART_BASE: u32 = 0x0800_0000;

/// Largest cartridge image accepted by the slot (32 MiB).
pub const CART_MAX_SIZE: u32 = 32 * 1024 * 1024;

/// Value returned for every byte of an unmapped read.
pub const UNMAPPED_VALUE: u8 = 0x00;

/// Number of general purpose registers.
pub const GPR_COUNT: usize = 16;

/// Total words in the register block: GPRs, status word, program counter.
pub const REGISTER_WORDS: usize = GPR_COUNT + 2;

/// Status bit selecting the compact (2-byte) fetch mode.
pub const STATUS_COMPACT_BIT: u32 = 1 << 5;

/// Fetch width in full mode.
pub const FETCH_WIDTH_FULL: u32 = 4;

/// Fetch width in compact mode.
pub const FETCH_WIDTH_COMPACT: u32 = 2;

/// Snapshot schema version understood by the codec.
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// Size of the snapshot version header in bytes.
pub const SNAPSHOT_HEADER_BYTES: usize = 4;

/// Size of the encoded register block in bytes.
pub const SNAPSHOT_REGISTER_BYTES: usize = REGISTER_WORDS * 4;

/// Approximate cycles per displayed frame.
pub const CYCLES_PER_FRAME: u64 = 280_896;

/// Store collection holding cartridge images.
pub const ROMS_COLLECTION: &str = "roms";

/// Store collection holding savestates.
pub const SAVES_COLLECTION: &str = "saves";

/// Store collection holding pointer records.
pub const META_COLLECTION: &str = "meta";

/// Pointer record naming the most recently pushed savestate.
pub const LAST_SAVE_KEY: &str = "lastSave";

/// Pointer record naming the most recently loaded cartridge.
pub const LAST_ROM_KEY: &str = "lastROM";
