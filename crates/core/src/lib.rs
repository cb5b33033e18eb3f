//! Emulator front-end core: machine state and time travel.
//!
//! This crate models a handheld machine's addressable memory, drives it in fixed cycle budgets
//! and persists/rewinds its state. It provides:
//! 1. **SoC:** Disjoint memory regions and the cartridge slot behind a single `AddressSpace`.
//! 2. **Core:** The register file, the reference fetch engine and the pluggable engine contract.
//! 3. **Snapshots:** A fixed, versioned binary savestate layout.
//! 4. **Rewind:** A bounded snapshot ring with write-through to a persistent store.
//! 5. **Simulation:** The frame scheduler, auto-snapshot task and the `Emulator` facade.

/// Common types and constants (memory map, error taxonomy).
pub mod common;
/// Configuration tree (memory map, engine, scheduler, rewind).
pub mod config;
/// Register file, reference engine and the execution engine contract.
pub mod core;
/// Rewind ring buffer and its background persistence writer.
pub mod rewind;
/// Machine ownership, scheduler, cartridge loading and the emulator facade.
pub mod sim;
/// Savestate data model and binary codec.
pub mod snapshot;
/// Address space, memory regions and the cartridge slot.
pub mod soc;
/// Scheduler counters.
pub mod stats;
/// Persistent store contract, backends and the ROM library.
pub mod storage;

/// Root configuration type; use `Config::default()` or load from JSON.
pub use crate::config::Config;
/// Crate-wide error and result types.
pub use crate::common::error::{Error, Result, StoreError};
/// Top-level facade tying machine, scheduler and rewind together.
pub use crate::sim::emulator::Emulator;
/// Memory map with region arbitration.
pub use crate::soc::AddressSpace;
