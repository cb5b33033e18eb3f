//! # Unit Components
//!
//! This module organizes the per-component tests of the core: the address space, the engines,
//! the snapshot codec, the rewind ring, storage backends, the scheduler and the facade.




/// Scheduler, emulator facade and loader.
pub mod sim;

/// Snapshot codec.
pub mod snapshot;

/// Address space, regions and the cartridge slot.
pub mod soc;
