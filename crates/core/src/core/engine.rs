//! Execution engine contract and backend selection.
//!
//! This module defines the pluggable execution surface:
//! 1. **`ExecutionEngine`:** reset, load, advance, step, snapshot, restore and optional render.
//!    The built-in [`ReferenceEngine`](super::reference::ReferenceEngine) and any host-provided
//!    engine implement it.
//! 2. **`EngineBackend`:** which engine is active. Dispatch is a `match`, never a capability
//!    probe.
//!
//! External engines keep their own state; snapshots they produce are opaque bytes that only
//! they can restore.

use crate::common::error::Result;

/// Descriptive metadata handed to an engine alongside a cartridge image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartridgeMeta {
    /// Display name, also used to name exported saves.
    pub name: String,
    /// Library record id, when the cartridge came from the ROM library.
    pub library_id: Option<String>,
}

impl CartridgeMeta {
    /// Creates metadata for a cartridge that is not in the library.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            library_id: None,
        }
    }
}

/// Contract shared by the reference engine and host-provided engines.
///
/// Every call may be slow; the caller holds the machine lock for its duration.
pub trait ExecutionEngine: Send {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Returns the machine to its power-on state.
    fn reset(&mut self) -> Result<()>;

    /// Installs a cartridge image and resets.
    fn load(&mut self, cartridge: &[u8], meta: &CartridgeMeta) -> Result<()>;

    /// Runs for at most `cycle_budget` cycles; returns the cycles actually executed.
    ///
    /// Returning fewer cycles than requested (e.g. when halted) is not an error.
    fn advance(&mut self, cycle_budget: u64) -> Result<u64>;

    /// Executes the smallest unit of work the engine supports.
    fn step(&mut self) -> Result<u64> {
        self.advance(1)
    }

    /// Serializes the complete machine state.
    fn snapshot(&mut self) -> Result<Vec<u8>>;

    /// Replaces the machine state with a previous snapshot.
    ///
    /// Implementations must leave their state untouched when they return an error.
    fn restore(&mut self, bytes: &[u8]) -> Result<()>;

    /// Presents a frame; returns `false` when the engine leaves presentation to the host.
    fn render(&mut self) -> bool {
        false
    }
}

/// Which engine currently drives the machine.
pub enum EngineBackend {
    /// The built-in reference engine.
    Reference,
    /// A host-provided engine; the reference engine stays dormant while this is attached.
    External(Box<dyn ExecutionEngine>),
}

impl EngineBackend {
    /// Returns whether an external engine is attached.
    pub const fn is_external(&self) -> bool {
        matches!(self, Self::External(_))
    }
}

impl std::fmt::Debug for EngineBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reference => f.write_str("Reference"),
            Self::External(engine) => f.debug_tuple("External").field(&engine.name()).finish(),
        }
    }
}
