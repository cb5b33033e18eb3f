//! Execution core.
//!
//! This module holds the register file, the engine contract and the built-in reference engine.

/// Engine contract and backend selection.
pub mod engine;
/// Built-in fetch-only engine.
pub mod reference;
/// Register file and fetch mode.
pub mod regs;

pub use engine::{CartridgeMeta, EngineBackend, ExecutionEngine};
pub use reference::ReferenceEngine;
pub use regs::{FetchMode, MachineRegisters};
