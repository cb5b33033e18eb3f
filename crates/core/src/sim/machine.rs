//! Machine: the reference engine and the active backend side by side.
//!
//! The reference engine is always present. An attached external engine takes over every
//! state-affecting call while the reference engine stays dormant, so detaching falls back to it.

use crate::common::error::Result;
use crate::config::Config;
use crate::core::{CartridgeMeta, EngineBackend, ExecutionEngine, ReferenceEngine};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Machine shared between the host thread and the auto-snapshot task.
pub type SharedMachine = Arc<Mutex<Machine>>;

/// Locks a shared machine, recovering from a poisoned lock.
pub fn lock(machine: &SharedMachine) -> MutexGuard<'_, Machine> {
    machine.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Engine state plus the metadata of the loaded cartridge.
#[derive(Debug)]
pub struct Machine {
    reference: ReferenceEngine,
    backend: EngineBackend,
    cartridge: Option<CartridgeMeta>,
}

impl Machine {
    /// Wraps a reference engine; no external engine is attached.
    pub const fn new(reference: ReferenceEngine) -> Self {
        Self {
            reference,
            backend: EngineBackend::Reference,
            cartridge: None,
        }
    }

    /// Builds the machine described by `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(ReferenceEngine::from_config(config)?))
    }

    /// Wraps the machine for sharing.
    pub fn into_shared(self) -> SharedMachine {
        Arc::new(Mutex::new(self))
    }

    /// Returns the reference engine, whether or not it is active.
    pub const fn reference(&self) -> &ReferenceEngine {
        &self.reference
    }

    /// Returns the reference engine mutably.
    pub fn reference_mut(&mut self) -> &mut ReferenceEngine {
        &mut self.reference
    }

    /// Returns the backend selection.
    pub const fn backend(&self) -> &EngineBackend {
        &self.backend
    }

    /// Returns the metadata of the loaded cartridge.
    pub const fn cartridge(&self) -> Option<&CartridgeMeta> {
        self.cartridge.as_ref()
    }

    /// Returns the cartridge name used to tag snapshots.
    pub fn rom_name(&self) -> &str {
        self.cartridge.as_ref().map_or("unknown", |c| c.name.as_str())
    }

    /// Installs an external engine, returning the one it replaces.
    pub fn attach(&mut self, engine: Box<dyn ExecutionEngine>) -> Option<Box<dyn ExecutionEngine>> {
        tracing::info!(engine = engine.name(), "external engine attached");
        match std::mem::replace(&mut self.backend, EngineBackend::External(engine)) {
            EngineBackend::External(previous) => Some(previous),
            EngineBackend::Reference => None,
        }
    }

    /// Removes the external engine; the reference engine becomes active again.
    pub fn detach(&mut self) -> Option<Box<dyn ExecutionEngine>> {
        match std::mem::replace(&mut self.backend, EngineBackend::Reference) {
            EngineBackend::External(engine) => {
                tracing::info!(engine = engine.name(), "external engine detached");
                Some(engine)
            }
            EngineBackend::Reference => None,
        }
    }

    fn active(&mut self) -> &mut dyn ExecutionEngine {
        match &mut self.backend {
            EngineBackend::Reference => &mut self.reference,
            EngineBackend::External(engine) => engine.as_mut(),
        }
    }
}

impl ExecutionEngine for Machine {
    fn name(&self) -> &str {
        match &self.backend {
            EngineBackend::Reference => self.reference.name(),
            EngineBackend::External(engine) => engine.name(),
        }
    }

    fn reset(&mut self) -> Result<()> {
        self.active().reset()
    }

    fn load(&mut self, cartridge: &[u8], meta: &CartridgeMeta) -> Result<()> {
        self.active().load(cartridge, meta)?;
        self.cartridge = Some(meta.clone());
        Ok(())
    }

    fn advance(&mut self, cycle_budget: u64) -> Result<u64> {
        self.active().advance(cycle_budget)
    }

    fn step(&mut self) -> Result<u64> {
        self.active().step()
    }

    fn snapshot(&mut self) -> Result<Vec<u8>> {
        self.active().snapshot()
    }

    fn restore(&mut self, bytes: &[u8]) -> Result<()> {
        self.active().restore(bytes)
    }

    fn render(&mut self) -> bool {
        self.active().render()
    }
}
